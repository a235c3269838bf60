//! Purge tower slot allocation.
//!
//! Layers that share a print height (separate objects printed within the same
//! Z) compete for room on the purge tower. Each height gets a number of
//! concurrent tower slots, and every layer at that height is tagged with what
//! the tower does for it:
//!
//! - [`TowerAction::Switch`] - the layer changes tools and always gets a slot
//! - [`TowerAction::Infill`] - a spare slot is filled with sparse infill so the
//!   tower keeps growing evenly
//! - [`TowerAction::Pass`] - nothing is printed on the tower
//!
//! ## Hysteresis
//!
//! Slot counts are computed from the top of the print downwards. Capacity only
//! grows after three heights needed more slots than available, so a few busy
//! heights near the top do not widen the tower for the whole print. Once
//! raised, capacity is kept for every lower height, because the tower below
//! must support what is printed above it.

use super::layer::{Layer, TowerAction};
use log::{debug, info};

/// Slot capacity before any deficit was seen.
pub const INITIAL_SLOTS: usize = 1;

/// Deficit heights needed before capacity is raised.
pub const STALL_THRESHOLD: usize = 3;

/// Heights closer than this are the same height.
const LAYER_HEIGHT_EPSILON: f64 = 1e-6;

/// Slot record of one height, as computed by the top-down scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSlots {
    pub z: f64,
    /// Layers at this height with a tool change.
    pub required: usize,
    /// Slots available at this height.
    pub slots: usize,
}

/// Allocation result.
#[derive(Debug, Clone, PartialEq)]
pub struct TowerPlan {
    /// All layers, tagged, ordered by layer number.
    pub layers: Vec<Layer>,
    /// Widest tower footprint needed by the print.
    pub max_slots: usize,
    /// Per-height records in top-down scan order.
    pub heights: Vec<HeightSlots>,
}

impl TowerPlan {
    /// Number of layers tagged with `action`.
    pub fn count(&self, action: TowerAction) -> usize {
        self.layers.iter().filter(|l| l.action() == action).count()
    }
}

/// Layers of one height, as indices into the layer list.
#[derive(Debug)]
struct HeightBucket {
    z: f64,
    members: Vec<usize>,
    capacity: usize,
}

/// Group layer indices by height, lowest height first. Members keep their
/// original order.
fn group_by_height(layers: &[Layer]) -> Vec<HeightBucket> {
    let mut order: Vec<usize> = (0..layers.len()).collect();
    order.sort_by(|&a, &b| layers[a].z().total_cmp(&layers[b].z()));

    let mut buckets: Vec<HeightBucket> = Vec::new();
    for index in order {
        let z = layers[index].z();
        match buckets.last_mut() {
            Some(bucket) if (z - bucket.z).abs() < LAYER_HEIGHT_EPSILON => {
                bucket.members.push(index)
            }
            _ => buckets.push(HeightBucket {
                z,
                members: vec![index],
                capacity: 0,
            }),
        }
    }

    for bucket in &mut buckets {
        bucket.members.sort_unstable();
    }
    buckets
}

/// Compute slot capacities top-down and return the final capacity.
///
/// The stall count only resets when capacity is raised. Heights without a
/// deficit leave it untouched, so the deficits need not be adjacent.
fn compute_capacities(
    layers: &[Layer],
    buckets: &mut [HeightBucket],
) -> (usize, Vec<HeightSlots>) {
    let mut slots = INITIAL_SLOTS;
    let mut stall_count = 0;
    let mut heights = Vec::with_capacity(buckets.len());

    for bucket in buckets.iter_mut().rev() {
        let required = bucket
            .members
            .iter()
            .filter(|&&index| layers[index].has_tool_change())
            .count();

        if required > slots {
            stall_count += 1;
            if stall_count >= STALL_THRESHOLD {
                debug!(
                    "Raising tower slots from {} to {} at z={:.3}",
                    slots, required, bucket.z
                );
                slots = required;
                stall_count = 0;
            }
        }

        bucket.capacity = slots;
        heights.push(HeightSlots {
            z: bucket.z,
            required,
            slots,
        });
    }

    (slots, heights)
}

/// Tag the layers of one bucket. Tool changes are served first, then spare
/// slots go to plain layers in order.
fn assign_actions(layers: &mut [Layer], bucket: &HeightBucket) {
    let capacity = bucket.capacity;
    let mut slots_filled = 0;

    for &index in &bucket.members {
        if layers[index].has_tool_change() {
            layers[index].assign_tower(TowerAction::Switch, capacity);
            slots_filled += 1;
        }
    }

    for &index in &bucket.members {
        if layers[index].has_tool_change() {
            continue;
        }
        let action = if slots_filled < capacity {
            slots_filled += 1;
            TowerAction::Infill
        } else {
            TowerAction::Pass
        };
        layers[index].assign_tower(action, capacity);
    }
}

/// Allocate purge tower slots and tag every layer with its tower action.
///
/// Every tool-change layer is tagged [`TowerAction::Switch`], even where a
/// height holds more tool changes than slots; a skipped tool change would
/// ruin the print. The returned layers are ordered by layer number.
pub fn allocate_tower_slots(mut layers: Vec<Layer>) -> TowerPlan {
    let mut buckets = group_by_height(&layers);
    let (max_slots, heights) = compute_capacities(&layers, &mut buckets);

    for bucket in &buckets {
        if bucket.capacity == 0 {
            continue;
        }
        assign_actions(&mut layers, bucket);
    }

    layers.sort_by_key(Layer::number);

    info!(
        "Purge tower: {} slots over {} heights",
        max_slots,
        buckets.len()
    );

    TowerPlan {
        layers,
        max_slots,
        heights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::line::GCodeLine;

    fn layer(number: usize, z: f64, tool_change: bool) -> Layer {
        let mut layer = Layer::new(number, z, 0.2);
        layer.add_line(GCodeLine::parse("G1 X1 Y1 E0.1"));
        if tool_change {
            layer.add_line(GCodeLine::parse("T1"));
        }
        layer
    }

    fn actions(plan: &TowerPlan) -> Vec<TowerAction> {
        plan.layers.iter().map(Layer::action).collect()
    }

    #[test]
    fn test_shared_height_single_slot() {
        let plan = allocate_tower_slots(vec![
            layer(1, 0.2, true),
            layer(2, 0.2, false),
            layer(3, 0.4, false),
        ]);

        assert_eq!(plan.max_slots, 1);
        assert_eq!(
            plan.heights,
            vec![
                HeightSlots { z: 0.4, required: 0, slots: 1 },
                HeightSlots { z: 0.2, required: 1, slots: 1 },
            ]
        );
        // The only slot at 0.2 goes to the tool change
        assert_eq!(
            actions(&plan),
            vec![TowerAction::Switch, TowerAction::Pass, TowerAction::Infill]
        );
        assert!(plan.layers.iter().all(|l| l.tower_slots() == 1));
    }

    #[test]
    fn test_switch_has_priority_over_position() {
        // Tool change layer comes second within the height
        let plan = allocate_tower_slots(vec![layer(1, 0.2, false), layer(2, 0.2, true)]);
        assert_eq!(actions(&plan), vec![TowerAction::Pass, TowerAction::Switch]);
    }

    #[test]
    fn test_transient_spike_does_not_raise_slots() {
        // Two heights near the top need two slots, the rest one
        let plan = allocate_tower_slots(vec![
            layer(1, 0.2, true),
            layer(2, 0.4, true),
            layer(3, 0.6, true),
            layer(4, 0.6, true),
            layer(5, 0.8, true),
            layer(6, 0.8, true),
        ]);

        assert_eq!(plan.max_slots, 1);
        assert!(plan.heights.iter().all(|h| h.slots == 1));
        // Every tool change is still served
        assert_eq!(plan.count(TowerAction::Switch), 6);
    }

    #[test]
    fn test_third_deficit_raises_slots() {
        let mut layers = Vec::new();
        let mut number = 1;
        for z in [0.2, 0.4, 0.6, 0.8] {
            for _ in 0..2 {
                layers.push(layer(number, z, true));
                number += 1;
            }
        }
        let plan = allocate_tower_slots(layers);

        let slots: Vec<usize> = plan.heights.iter().map(|h| h.slots).collect();
        // Top-down: 0.8, 0.6 stall; 0.4 raises; 0.2 keeps it
        assert_eq!(slots, vec![1, 1, 2, 2]);
        assert_eq!(plan.max_slots, 2);

        let at_02: Vec<usize> = plan
            .layers
            .iter()
            .filter(|l| (l.z() - 0.2).abs() < 1e-9)
            .map(Layer::tower_slots)
            .collect();
        assert_eq!(at_02, vec![2, 2]);
    }

    #[test]
    fn test_stall_count_spans_heights_without_deficit() {
        let mut layers = Vec::new();
        let mut number = 1;
        // Bottom-up: deficit, ok, deficit, ok, deficit
        for (z, tool_changes) in [(0.2, 2), (0.4, 1), (0.6, 2), (0.8, 1), (1.0, 2)] {
            for _ in 0..tool_changes {
                layers.push(layer(number, z, true));
                number += 1;
            }
        }
        let plan = allocate_tower_slots(layers);

        let scan: Vec<(usize, usize)> = plan
            .heights
            .iter()
            .map(|h| (h.required, h.slots))
            .collect();
        assert_eq!(scan, vec![(2, 1), (1, 1), (2, 1), (1, 1), (2, 2)]);
        assert_eq!(plan.max_slots, 2);
    }

    #[test]
    fn test_spare_capacity_fills_with_infill() {
        let mut layers = Vec::new();
        let mut number = 1;
        // Three heights with two tool changes each raise capacity to 2
        for z in [0.6, 0.8, 1.0] {
            for _ in 0..2 {
                layers.push(layer(number, z, true));
                number += 1;
            }
        }
        // A lower height with three plain layers
        for _ in 0..3 {
            layers.push(layer(number, 0.4, false));
            number += 1;
        }
        let plan = allocate_tower_slots(layers);
        assert_eq!(plan.max_slots, 2);

        let low: Vec<TowerAction> = plan
            .layers
            .iter()
            .filter(|l| (l.z() - 0.4).abs() < 1e-9)
            .map(Layer::action)
            .collect();
        assert_eq!(
            low,
            vec![TowerAction::Infill, TowerAction::Infill, TowerAction::Pass]
        );
    }

    #[test]
    fn test_output_ordered_by_number() {
        // Heights out of order, as with sequential object printing
        let plan = allocate_tower_slots(vec![
            layer(1, 0.2, false),
            layer(2, 0.6, true),
            layer(3, 0.4, false),
            layer(4, 0.2, true),
        ]);
        let numbers: Vec<usize> = plan.layers.iter().map(Layer::number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_close_heights_share_a_bucket() {
        let plan = allocate_tower_slots(vec![layer(1, 0.2, true), layer(2, 0.2 + 1e-9, false)]);
        assert_eq!(plan.heights.len(), 1);
        assert_eq!(actions(&plan), vec![TowerAction::Switch, TowerAction::Pass]);
    }

    #[test]
    fn test_empty_input() {
        let plan = allocate_tower_slots(Vec::new());
        assert_eq!(plan.max_slots, INITIAL_SLOTS);
        assert!(plan.layers.is_empty());
        assert!(plan.heights.is_empty());
    }
}
