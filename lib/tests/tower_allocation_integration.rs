//! Property tests for segmentation and tower slot allocation.
//!
//! These tests check the guarantees the tower writer relies on for arbitrary
//! inputs:
//! - every input line lands in exactly one layer, in order
//! - slot capacity never shrinks going down the print
//! - tool changes always get a tower slot before infill does
//! - the tagged layers come back in print order

use proptest::prelude::*;
use std::collections::BTreeMap;

use switchtower::dialect::KisSlicer;
use switchtower::gcode::{allocate_tower_slots, segment_layers, Layer, TowerAction, TowerPlan};

fn marker(z: f64) -> String {
    format!("; BEGIN_LAYER_OBJECT z={} z_thickness=0.2", z)
}

/// One line from a pool that covers every classification case.
fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("G1 X10 Y10 E0.5".to_string()),
        Just("G1 X1 Y1 ; inline comment".to_string()),
        Just("; plain comment".to_string()),
        Just(String::new()),
        Just("   ".to_string()),
        Just("M104 S210\r".to_string()),
        (0usize..4).prop_map(|t| format!("T{}", t)),
        (1u32..8).prop_map(|i| marker(f64::from(i) * 0.2)),
    ]
}

/// Layers built from (height index, tool change) pairs.
fn layers_from(shape: &[(u32, bool)]) -> Vec<Layer> {
    let mut lines = Vec::new();
    for &(height, tool_change) in shape {
        lines.push(marker(f64::from(height + 1) * 0.2));
        lines.push("G1 X1 Y1 E0.1".to_string());
        if tool_change {
            lines.push("T1".to_string());
        }
    }
    segment_layers(&KisSlicer, lines)
}

fn layer_shape_strategy() -> impl Strategy<Value = Vec<(u32, bool)>> {
    prop::collection::vec((0u32..6, any::<bool>()), 1..40)
}

/// Layers of the plan grouped by height, keyed by the height's bit pattern.
fn by_height(plan: &TowerPlan) -> BTreeMap<u64, Vec<&Layer>> {
    let mut groups: BTreeMap<u64, Vec<&Layer>> = BTreeMap::new();
    for layer in &plan.layers {
        groups.entry(layer.z().to_bits()).or_default().push(layer);
    }
    groups
}

proptest! {
    #[test]
    fn segmentation_keeps_every_line(lines in prop::collection::vec(line_strategy(), 0..60)) {
        let layers = segment_layers(&KisSlicer, lines.clone());

        let rebuilt: Vec<Vec<u8>> = layers
            .iter()
            .flat_map(|layer| layer.lines().iter().map(|line| line.raw().to_vec()))
            .collect();
        let expected: Vec<Vec<u8>> = lines.into_iter().map(String::into_bytes).collect();
        prop_assert_eq!(rebuilt, expected);
    }

    #[test]
    fn segmentation_numbers_layers_in_order(lines in prop::collection::vec(line_strategy(), 0..60)) {
        let layers = segment_layers(&KisSlicer, lines);
        prop_assert!(!layers.is_empty());
        prop_assert!(layers[0].is_first());
        for (index, layer) in layers.iter().enumerate() {
            prop_assert_eq!(layer.number(), index + 1);
        }
    }

    #[test]
    fn slots_never_shrink_going_down(shape in layer_shape_strategy()) {
        let plan = allocate_tower_slots(layers_from(&shape));

        for pair in plan.heights.windows(2) {
            prop_assert!(pair[0].z > pair[1].z);
            prop_assert!(pair[0].slots <= pair[1].slots);
        }
        let last = plan.heights.last().map(|h| h.slots).unwrap_or(1);
        prop_assert_eq!(plan.max_slots, last);
    }

    #[test]
    fn tool_changes_take_priority(shape in layer_shape_strategy()) {
        let plan = allocate_tower_slots(layers_from(&shape));

        for layers in by_height(&plan).values() {
            let capacity = layers[0].tower_slots();
            let switches = layers.iter().filter(|l| l.action() == TowerAction::Switch).count();
            let infills = layers.iter().filter(|l| l.action() == TowerAction::Infill).count();

            for layer in layers {
                // Switch if and only if the layer changes tools
                prop_assert_eq!(layer.action() == TowerAction::Switch, layer.has_tool_change());
                prop_assert_eq!(layer.tower_slots(), capacity);
            }
            prop_assert!(infills <= capacity.saturating_sub(switches));
        }
    }

    #[test]
    fn tower_prints_only_with_capacity(shape in layer_shape_strategy()) {
        let plan = allocate_tower_slots(layers_from(&shape));

        prop_assert_eq!(plan.layers.len(), shape.len());
        for layer in &plan.layers {
            if layer.action() != TowerAction::Pass {
                prop_assert!(layer.tower_slots() >= 1);
            }
        }
    }

    #[test]
    fn layers_come_back_in_print_order(shape in layer_shape_strategy()) {
        let plan = allocate_tower_slots(layers_from(&shape));
        for pair in plan.layers.windows(2) {
            prop_assert!(pair[0].number() < pair[1].number());
        }
    }
}

#[test]
fn test_shared_height_boundary() {
    // Two objects share 0.2 (one changes tools), a third layer sits at 0.4
    let plan = allocate_tower_slots(layers_from(&[(0, true), (0, false), (1, false)]));

    assert_eq!(plan.max_slots, 1);
    let actions: Vec<TowerAction> = plan.layers.iter().map(Layer::action).collect();
    assert_eq!(
        actions,
        vec![TowerAction::Switch, TowerAction::Pass, TowerAction::Infill]
    );
}

#[test]
fn test_short_spike_is_absorbed() {
    // Heights 1.2 and 1.0 need two slots, everything below one
    let mut shape = Vec::new();
    for height in 0..4 {
        shape.push((height, true));
    }
    for height in 4..6 {
        shape.push((height, true));
        shape.push((height, true));
    }
    let plan = allocate_tower_slots(layers_from(&shape));

    assert_eq!(plan.max_slots, 1);
    let deficits = plan.heights.iter().filter(|h| h.required > h.slots).count();
    assert_eq!(deficits, 2);
    assert_eq!(plan.count(TowerAction::Switch), 8);
}

#[test]
fn test_persistent_deficit_widens_tower() {
    let mut shape = Vec::new();
    for height in 0..5 {
        shape.push((height, true));
        shape.push((height, true));
        shape.push((height, true));
    }
    let plan = allocate_tower_slots(layers_from(&shape));

    let slots: Vec<usize> = plan.heights.iter().map(|h| h.slots).collect();
    assert_eq!(slots, vec![1, 1, 3, 3, 3]);
    assert_eq!(plan.max_slots, 3);
}
