//! Per-tool settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings of a single tool as declared in the slicer header.
///
/// Distances are in mm and speeds in mm/min.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extruder {
    /// Zero-based tool index.
    pub id: usize,
    /// Retract (destring) distance.
    pub retract: Option<f64>,
    /// Retract speed.
    pub retract_speed: Option<f64>,
    /// Z lift on travel.
    pub z_hop: Option<f64>,
    /// Wipe length.
    pub wipe: Option<f64>,
    /// Flow multiplier.
    pub feed_rate_multiplier: Option<f64>,
    /// Material label, e.g. `PLA` or `NULL`.
    pub filament_type: Option<String>,
    /// Z offset, copied from the machine settings.
    pub z_offset: f64,
}

impl Extruder {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            retract: None,
            retract_speed: None,
            z_hop: None,
            wipe: None,
            feed_rate_multiplier: None,
            filament_type: None,
            z_offset: 0.0,
        }
    }
}

/// Largest tool count a header may declare.
pub const MAX_TOOLS: usize = 64;

/// Tool table owned by a single run, keyed by tool index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtruderTable {
    extruders: BTreeMap<usize, Extruder>,
}

impl ExtruderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the extruder for `id`, creating it on first use.
    pub fn ensure(&mut self, id: usize) -> &mut Extruder {
        self.extruders.entry(id).or_insert_with(|| Extruder::new(id))
    }

    /// Create extruders `0..count` that do not exist yet.
    pub fn ensure_count(&mut self, count: usize) {
        for id in 0..count {
            self.ensure(id);
        }
    }

    pub fn get(&self, id: usize) -> Option<&Extruder> {
        self.extruders.get(&id)
    }

    pub fn len(&self) -> usize {
        self.extruders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extruders.is_empty()
    }

    /// Set the same z offset on every tool.
    pub fn apply_z_offset(&mut self, z_offset: f64) {
        for extruder in self.extruders.values_mut() {
            extruder.z_offset = z_offset;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extruder> {
        self.extruders.values()
    }
}
