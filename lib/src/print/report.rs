//! Serializable run summary.

use super::ProcessedPrint;
use crate::config::{Extruder, GlobalConfig};
use crate::gcode::{Layer, TowerAction};
use serde::{Deserialize, Serialize};

/// Per-layer line of a [`PrintReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerReport {
    pub number: usize,
    pub z: f64,
    pub thickness: f64,
    pub lines: usize,
    pub tool_change: bool,
    pub action: TowerAction,
    pub tower_slots: usize,
    /// Print speed in effect when nothing more specific applies (mm/min).
    pub speed: Option<f64>,
}

impl LayerReport {
    pub fn new(layer: &Layer, config: &GlobalConfig) -> Self {
        Self {
            number: layer.number(),
            z: layer.z(),
            thickness: layer.thickness(),
            lines: layer.line_count(),
            tool_change: layer.has_tool_change(),
            action: layer.action(),
            tower_slots: layer.tower_slots(),
            speed: layer.default_speed(config),
        }
    }
}

/// Summary of a processed print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintReport {
    pub slicer: String,
    pub config: GlobalConfig,
    pub extruders: Vec<Extruder>,
    pub needs_tower: bool,
    pub max_slots: usize,
    pub layers: Vec<LayerReport>,
}

impl PrintReport {
    pub fn from_print(print: &ProcessedPrint) -> Self {
        Self {
            slicer: print.slicer().to_string(),
            config: print.config().clone(),
            extruders: print.extruders().iter().cloned().collect(),
            needs_tower: print.needs_tower(),
            max_slots: print.max_slots(),
            layers: print
                .layers()
                .iter()
                .map(|layer| LayerReport::new(layer, print.config()))
                .collect(),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
