//! Layer data structure.
//!
//! A [`Layer`] holds the classified lines printed at one height. Several
//! layers can share a height when the slicer prints separate objects one
//! after the other within the same Z.

use super::line::GCodeLine;
use crate::config::GlobalConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Z and thickness of the first layer before its marker is seen.
pub const FIRST_LAYER_DEFAULT_HEIGHT: f64 = 0.2;

/// Feed-rate fraction used by the wipe move generator.
pub const OUTER_PERIMETER_FEEDRATE: f64 = 0.05;

/// What the purge tower does on a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TowerAction {
    /// No tower print on this layer.
    #[default]
    Pass,
    /// Tool change on the tower.
    Switch,
    /// Sparse tower infill to keep the tower growing.
    Infill,
}

impl fmt::Display for TowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TowerAction::Pass => "PASS",
            TowerAction::Switch => "SWITCH",
            TowerAction::Infill => "INFILL",
        };
        f.write_str(name)
    }
}

/// First physical layer or any later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayerKind {
    First,
    #[default]
    Regular,
}

/// One vertical slice of the print.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    number: usize,
    kind: LayerKind,
    z: f64,
    thickness: f64,
    lines: Vec<GCodeLine>,
    has_tool_change: bool,
    entry_tool: Option<usize>,
    tower_slots: usize,
    action: TowerAction,
    /// Outer perimeter speed for wipe moves (mm/min).
    pub outer_perimeter_speed: Option<f64>,
    /// Fraction of the feed rate for wipe moves.
    pub outer_perimeter_feedrate: f64,
}

impl Layer {
    /// Create a regular layer.
    pub fn new(number: usize, z: f64, thickness: f64) -> Self {
        Self {
            number,
            kind: LayerKind::Regular,
            z,
            thickness,
            lines: Vec::new(),
            has_tool_change: false,
            entry_tool: None,
            tower_slots: 0,
            action: TowerAction::Pass,
            outer_perimeter_speed: None,
            outer_perimeter_feedrate: 0.0,
        }
    }

    /// Create the first layer with provisional height and thickness.
    pub fn first() -> Self {
        Self {
            kind: LayerKind::First,
            ..Self::new(1, FIRST_LAYER_DEFAULT_HEIGHT, FIRST_LAYER_DEFAULT_HEIGHT)
        }
    }

    #[inline]
    pub fn number(&self) -> usize {
        self.number
    }

    #[inline]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    #[inline]
    pub fn is_first(&self) -> bool {
        self.kind == LayerKind::First
    }

    /// Print height reported by the slicer (mm).
    #[inline]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Layer thickness reported by the slicer (mm).
    #[inline]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Replace height and thickness. Only the segmenter does this, for the
    /// first layer once its own marker arrives.
    pub(crate) fn set_height(&mut self, z: f64, thickness: f64) {
        self.z = z;
        self.thickness = thickness;
    }

    pub fn lines(&self) -> &[GCodeLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Append a line, keeping the tool-change flag current.
    pub fn add_line(&mut self, line: GCodeLine) {
        self.has_tool_change |= line.tool_change().is_some();
        self.lines.push(line);
    }

    /// Remove the line at `index`, keeping the tool-change flag current.
    pub(crate) fn remove_line(&mut self, index: usize) -> GCodeLine {
        let line = self.lines.remove(index);
        self.has_tool_change = self.lines.iter().any(|l| l.tool_change().is_some());
        line
    }

    /// Whether any command of this layer switches tools.
    #[inline]
    pub fn has_tool_change(&self) -> bool {
        self.has_tool_change
    }

    /// Tools selected on this layer, in order of appearance.
    pub fn tool_changes(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines.iter().filter_map(GCodeLine::tool_change)
    }

    /// Tool active when the layer started.
    pub fn entry_tool(&self) -> Option<usize> {
        self.entry_tool
    }

    pub(crate) fn set_entry_tool(&mut self, tool: Option<usize>) {
        self.entry_tool = tool;
    }

    /// Tower slots available at this layer's height.
    #[inline]
    pub fn tower_slots(&self) -> usize {
        self.tower_slots
    }

    #[inline]
    pub fn action(&self) -> TowerAction {
        self.action
    }

    pub(crate) fn assign_tower(&mut self, action: TowerAction, tower_slots: usize) {
        self.action = action;
        self.tower_slots = tower_slots;
    }

    /// Print speed used when nothing more specific applies. The first layer
    /// prints at the first-layer speed.
    pub fn default_speed(&self, config: &GlobalConfig) -> Option<f64> {
        match self.kind {
            LayerKind::First => config.first_layer_speed.or(config.default_speed),
            LayerKind::Regular => config.default_speed,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layer {} (z={:.3}, thickness={:.3}, lines={}, action={}, slots={})",
            self.number,
            self.z,
            self.thickness,
            self.lines.len(),
            self.action,
            self.tower_slots
        )
    }
}
