//! Machine and print settings shared by every tool.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Slicer version as `(major, minor)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlicerVersion {
    pub major: u32,
    pub minor: u32,
}

impl SlicerVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for SlicerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Bed shape as reported by the `round_bed` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BedShape {
    #[default]
    Rectangular,
    Round,
}

impl BedShape {
    /// Map the numeric slicer flag (0 = rectangular, anything else = round).
    pub fn from_flag(flag: i64) -> Self {
        if flag == 0 {
            BedShape::Rectangular
        } else {
            BedShape::Round
        }
    }
}

/// Run-wide machine and print configuration.
///
/// All speeds are stored in mm/min. A field stays `None` when the header did
/// not carry it (or carried a value that could not be parsed); nothing is
/// guessed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Detected slicer version. `None` means compatibility is unverified.
    pub version: Option<SlicerVersion>,

    // === Machine ===
    /// Bed stroke along X (mm).
    pub bed_size_x: Option<f64>,
    /// Bed stroke along Y (mm).
    pub bed_size_y: Option<f64>,
    /// Origin offset along X (mm).
    pub bed_offset_x: Option<f64>,
    /// Origin offset along Y (mm).
    pub bed_offset_y: Option<f64>,
    /// Z offset (mm). Applied to every extruder after the header pass.
    pub z_offset: f64,
    /// Bed shape flag.
    pub bed_shape: Option<BedShape>,

    // === Speeds (mm/min) ===
    /// Fallback print speed. KISSlicer headers carry none, so it stays unset
    /// for that dialect.
    pub default_speed: Option<f64>,
    pub travel_xy_speed: Option<f64>,
    pub travel_z_speed: Option<f64>,
    pub first_layer_speed: Option<f64>,
    pub outer_perimeter_speed: Option<f64>,

    /// Whether the header confirmed relative extrusion distances.
    pub relative_extrusion: bool,

    /// Tools referenced by tool-change commands in the body.
    pub tools_used: BTreeSet<usize>,
}

impl GlobalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a slicer version was found in the header.
    pub fn is_version_verified(&self) -> bool {
        self.version.is_some()
    }

    /// Number of distinct tools used by the print.
    pub fn tool_count(&self) -> usize {
        self.tools_used.len()
    }

    /// A purge tower only makes sense with more than one tool.
    pub fn is_multi_tool(&self) -> bool {
        self.tool_count() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bed_shape_from_flag() {
        assert_eq!(BedShape::from_flag(0), BedShape::Rectangular);
        assert_eq!(BedShape::from_flag(1), BedShape::Round);
    }

    #[test]
    fn test_version_display_and_order() {
        let v = SlicerVersion::new(1, 6);
        assert_eq!(v.to_string(), "1.6");
        assert!(SlicerVersion::new(1, 5) < v);
        assert!(SlicerVersion::new(2, 0) > v);
    }

    #[test]
    fn test_global_config_defaults() {
        let config = GlobalConfig::new();
        assert!(!config.is_version_verified());
        assert!(!config.is_multi_tool());
        assert_eq!(config.z_offset, 0.0);
        assert!(config.travel_xy_speed.is_none());
    }

    #[test]
    fn test_multi_tool() {
        let mut config = GlobalConfig::new();
        config.tools_used.insert(0);
        assert!(!config.is_multi_tool());
        config.tools_used.insert(2);
        assert!(config.is_multi_tool());
        assert_eq!(config.tool_count(), 2);
    }
}
