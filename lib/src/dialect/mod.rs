//! Slicer dialects.
//!
//! Each supported slicer writes layer markers and header settings with its
//! own fixed comment patterns. A [`Dialect`] supplies the recognisers for one
//! slicer; the post-processor picks one through [`SlicerKind`] at start-up and
//! uses it for the whole run.

mod kisslicer;

pub use kisslicer::KisSlicer;

use crate::config::SlicerVersion;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Height and thickness captured from a layer-start marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerMarker {
    pub z: f64,
    pub thickness: f64,
}

/// Header settings a dialect can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKey {
    Version,
    BedSizeX,
    BedSizeY,
    BedOffsetX,
    BedOffsetY,
    BedOffsetZ,
    BedShape,
    TravelSpeed,
    ToolCount,
    FirstLayerSpeed,
    PerimeterSpeed,
    /// Start of the settings block of one tool.
    MaterialBlock,
    RetractLength,
    RetractSpeed,
    ZHop,
    Wipe,
    FeedRateMultiplier,
    FilamentType,
    /// Extrusion distance mode of the firmware.
    FirmwareType,
}

impl HeaderKey {
    /// Keys that only apply inside a tool's settings block.
    pub fn is_tool_scoped(&self) -> bool {
        matches!(
            self,
            HeaderKey::RetractLength
                | HeaderKey::RetractSpeed
                | HeaderKey::ZHop
                | HeaderKey::Wipe
                | HeaderKey::FeedRateMultiplier
                | HeaderKey::FilamentType
        )
    }
}

/// Pattern recognisers for one slicer's output.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Human readable slicer name.
    fn name(&self) -> &'static str;

    /// Match a layer-start marker in a comment.
    fn layer_start(&self, comment: &[u8]) -> Option<LayerMarker>;

    /// Every header key present in the comment, in priority order.
    fn header_keys(&self, comment: &[u8]) -> Vec<HeaderKey>;

    /// Extract the slicer version from a version comment.
    fn version(&self, comment: &[u8]) -> Option<SlicerVersion>;

    /// Zero-based tool index from a material block header.
    fn material_block_tool(&self, comment: &[u8]) -> Option<usize>;

    /// The `firmware_type` value that means relative E distances.
    fn relative_extrusion_value(&self) -> &'static [u8];

    /// Whether the slicer opens the print with a redundant `T0` that should be
    /// removed before tower planning.
    fn drops_initial_tool_select(&self) -> bool {
        false
    }

    /// Split a `key = value` comment into its trimmed value.
    fn setting_value<'a>(&self, comment: &'a [u8]) -> Option<&'a [u8]> {
        split_setting(comment, b" = ")
    }
}

/// Value part of `key<delimiter>value`, whitespace trimmed.
pub fn split_setting<'a>(comment: &'a [u8], delimiter: &[u8]) -> Option<&'a [u8]> {
    let pos = comment
        .windows(delimiter.len())
        .position(|window| window == delimiter)?;
    Some(comment[pos + delimiter.len()..].trim_ascii())
}

/// Supported slicers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlicerKind {
    #[default]
    KisSlicer,
}

impl SlicerKind {
    /// Pattern recognisers for this slicer.
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            SlicerKind::KisSlicer => &KisSlicer,
        }
    }
}

impl fmt::Display for SlicerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dialect().name())
    }
}

/// Unsupported slicer name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown slicer: {0} (supported: kisslicer)")]
pub struct UnknownSlicer(pub String);

impl FromStr for SlicerKind {
    type Err = UnknownSlicer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kisslicer" | "kiss" => Ok(SlicerKind::KisSlicer),
            _ => Err(UnknownSlicer(s.to_string())),
        }
    }
}
