//! Configuration recovered from the slicer header.
//!
//! This module provides the machine-wide [`GlobalConfig`] and the per-tool
//! [`Extruder`] settings that the header interpreter fills in from the
//! annotation lines of a sliced file.

mod extruder;
mod print_config;

pub use extruder::{Extruder, ExtruderTable, MAX_TOOLS};
pub use print_config::{BedShape, GlobalConfig, SlicerVersion};

use thiserror::Error;

/// Fatal configuration problems found in the slicer header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The slicer was not set up to emit relative E distances.
    #[error(
        "Relative E distances not enabled (firmware_type = {found}). \
         Tool change insertion requires relative extrusion"
    )]
    RelativeExtrusionRequired { found: String },
}

/// Result type for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;
