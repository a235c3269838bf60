//! # switchtower
//!
//! Multi-material post-processor for sliced G-code.
//!
//! The slicer emits a single-tool program that switches extruders with bare
//! `T<n>` commands. This crate rebuilds the slicer's layer structure from the
//! text, reads the machine and per-tool settings from the header comments,
//! and decides on which layers a shared purge tower has to be printed and how
//! wide it must be.
//!
//! ## Pipeline
//!
//! 1. [`gcode::LineClassifier`] splits every raw line into command and comment.
//! 2. [`gcode::segment_layers`] groups the lines into [`gcode::Layer`]s.
//! 3. [`gcode::interpret_header`] fills [`config::GlobalConfig`] and the
//!    [`config::Extruder`] table.
//! 4. [`gcode::drop_initial_tool_select`] removes the slicer's redundant opening
//!    `T0` when the dialect asks for it.
//! 5. [`gcode::allocate_tower_slots`] tags every layer with a [`gcode::TowerAction`].
//! 6. [`gcode::annotate_perimeter_rates`] stamps wipe speeds onto the layers.
//!
//! [`print::PostProcessor`] runs the phases in order and returns a
//! [`print::ProcessedPrint`] which a [`gcode::TowerWriter`] turns back into
//! G-code.
//!
//! ## Example
//!
//! ```rust,ignore
//! use switchtower::dialect::SlicerKind;
//! use switchtower::print::PostProcessor;
//!
//! let processor = PostProcessor::new(SlicerKind::KisSlicer);
//! let print = processor.process_file("part.gcode")?;
//! println!("tower slots: {}", print.max_slots());
//! ```

pub mod config;
pub mod dialect;
pub mod gcode;
pub mod print;

use thiserror::Error;

pub use config::{ConfigError, Extruder, GlobalConfig};
pub use dialect::SlicerKind;
pub use gcode::{Layer, TowerAction};
pub use print::{PostProcessor, ProcessedPrint};

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for post-processing operations.
pub type Result<T> = std::result::Result<T, Error>;
