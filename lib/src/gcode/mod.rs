//! G-code analysis for purge tower insertion.
//!
//! This module contains the passes that turn a sliced file into a tagged
//! layer model:
//! - [`line`] - command/comment classification and tool-change detection
//! - [`layer`] - the [`Layer`] container and [`TowerAction`]
//! - [`segmenter`] - splitting the line stream into layers
//! - [`header`] - reading machine and tool settings from header comments
//! - [`tower_slots`] - purge tower slot allocation
//! - [`perimeter`] - wipe speed annotation
//! - [`writer`] - the output side

pub mod header;
pub mod layer;
pub mod line;
pub mod perimeter;
pub mod segmenter;
pub mod tower_slots;
pub mod writer;

pub use header::{interpret_header, HeaderSettings};
pub use layer::{
    Layer, LayerKind, TowerAction, FIRST_LAYER_DEFAULT_HEIGHT, OUTER_PERIMETER_FEEDRATE,
};
pub use line::{split_lines, tool_change, GCodeLine, LineClassifier};
pub use perimeter::annotate_perimeter_rates;
pub use segmenter::{drop_initial_tool_select, segment_layers};
pub use tower_slots::{
    allocate_tower_slots, HeightSlots, TowerPlan, INITIAL_SLOTS, STALL_THRESHOLD,
};
pub use writer::{PassthroughWriter, TowerWriter};
