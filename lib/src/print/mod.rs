//! Print module - orchestrates one post-processing run.
//!
//! This module provides the high-level types for a run:
//! - [`PostProcessor`] - drives the passes for a chosen slicer dialect
//! - [`ProcessedPrint`] - the tagged layers, configuration and tool table
//! - [`PrintReport`] - a serializable summary of a processed print

mod report;

pub use report::{LayerReport, PrintReport};

use crate::config::{ExtruderTable, GlobalConfig};
use crate::dialect::SlicerKind;
use crate::gcode::{
    allocate_tower_slots, annotate_perimeter_rates, drop_initial_tool_select, interpret_header,
    segment_layers, split_lines, HeaderSettings, HeightSlots, Layer, TowerAction, TowerWriter,
};
use crate::Result;
use log::info;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Runs the analysis passes over a sliced file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessor {
    slicer: SlicerKind,
}

impl PostProcessor {
    /// Create a post-processor for files from `slicer`.
    pub fn new(slicer: SlicerKind) -> Self {
        Self { slicer }
    }

    pub fn slicer(&self) -> SlicerKind {
        self.slicer
    }

    /// Read and process a file.
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<ProcessedPrint> {
        let path = path.as_ref();
        info!("Processing {}", path.display());
        let data = fs::read(path)?;
        self.process_bytes(&data)
    }

    /// Process the full contents of a file.
    ///
    /// Fails before any tower allocation when the header shows the file was
    /// not sliced with relative extrusion.
    pub fn process_bytes(&self, data: &[u8]) -> Result<ProcessedPrint> {
        let dialect = self.slicer.dialect();

        let mut layers = segment_layers(dialect, split_lines(data));
        let HeaderSettings { config, extruders } = interpret_header(dialect, &layers)?;

        // Tool 0 stays in the used set, only the line goes
        if dialect.drops_initial_tool_select() {
            drop_initial_tool_select(&mut layers);
        }

        let (mut layers, max_slots, slot_heights) = if config.is_multi_tool() {
            let plan = allocate_tower_slots(layers);
            (plan.layers, plan.max_slots, plan.heights)
        } else {
            info!("No tool changes detected, skipping tool change g-code additions");
            (layers, 0, Vec::new())
        };

        annotate_perimeter_rates(&mut layers, config.outer_perimeter_speed);

        Ok(ProcessedPrint {
            slicer: self.slicer,
            config,
            extruders,
            layers,
            max_slots,
            slot_heights,
        })
    }
}

/// Result of a post-processing run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedPrint {
    slicer: SlicerKind,
    config: GlobalConfig,
    extruders: ExtruderTable,
    layers: Vec<Layer>,
    max_slots: usize,
    slot_heights: Vec<HeightSlots>,
}

impl ProcessedPrint {
    pub fn slicer(&self) -> SlicerKind {
        self.slicer
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub fn extruders(&self) -> &ExtruderTable {
        &self.extruders
    }

    /// Layers in print order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Tower footprint in slots. Zero when no tower is needed.
    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// Per-height slot records, top-down. Empty when no tower is needed.
    pub fn slot_heights(&self) -> &[HeightSlots] {
        &self.slot_heights
    }

    /// Whether a purge tower has to be added.
    pub fn needs_tower(&self) -> bool {
        self.config.is_multi_tool()
    }

    /// Number of layers tagged with `action`.
    pub fn action_count(&self, action: TowerAction) -> usize {
        self.layers.iter().filter(|l| l.action() == action).count()
    }

    /// Write the print with `writer`.
    pub fn write(&self, writer: &mut dyn TowerWriter, out: &mut dyn Write) -> Result<()> {
        writer.write(self, out)?;
        Ok(())
    }

    /// Write the print to a file with `writer`.
    pub fn write_to_file<P: AsRef<Path>>(
        &self,
        writer: &mut dyn TowerWriter,
        path: P,
    ) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.write(writer, &mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Serializable summary.
    pub fn report(&self) -> PrintReport {
        PrintReport::from_print(self)
    }
}
