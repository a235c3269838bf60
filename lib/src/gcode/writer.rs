//! Output side of the post-processor.
//!
//! Tower and tool-change generation is done by a [`TowerWriter`], which
//! receives the fully tagged print. [`PassthroughWriter`] writes the layer
//! model back unchanged; it is used for single-tool files and as the base
//! other writers emit original lines with.

use super::layer::Layer;
use crate::print::ProcessedPrint;
use std::io::{self, Write};

/// Turns a processed print into output G-code.
pub trait TowerWriter {
    /// Write the whole print to `out`.
    fn write(&mut self, print: &ProcessedPrint, out: &mut dyn Write) -> io::Result<()>;
}

/// Writes every original line in layer order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughWriter;

impl PassthroughWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write the lines of one layer, each followed by `\n`.
    pub fn write_layer(&self, layer: &Layer, out: &mut dyn Write) -> io::Result<()> {
        for line in layer.lines() {
            out.write_all(line.raw())?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl TowerWriter for PassthroughWriter {
    fn write(&mut self, print: &ProcessedPrint, out: &mut dyn Write) -> io::Result<()> {
        for layer in print.layers() {
            self.write_layer(layer, out)?;
        }
        out.flush()
    }
}
