//! Layer segmentation.
//!
//! Rebuilds the slicer's layer list from the flat line stream. Every line ends
//! up in exactly one layer, and a layer-start marker line belongs to the layer
//! it announces.

use super::layer::Layer;
use super::line::LineClassifier;
use crate::dialect::Dialect;
use log::debug;

/// Split `lines` into layers using the dialect's layer-start marker.
///
/// The first layer starts with provisional height values. Its own marker
/// fills them in instead of opening a new layer. Input without any marker
/// yields a single layer holding every line.
pub fn segment_layers<I, L>(dialect: &dyn Dialect, lines: I) -> Vec<Layer>
where
    I: IntoIterator<Item = L>,
    L: Into<Vec<u8>>,
{
    let mut classifier = LineClassifier::new();
    let mut layers = Vec::new();
    let mut current = Layer::first();
    let mut layer_num = 0;

    for raw in lines {
        let line = classifier.classify(raw);

        if let Some(marker) = line.comment().and_then(|c| dialect.layer_start(c)) {
            if current.is_first() && layer_num == 0 {
                current.set_height(marker.z, marker.thickness);
            } else {
                layers.push(current);
                current = Layer::new(layer_num + 1, marker.z, marker.thickness);
                current.set_entry_tool(classifier.last_tool());
            }
            layer_num += 1;
        }

        current.add_line(line);
    }

    layers.push(current);

    debug!(
        "{}: segmented {} layers from {} markers",
        dialect.name(),
        layers.len(),
        layer_num
    );

    layers
}

/// Remove the first `T0` of the first layer.
///
/// The printer starts with tool 0 active, so the slicer's opening `T0` is not
/// a real tool change and must not claim a tower slot. Returns whether a line
/// was removed.
pub fn drop_initial_tool_select(layers: &mut [Layer]) -> bool {
    let Some(first) = layers.first_mut() else {
        return false;
    };
    let Some(index) = first
        .lines()
        .iter()
        .position(|line| line.tool_change() == Some(0))
    else {
        return false;
    };

    first.remove_line(index);
    debug!("Dropped initial tool select at line {} of layer 1", index + 1);
    true
}
