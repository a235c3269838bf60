//! Outer perimeter rates for wipe moves.

use super::layer::{Layer, OUTER_PERIMETER_FEEDRATE};

/// Stamp the outer perimeter speed and wipe feed-rate fraction on every layer.
pub fn annotate_perimeter_rates(layers: &mut [Layer], outer_perimeter_speed: Option<f64>) {
    for layer in layers {
        layer.outer_perimeter_speed = outer_perimeter_speed;
        layer.outer_perimeter_feedrate = OUTER_PERIMETER_FEEDRATE;
    }
}
