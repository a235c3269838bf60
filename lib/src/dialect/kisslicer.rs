//! KISSlicer comment patterns.
//!
//! ```text
//! ; KISSlicer - PRO
//! ; version 1.6.3
//! ; bed_size_x_mm = 145
//! ; num_extruders = 4
//! ; *** Material Settings for Extruder 2 ***
//! ; destring_length = 3
//! ; firmware_type = 1
//! ; BEGIN_LAYER_OBJECT z=0.294 z_thickness=0.294
//! ```

use super::{Dialect, HeaderKey, LayerMarker};
use crate::config::SlicerVersion;
use log::warn;
use once_cell::sync::Lazy;
use regex::bytes::{Regex, RegexSet};

static LAYER_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"BEGIN_LAYER_OBJECT z=(\d+\.*\d*) z_thickness=(\d+\.*\d*)").unwrap()
});

static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" version (\d+)\.(\d+)").unwrap());

static MATERIAL_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Material Settings for Extruder (\d+)").unwrap());

/// Header keys in priority order. The first key found in a comment wins.
const HEADER_KEYS: &[(&str, HeaderKey)] = &[
    (" version", HeaderKey::Version),
    ("bed_size_x_mm =", HeaderKey::BedSizeX),
    ("bed_size_y_mm =", HeaderKey::BedSizeY),
    ("bed_offset_x_mm =", HeaderKey::BedOffsetX),
    ("bed_offset_y_mm =", HeaderKey::BedOffsetY),
    ("bed_offset_z_mm =", HeaderKey::BedOffsetZ),
    ("round_bed =", HeaderKey::BedShape),
    ("travel_speed_mm_per_s =", HeaderKey::TravelSpeed),
    ("num_extruders = ", HeaderKey::ToolCount),
    ("first_layer_speed_mm_per_s =", HeaderKey::FirstLayerSpeed),
    ("Perimeter Speed =", HeaderKey::PerimeterSpeed),
    ("*** Material Settings for Extruder", HeaderKey::MaterialBlock),
    ("destring_length =", HeaderKey::RetractLength),
    ("destring_speed_mm_per_s =", HeaderKey::RetractSpeed),
    ("Z_lift_mm =", HeaderKey::ZHop),
    ("wipe_mm =", HeaderKey::Wipe),
    ("flowrate_tweak =", HeaderKey::FeedRateMultiplier),
    ("g_code_matl =", HeaderKey::FilamentType),
    ("firmware_type =", HeaderKey::FirmwareType),
];

static HEADER_SET: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(HEADER_KEYS.iter().map(|(key, _)| regex::escape(key))).unwrap()
});

/// KISSlicer dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct KisSlicer;

impl Dialect for KisSlicer {
    fn name(&self) -> &'static str {
        "KISSlicer"
    }

    fn layer_start(&self, comment: &[u8]) -> Option<LayerMarker> {
        let caps = LAYER_START_RE.captures(comment)?;
        match (parse_f64(&caps[1]), parse_f64(&caps[2])) {
            (Some(z), Some(thickness)) => Some(LayerMarker { z, thickness }),
            _ => {
                warn!(
                    "Ignoring malformed layer marker: {}",
                    String::from_utf8_lossy(comment).trim()
                );
                None
            }
        }
    }

    fn header_keys(&self, comment: &[u8]) -> Vec<HeaderKey> {
        HEADER_SET
            .matches(comment)
            .into_iter()
            .map(|index| HEADER_KEYS[index].1)
            .collect()
    }

    fn version(&self, comment: &[u8]) -> Option<SlicerVersion> {
        let caps = VERSION_RE.captures(comment)?;
        let major = std::str::from_utf8(&caps[1]).ok()?.parse().ok()?;
        let minor = std::str::from_utf8(&caps[2]).ok()?.parse().ok()?;
        Some(SlicerVersion::new(major, minor))
    }

    fn material_block_tool(&self, comment: &[u8]) -> Option<usize> {
        let caps = MATERIAL_BLOCK_RE.captures(comment)?;
        let number: usize = std::str::from_utf8(&caps[1]).ok()?.parse().ok()?;
        // Extruders are numbered from 1 in the header
        number.checked_sub(1)
    }

    fn relative_extrusion_value(&self) -> &'static [u8] {
        b"1"
    }

    fn drops_initial_tool_select(&self) -> bool {
        true
    }
}

fn parse_f64(bytes: &[u8]) -> Option<f64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}
