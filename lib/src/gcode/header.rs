//! Header interpretation.
//!
//! Slicers write their settings as `; key = value` comments. This pass reads
//! them once, filling the machine configuration and the tool table, and
//! refuses files that were not sliced with relative extrusion distances.

use super::layer::Layer;
use super::line::tool_change;
use crate::config::{
    BedShape, ConfigError, ConfigResult, ExtruderTable, GlobalConfig, MAX_TOOLS,
};
use crate::dialect::{Dialect, HeaderKey};
use log::{debug, info, warn};
use std::str::FromStr;

/// Seconds to minutes for speed settings.
const PER_SECOND_TO_PER_MINUTE: f64 = 60.0;

/// Settings recovered from a file header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderSettings {
    pub config: GlobalConfig,
    pub extruders: ExtruderTable,
}

/// Read configuration from every comment-only line of `layers`.
///
/// Command lines only feed the set of used tools. Per-tool keys are ignored
/// until a material block has selected a tool. Values that fail to parse are
/// logged and skipped.
pub fn interpret_header(dialect: &dyn Dialect, layers: &[Layer]) -> ConfigResult<HeaderSettings> {
    let mut settings = HeaderSettings::default();
    let mut current_tool: Option<usize> = None;

    for line in layers.iter().flat_map(Layer::lines) {
        if let Some(cmd) = line.command() {
            if let Some(tool) = tool_change(cmd) {
                settings.config.tools_used.insert(tool);
            }
            continue;
        }
        let Some(comment) = line.comment() else {
            continue;
        };

        let key = dialect
            .header_keys(comment)
            .into_iter()
            .find(|key| current_tool.is_some() || !key.is_tool_scoped());
        if let Some(key) = key {
            apply_setting(dialect, &mut settings, &mut current_tool, key, comment)?;
        }
    }

    match settings.config.version {
        Some(version) => info!("{} version {}", dialect.name(), version),
        None => warn!(
            "Could not detect {} version. Use at your own risk!",
            dialect.name()
        ),
    }

    let z_offset = settings.config.z_offset;
    settings.extruders.apply_z_offset(z_offset);

    Ok(settings)
}

fn apply_setting(
    dialect: &dyn Dialect,
    settings: &mut HeaderSettings,
    current_tool: &mut Option<usize>,
    key: HeaderKey,
    comment: &[u8],
) -> ConfigResult<()> {
    let config = &mut settings.config;

    match key {
        HeaderKey::Version => match dialect.version(comment) {
            Some(version) => config.version = Some(version),
            None => warn!("Unreadable version line: {}", lossy(comment)),
        },
        HeaderKey::BedSizeX => set(&mut config.bed_size_x, parse(dialect, key, comment)),
        HeaderKey::BedSizeY => set(&mut config.bed_size_y, parse(dialect, key, comment)),
        HeaderKey::BedOffsetX => set(&mut config.bed_offset_x, parse(dialect, key, comment)),
        HeaderKey::BedOffsetY => set(&mut config.bed_offset_y, parse(dialect, key, comment)),
        HeaderKey::BedOffsetZ => {
            if let Some(z_offset) = parse(dialect, key, comment) {
                config.z_offset = z_offset;
            }
        }
        HeaderKey::BedShape => {
            if let Some(flag) = parse::<i64>(dialect, key, comment) {
                config.bed_shape = Some(BedShape::from_flag(flag));
            }
        }
        HeaderKey::TravelSpeed => {
            if let Some(speed) = parse_speed(dialect, key, comment) {
                config.travel_xy_speed = Some(speed);
                config.travel_z_speed = Some(speed);
            }
        }
        HeaderKey::ToolCount => match parse::<usize>(dialect, key, comment) {
            Some(count) if count > MAX_TOOLS => {
                warn!("Ignoring tool count {} (at most {})", count, MAX_TOOLS)
            }
            Some(count) => settings.extruders.ensure_count(count),
            None => {}
        },
        HeaderKey::FirstLayerSpeed => {
            set(&mut config.first_layer_speed, parse_speed(dialect, key, comment))
        }
        HeaderKey::PerimeterSpeed => set(
            &mut config.outer_perimeter_speed,
            parse_speed(dialect, key, comment),
        ),
        HeaderKey::MaterialBlock => match dialect.material_block_tool(comment) {
            Some(tool) if tool >= MAX_TOOLS => {
                warn!("Ignoring settings block for tool {} (at most {})", tool, MAX_TOOLS);
                *current_tool = None;
            }
            Some(tool) => {
                debug!("Reading settings for tool {}", tool);
                settings.extruders.ensure(tool);
                *current_tool = Some(tool);
            }
            None => warn!("Unreadable material block header: {}", lossy(comment)),
        },
        HeaderKey::RetractLength
        | HeaderKey::RetractSpeed
        | HeaderKey::ZHop
        | HeaderKey::Wipe
        | HeaderKey::FeedRateMultiplier
        | HeaderKey::FilamentType => {
            if let Some(tool) = *current_tool {
                apply_tool_setting(dialect, settings, tool, key, comment);
            }
        }
        HeaderKey::FirmwareType => {
            let value = dialect.setting_value(comment).unwrap_or_default();
            if value != dialect.relative_extrusion_value() {
                return Err(ConfigError::RelativeExtrusionRequired {
                    found: lossy(value),
                });
            }
            config.relative_extrusion = true;
        }
    }

    Ok(())
}

fn apply_tool_setting(
    dialect: &dyn Dialect,
    settings: &mut HeaderSettings,
    tool: usize,
    key: HeaderKey,
    comment: &[u8],
) {
    let extruder = settings.extruders.ensure(tool);
    match key {
        HeaderKey::RetractLength => set(&mut extruder.retract, parse(dialect, key, comment)),
        HeaderKey::RetractSpeed => set(
            &mut extruder.retract_speed,
            parse_speed(dialect, key, comment),
        ),
        HeaderKey::ZHop => set(&mut extruder.z_hop, parse(dialect, key, comment)),
        HeaderKey::Wipe => set(&mut extruder.wipe, parse(dialect, key, comment)),
        HeaderKey::FeedRateMultiplier => set(
            &mut extruder.feed_rate_multiplier,
            parse(dialect, key, comment),
        ),
        HeaderKey::FilamentType => {
            if let Some(value) = dialect.setting_value(comment) {
                extruder.filament_type = Some(lossy(value));
            }
        }
        _ => {}
    }
}

/// Overwrite `field` only when a value was parsed.
fn set<T>(field: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *field = value;
    }
}

fn parse<T: FromStr>(dialect: &dyn Dialect, key: HeaderKey, comment: &[u8]) -> Option<T> {
    let parsed = dialect
        .setting_value(comment)
        .and_then(|value| std::str::from_utf8(value).ok())
        .and_then(|value| value.parse().ok());
    if parsed.is_none() {
        warn!("Ignoring malformed {:?} setting: {}", key, lossy(comment));
    }
    parsed
}

fn parse_speed(dialect: &dyn Dialect, key: HeaderKey, comment: &[u8]) -> Option<f64> {
    parse::<f64>(dialect, key, comment).map(|speed| speed * PER_SECOND_TO_PER_MINUTE)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
