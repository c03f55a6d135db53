// THEORY:
// The `command` module is the byte-exact boundary between analysis and the
// light hardware. Every zone owns a fixed 13-byte payload template; only a
// 6-byte window inside it ever changes, carrying hue/saturation/value as
// three big-endian 16-bit fields (the wire format's "four hex digits" each).
// The finished payload is shipped as a standard Base64 string.
//
// The template table is a compile-time constant indexed by zone id with
// explicit bounds checking; asking for a zone outside the table is an error
// local to that zone, never a run failure.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::config::Settings;
use crate::core_modules::color::{self, Color3};
use crate::core_modules::zones::ZoneId;
use crate::error::CommandError;

/// Prefix applied to zone ids to form device-address keys in the output.
pub const DEVICE_FAMILY_TAG: &str = "61";

/// Highest zone id the payload template table covers.
pub const MAX_ZONE_ID: ZoneId = 20;

/// Length of every payload template in bytes.
pub const TEMPLATE_LEN: usize = 13;

/// Offset and length of the hue/saturation/value window inside a template.
const COLOR_WINDOW_OFFSET: usize = 5;
const COLOR_WINDOW_LEN: usize = 6;

/// Channel floor below which a color counts as near-black (0-255 scale).
const NEAR_BLACK_FLOOR: u8 = 50;
/// Brightness ceiling applied to near-black colors (0-1000 device scale).
const NEAR_BLACK_VALUE_CAP: u32 = 100;

const fn build_templates() -> [[u8; TEMPLATE_LEN]; MAX_ZONE_ID as usize] {
    let mut table = [[0u8; TEMPLATE_LEN]; MAX_ZONE_ID as usize];
    let mut i = 0;
    while i < MAX_ZONE_ID as usize {
        // Zones address the strip top-down: zone 1 maps to unit 0x14.
        table[i] = [
            0x00, 0x02, 0x00, 0x14, 0x01, 0x00, 0x00, 0x03, 0xe8, 0x03, 0xe8, 0x81,
            (MAX_ZONE_ID as usize - i) as u8,
        ];
        i += 1;
    }
    table
}

static PAYLOAD_TEMPLATES: [[u8; TEMPLATE_LEN]; MAX_ZONE_ID as usize] = build_templates();

/// The unmodified payload template for a zone, if the table covers it.
pub fn template_for(zone: ZoneId) -> Option<&'static [u8; TEMPLATE_LEN]> {
    if (1..=MAX_ZONE_ID).contains(&zone) {
        Some(&PAYLOAD_TEMPLATES[(zone - 1) as usize])
    } else {
        None
    }
}

/// The device-address key for a zone, e.g. `61_7`.
pub fn device_key(zone: ZoneId) -> String {
    format!("{DEVICE_FAMILY_TAG}_{zone}")
}

/// How the encoder fills the brightness field for non-near-black colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessPolicy {
    /// Emit the value derived from the color itself.
    AsComputed,
    /// Override with a fixed target on the device's 0-1000 scale.
    Uniform(u32),
}

impl BrightnessPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.set_uniform_brightness {
            Self::Uniform(settings.uniform_brightness)
        } else {
            Self::AsComputed
        }
    }
}

/// Encodes one zone's color into its Base64 command string.
///
/// The color is read in device order, converted to HSV, rescaled to the wire
/// domains (hue 0-360, saturation/value 0-1000), run through the near-black
/// override, and spliced into the zone's payload template.
pub fn encode(
    zone: ZoneId,
    color: Color3,
    brightness: BrightnessPolicy,
) -> Result<String, CommandError> {
    let Some(template) = template_for(zone) else {
        return Err(CommandError::ZoneOutOfRange { zone });
    };

    let hsv = color::hsv_device(color);
    let hue = ((hsv.h as u32) * 2).min(360);
    let sat = ((hsv.s as f64 / 255.0 * 1000.0) as u32).min(1000);
    let mut val = ((hsv.v as f64 / 255.0 * 1000.0) as u32).min(1000);

    // Near-black colors must never emit a bright command: rounding through
    // HSV can leave a non-zero value on a visually black sample.
    let [c0, c1, c2] = color.0;
    let near_black = (c0 < NEAR_BLACK_FLOOR && c1 < NEAR_BLACK_FLOOR && c2 < NEAR_BLACK_FLOOR)
        || val < NEAR_BLACK_FLOOR as u32 * 1000 / 255;
    if near_black {
        val = val.min(NEAR_BLACK_VALUE_CAP);
    } else if let BrightnessPolicy::Uniform(target) = brightness {
        val = target.min(1000);
    }

    let mut payload = *template;
    let fields = [hue as u16, sat as u16, val as u16];
    for (i, &field) in fields.iter().enumerate() {
        payload[COLOR_WINDOW_OFFSET + 2 * i] = (field >> 8) as u8;
        payload[COLOR_WINDOW_OFFSET + 2 * i + 1] = (field & 0xff) as u8;
    }

    Ok(STANDARD.encode(payload))
}
