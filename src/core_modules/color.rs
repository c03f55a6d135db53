// THEORY:
// The `color` module holds the numeric color primitives shared by the analyzer
// and the command encoder. It follows the "dumb data, explicit math" principle:
// `Color3` is a plain triple of channel bytes, and every color-space operation
// is a pure function with no hidden configuration.
//
// Channel order deserves special care. The capture backend delivers samples in
// the device-native order, and the two halves of the pipeline read that triple
// differently:
// - the *analysis* path (dominant color, brightness/saturation adjustments)
//   reads it back-to-front, treating channel 2 as red;
// - the *device* path (command encoding) reads it front-to-back, treating
//   channel 0 as red.
// Both interpretations are explicit wrapper functions around one core
// `rgb_to_hsv` / `hsv_to_rgb` pair, so the order assumption is visible at
// every call site instead of being baked into a struct field name.
//
// The HSV representation matches the 8-bit convention used by most capture
// tooling: hue in 0..=179 (half-degrees), saturation and value in 0..=255.

/// One frame sample in capture channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color3(pub [u8; 3]);

/// An 8-bit HSV color: hue in half-degrees (0-179), saturation and value 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Colors whose value channel sits below this floor are left untouched by the
/// proportional-brightness pass, so near-black pixels are never brightened
/// into visible gray.
pub const DARK_VALUE_FLOOR: u8 = 30;

/// Converts an RGB triple to 8-bit HSV (hue 0-179).
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let v = max;
    let delta = (max - min) as f64;

    let s = if max == 0 {
        0
    } else {
        (255.0 * delta / max as f64).round() as u8
    };

    if delta == 0.0 {
        return Hsv { h: 0, s, v };
    }

    let (rf, gf, bf) = (r as f64, g as f64, b as f64);
    let mut hue = if max == r {
        60.0 * (gf - bf) / delta
    } else if max == g {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }
    let mut h = (hue / 2.0).round() as u16;
    if h >= 180 {
        h -= 180;
    }
    Hsv { h: h as u8, s, v }
}

/// Converts an 8-bit HSV color back to an RGB triple.
pub fn hsv_to_rgb(hsv: Hsv) -> (u8, u8, u8) {
    let h = hsv.h as f64 * 2.0;
    let s = hsv.s as f64 / 255.0;
    let v = hsv.v as f64 / 255.0;

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (rp, gp, bp) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((rp + m) * 255.0).round() as u8,
        ((gp + m) * 255.0).round() as u8,
        ((bp + m) * 255.0).round() as u8,
    )
}

/// HSV of a sample under the analysis interpretation (channel 2 is red).
pub fn hsv_analysis(color: Color3) -> Hsv {
    let [c0, c1, c2] = color.0;
    rgb_to_hsv(c2, c1, c0)
}

/// Rebuilds a capture-order sample from analysis-interpretation HSV.
pub fn color_from_analysis(hsv: Hsv) -> Color3 {
    let (r, g, b) = hsv_to_rgb(hsv);
    Color3([b, g, r])
}

/// HSV of a sample under the device interpretation (channel 0 is red).
pub fn hsv_device(color: Color3) -> Hsv {
    let [c0, c1, c2] = color.0;
    rgb_to_hsv(c0, c1, c2)
}

/// The sample reordered for host-facing output and the persisted state file.
pub fn host_order(color: Color3) -> [u8; 3] {
    let [c0, c1, c2] = color.0;
    [c2, c1, c0]
}

/// Grayscale intensity of a sample under the analysis interpretation.
pub fn luma(color: Color3) -> f64 {
    let [c0, c1, c2] = color.0;
    0.114 * c0 as f64 + 0.587 * c1 as f64 + 0.299 * c2 as f64
}

/// Boosts brightness with motion and saturation with edge density.
/// Brightness gains up to +50%, saturation up to +10%; the saturation term is
/// suppressed entirely while color-boost mode supplies its own multiplier.
pub fn boost_for_motion_and_edges(
    color: Color3,
    motion_intensity: f64,
    edge_intensity: f64,
    color_boost_active: bool,
) -> Color3 {
    let mut hsv = hsv_analysis(color);

    let brightness_boost = 1.0 + (motion_intensity / 50.0).min(0.5);
    let saturation_boost = if color_boost_active {
        1.0
    } else {
        1.0 + (edge_intensity / 50.0).min(0.1)
    };

    hsv.v = ((hsv.v as f64 * brightness_boost) as i32).min(255) as u8;
    hsv.s = ((hsv.s as f64 * saturation_boost) as i32).min(255) as u8;
    color_from_analysis(hsv)
}

/// Rescales the value channel proportionally toward a target brightness.
/// The target lives in the device's 0-1000 domain and is normalized against
/// the 8-bit channel scale, matching how the encoder consumes the same knob.
/// Colors below `DARK_VALUE_FLOOR` pass through unchanged.
pub fn proportional_brightness(color: Color3, target: u32) -> Color3 {
    let mut hsv = hsv_analysis(color);
    if hsv.v < DARK_VALUE_FLOOR {
        return color;
    }
    let scale = target as f64 / 255.0;
    hsv.v = ((hsv.v as f64 * scale) as i32).clamp(0, 255) as u8;
    color_from_analysis(hsv)
}

/// Multiplies the saturation channel by a configured factor, clamped to 255.
pub fn saturation_boost(color: Color3, factor: f64) -> Color3 {
    let mut hsv = hsv_analysis(color);
    hsv.s = ((hsv.s as f64 * factor) as i32).min(255) as u8;
    color_from_analysis(hsv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_colors_convert_to_expected_hsv() {
        assert_eq!(rgb_to_hsv(255, 0, 0), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 255, 0), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 0, 255), Hsv { h: 120, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(255, 255, 255), Hsv { h: 0, s: 0, v: 255 });
        assert_eq!(rgb_to_hsv(0, 0, 0), Hsv { h: 0, s: 0, v: 0 });
    }

    #[test]
    fn primaries_round_trip_through_hsv() {
        for rgb in [(255, 0, 0), (0, 255, 0), (0, 0, 255), (128, 128, 128)] {
            let hsv = rgb_to_hsv(rgb.0, rgb.1, rgb.2);
            assert_eq!(hsv_to_rgb(hsv), rgb);
        }
    }

    #[test]
    fn analysis_and_device_interpretations_disagree_on_red() {
        // Channel 0 saturated: blue-ish under analysis, pure red on the device.
        let color = Color3([255, 0, 0]);
        assert_eq!(hsv_analysis(color).h, 120);
        assert_eq!(hsv_device(color).h, 0);
    }

    #[test]
    fn motion_boost_caps_at_fifty_percent() {
        let color = Color3([0, 0, 100]);
        let boosted = boost_for_motion_and_edges(color, 1000.0, 0.0, false);
        assert_eq!(hsv_analysis(boosted).v, 150);
    }

    #[test]
    fn edge_boost_is_suppressed_when_color_boost_is_active() {
        let color = Color3([40, 80, 200]);
        let with_edges = boost_for_motion_and_edges(color, 0.0, 255.0, true);
        let without_edges = boost_for_motion_and_edges(color, 0.0, 0.0, true);
        assert_eq!(with_edges, without_edges);
    }

    #[test]
    fn proportional_brightness_skips_very_dark_colors() {
        let dark = Color3([10, 10, 10]);
        assert_eq!(proportional_brightness(dark, 500), dark);
    }

    #[test]
    fn proportional_brightness_rescales_bright_colors() {
        // Value 200 scaled by 500/255 saturates at the channel ceiling.
        let bright = Color3([0, 0, 200]);
        let adjusted = proportional_brightness(bright, 500);
        assert_eq!(hsv_analysis(adjusted).v, 255);
        // A dimming target scales downward instead.
        let dimmed = proportional_brightness(bright, 128);
        assert_eq!(hsv_analysis(dimmed).v, 100);
    }

    #[test]
    fn saturation_boost_clamps_to_channel_range() {
        let color = Color3([60, 60, 200]);
        let boosted = saturation_boost(color, 10.0);
        assert_eq!(hsv_analysis(boosted).s, 255);
    }
}
