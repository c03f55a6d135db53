// THEORY:
// The `analyzer` module computes everything the pipeline knows about one zone
// from one frame: how much the region moved since the previous frame, how
// busy it is with edges, and which single color best represents it. The three
// measurements feed one adjusted output color.
//
// Key design choices:
// 1.  **Mode over mean for color**: the dominant color is the mean of the
//     pixels sharing the most frequent hue bin, not the mean of the whole
//     region. A plain mean gets pulled toward background noise; the modal hue
//     locks onto the color a viewer would actually name.
// 2.  **Motion and edges as boosts, not gates**: motion brightens the output,
//     edge density saturates it. Both are capped so a chaotic region cannot
//     blow past the channel range.
// 3.  **Stateless analysis**: the analyzer owns no history. The previous
//     frame's sub-image is handed in by the caller, so every invocation is a
//     pure function of its inputs and the global mode flags.

use imageproc::edges::canny;

use crate::config::Settings;
use crate::core_modules::color::{self, Color3};
use crate::core_modules::frame::{self, Frame};

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const HUE_BINS: usize = 180;

/// Everything measured and derived for a single zone in one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneAnalysis {
    /// Average grayscale difference against the previous frame's sub-image.
    pub motion_intensity: f64,
    /// Scaled edge density, roughly on a 0-255 scale.
    pub edge_intensity: f64,
    /// The modal-hue representative color before adjustments.
    pub dominant_color: Color3,
    /// The color after brightness/saturation adjustments; what gets emitted.
    pub adjusted_color: Color3,
}

/// Average per-pixel grayscale difference between two sub-images.
/// Zero when the sizes disagree or either region is empty.
pub fn motion_intensity(current: &Frame, previous: &Frame) -> f64 {
    if current.dimensions() != previous.dimensions() {
        return 0.0;
    }
    let total = current.width() as u64 * current.height() as u64;
    if total == 0 {
        return 0.0;
    }

    let mut acc = 0.0f64;
    for (curr, prev) in current.pixels().zip(previous.pixels()) {
        let diff = Color3([
            curr.0[0].abs_diff(prev.0[0]),
            curr.0[1].abs_diff(prev.0[1]),
            curr.0[2].abs_diff(prev.0[2]),
        ]);
        acc += color::luma(diff);
    }
    acc / total as f64
}

/// Edge density of the sub-image scaled to a 0-255 range.
pub fn edge_intensity(segment: &Frame) -> f64 {
    // Edge detection needs a neighborhood; degenerate regions carry no edges.
    if segment.width() < 3 || segment.height() < 3 {
        return 0.0;
    }
    let gray = frame::gray(segment);
    let edges = canny(&gray, CANNY_LOW, CANNY_HIGH);
    let edge_count = edges.pixels().filter(|px| px.0[0] > 0).count();
    let total = (segment.width() * segment.height()) as f64;
    edge_count as f64 / total * 255.0
}

/// The representative color of a sub-image: build a 180-bin hue histogram,
/// take the fullest bin, and average the samples whose hue lands in it.
pub fn dominant_color(segment: &Frame) -> Color3 {
    if segment.width() == 0 || segment.height() == 0 {
        return Color3::default();
    }

    let hues: Vec<u8> = segment
        .pixels()
        .map(|px| color::hsv_analysis(Color3(px.0)).h)
        .collect();

    let mut histogram = [0u32; HUE_BINS];
    for &hue in &hues {
        histogram[hue as usize] += 1;
    }
    let modal_hue = histogram
        .iter()
        .enumerate()
        .max_by_key(|&(_, count)| count)
        .map(|(bin, _)| bin as u8)
        .unwrap_or(0);

    let mut sums = [0u64; 3];
    let mut count = 0u64;
    for (px, &hue) in segment.pixels().zip(&hues) {
        if hue == modal_hue {
            sums[0] += px.0[0] as u64;
            sums[1] += px.0[1] as u64;
            sums[2] += px.0[2] as u64;
            count += 1;
        }
    }
    if count == 0 {
        return Color3::default();
    }
    Color3([
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    ])
}

/// Full per-zone analysis: measure, pick the dominant color, then apply the
/// global adjustment modes in their fixed order (uniform brightness, color
/// boost, motion/edge boost last).
pub fn analyze_zone(
    current: &Frame,
    previous: Option<&Frame>,
    settings: &Settings,
) -> ZoneAnalysis {
    let motion = previous.map_or(0.0, |prev| motion_intensity(current, prev));
    let edge = edge_intensity(current);
    let dominant = dominant_color(current);

    let mut adjusted = dominant;
    if settings.set_uniform_brightness {
        adjusted = color::proportional_brightness(adjusted, settings.uniform_brightness);
    }
    if settings.set_color_boost {
        adjusted = color::saturation_boost(adjusted, settings.color_boost_factor);
    }
    adjusted = color::boost_for_motion_and_edges(adjusted, motion, edge, settings.set_color_boost);

    ZoneAnalysis {
        motion_intensity: motion,
        edge_intensity: edge,
        dominant_color: dominant,
        adjusted_color: adjusted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn motion_is_zero_for_identical_regions() {
        let frame = Frame::from_pixel(8, 8, Rgb([120, 30, 200]));
        assert_eq!(motion_intensity(&frame, &frame.clone()), 0.0);
    }

    #[test]
    fn motion_is_zero_when_sizes_mismatch() {
        let a = Frame::from_pixel(8, 8, Rgb([0, 0, 0]));
        let b = Frame::from_pixel(8, 4, Rgb([255, 255, 255]));
        assert_eq!(motion_intensity(&a, &b), 0.0);
    }

    #[test]
    fn motion_tracks_average_difference() {
        let a = Frame::from_pixel(4, 4, Rgb([0, 0, 0]));
        let b = Frame::from_pixel(4, 4, Rgb([255, 255, 255]));
        let motion = motion_intensity(&a, &b);
        assert!((motion - 255.0).abs() < 1.0, "motion = {motion}");
    }

    #[test]
    fn flat_region_has_no_edges() {
        let frame = Frame::from_pixel(16, 16, Rgb([80, 80, 80]));
        assert_eq!(edge_intensity(&frame), 0.0);
    }

    #[test]
    fn hard_boundary_produces_edges() {
        let frame = Frame::from_fn(32, 32, |x, _| {
            if x < 16 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        assert!(edge_intensity(&frame) > 0.0);
    }

    #[test]
    fn solid_region_is_its_own_dominant_color() {
        let frame = Frame::from_pixel(10, 10, Rgb([17, 130, 240]));
        assert_eq!(dominant_color(&frame), Color3([17, 130, 240]));
    }

    #[test]
    fn dominant_color_ignores_a_minority_hue() {
        // 3/4 saturated channel-2, 1/4 saturated channel-0.
        let frame = Frame::from_fn(8, 8, |x, _| {
            if x < 6 { Rgb([0, 0, 250]) } else { Rgb([250, 0, 0]) }
        });
        assert_eq!(dominant_color(&frame), Color3([0, 0, 250]));
    }

    #[test]
    fn analysis_without_previous_frame_reports_zero_motion() {
        let frame = Frame::from_pixel(8, 8, Rgb([10, 200, 90]));
        let analysis = analyze_zone(&frame, None, &Settings::default());
        assert_eq!(analysis.motion_intensity, 0.0);
        assert_eq!(analysis.dominant_color, Color3([10, 200, 90]));
    }
}
