// THEORY:
// The `frame` module is the bridge between raw captured images and the
// zone-based analysis paradigm. A `Frame` is an immutable-by-convention grid
// of capture-order samples, produced once per run; everything downstream only
// ever reads from it. The module owns the three whole-frame operations:
// grayscale projection, rectangular sub-image extraction, and the
// letterbox/pillarbox preprocessor.
//
// The letterbox crop deliberately resizes the cropped region back to the
// original frame dimensions. Zone rectangles are authored against the full
// frame, and stretching the crop back keeps every rectangle valid without
// recomputing geometry per frame. A crop is only applied when the black bars
// are symmetric on exactly one axis; anything else is treated as content and
// the frame passes through untouched.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};

use crate::core_modules::color::{self, Color3};
use crate::core_modules::zones::ZoneRect;

/// A captured frame: a 2-D grid of 3-channel samples in capture order.
pub type Frame = RgbImage;

/// Symmetry tolerance (in pixels) for letterbox detection: both bars must be
/// deeper than this and differ from each other by no more than this.
pub const LETTERBOX_MARGIN: u32 = 20;

/// The capture-order sample at a pixel.
pub fn sample(frame: &Frame, x: u32, y: u32) -> Color3 {
    Color3(frame.get_pixel(x, y).0)
}

/// Projects a frame to grayscale using the analysis channel weights.
pub fn gray(frame: &Frame) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        Luma([color::luma(sample(frame, x, y)).round() as u8])
    })
}

/// Copies the sub-image covered by a zone rectangle.
/// Callers are responsible for bounds-checking the rectangle first.
pub fn zone_view(frame: &Frame, rect: &ZoneRect) -> Frame {
    imageops::crop_imm(frame, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Removes symmetric letterbox (horizontal bars) or pillarbox (vertical bars)
/// from a frame. `black_threshold` is the per-pixel intensity below which a
/// whole row/column counts as black; `margin` is the symmetry tolerance.
///
/// Returns the frame unchanged when no single-axis symmetric bar pattern is
/// found; otherwise crops that axis and resizes back to the original size.
pub fn crop_letterbox(frame: &Frame, black_threshold: u32, margin: u32) -> Frame {
    let gray = gray(frame);
    let (cols, rows) = gray.dimensions();
    if cols == 0 || rows == 0 {
        return frame.clone();
    }

    let mut row_sum = vec![0u64; rows as usize];
    let mut col_sum = vec![0u64; cols as usize];
    for (x, y, px) in gray.enumerate_pixels() {
        row_sum[y as usize] += px.0[0] as u64;
        col_sum[x as usize] += px.0[0] as u64;
    }

    let row_threshold = black_threshold as u64 * cols as u64;
    let col_threshold = black_threshold as u64 * rows as u64;

    // Scan inward from each edge, never past the midline.
    let mut top = 0u32;
    while top < rows / 2 && row_sum[top as usize] <= row_threshold {
        top += 1;
    }
    let mut bottom = rows - 1;
    while bottom > rows / 2 && row_sum[bottom as usize] <= row_threshold {
        bottom -= 1;
    }
    let mut left = 0u32;
    while left < cols / 2 && col_sum[left as usize] <= col_threshold {
        left += 1;
    }
    let mut right = cols - 1;
    while right > cols / 2 && col_sum[right as usize] <= col_threshold {
        right -= 1;
    }

    let top_crop = top;
    let bottom_crop = rows - 1 - bottom;
    let left_crop = left;
    let right_crop = cols - 1 - right;

    let crop_vertical =
        top_crop > margin && bottom_crop > margin && top_crop.abs_diff(bottom_crop) <= margin;
    let crop_horizontal =
        left_crop > margin && right_crop > margin && left_crop.abs_diff(right_crop) <= margin;

    let cropped = if crop_vertical && !crop_horizontal {
        log::debug!("letterbox detected: top={top_crop}, bottom={bottom_crop}");
        imageops::crop_imm(frame, 0, top, cols, bottom - top + 1).to_image()
    } else if crop_horizontal && !crop_vertical {
        log::debug!("pillarbox detected: left={left_crop}, right={right_crop}");
        imageops::crop_imm(frame, left, 0, right - left + 1, rows).to_image()
    } else {
        return frame.clone();
    };

    imageops::resize(&cropped, cols, rows, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn letterboxed_frame(width: u32, height: u32, bar: u32) -> Frame {
        Frame::from_fn(width, height, |_, y| {
            if y < bar || y >= height - bar {
                Rgb([0, 0, 0])
            } else {
                Rgb([200, 200, 200])
            }
        })
    }

    #[test]
    fn frame_without_bars_is_returned_unchanged() {
        let frame = Frame::from_pixel(40, 30, Rgb([90, 120, 60]));
        let out = crop_letterbox(&frame, 10, 5);
        assert_eq!(out, frame);
    }

    #[test]
    fn symmetric_horizontal_bars_are_cropped_and_resized_back() {
        let frame = letterboxed_frame(40, 40, 10);
        let out = crop_letterbox(&frame, 10, 5);
        assert_eq!(out.dimensions(), (40, 40));
        // Content stretched over the full height: no black rows survive.
        for y in 0..40 {
            assert!(out.get_pixel(20, y).0[0] > 100, "row {y} still black");
        }
    }

    #[test]
    fn bars_on_both_axes_leave_the_frame_unchanged() {
        let frame = Frame::from_fn(40, 40, |x, y| {
            let in_bar = x < 10 || x >= 30 || y < 10 || y >= 30;
            if in_bar { Rgb([0, 0, 0]) } else { Rgb([220, 220, 220]) }
        });
        let out = crop_letterbox(&frame, 10, 5);
        assert_eq!(out, frame);
    }

    #[test]
    fn asymmetric_bars_are_not_cropped() {
        // Only a top bar: symmetric-crop rule must reject it.
        let frame = Frame::from_fn(40, 40, |_, y| {
            if y < 12 { Rgb([0, 0, 0]) } else { Rgb([200, 200, 200]) }
        });
        let out = crop_letterbox(&frame, 10, 5);
        assert_eq!(out, frame);
    }
}
