// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// 8-bit HSV conversion and color-range segmentation.

use image::RgbImage;
use pcbscope_core::palette::ColorRange;
use rayon::prelude::*;

use super::mask::BinaryMask;

/// Convert one RGB pixel to 8-bit HSV: hue in [0, 180), saturation and value
/// in [0, 255].
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }
    let mut h8 = (h / 2.0).round() as u32;
    if h8 >= 180 {
        h8 -= 180;
    }

    [h8 as u8, s.round().min(255.0) as u8, v as u8]
}

/// HSV triples of every pixel, row-major.
pub fn hsv_plane(rgb: &RgbImage) -> Vec<[u8; 3]> {
    rgb.as_raw()
        .par_chunks_exact(3)
        .map(|p| rgb_to_hsv([p[0], p[1], p[2]]))
        .collect()
}

/// One mask per range, in the order the ranges are given. A pixel is set in
/// a range's mask when its HSV triple lies inside the range on all channels.
pub fn segment(rgb: &RgbImage, ranges: &[ColorRange]) -> Vec<BinaryMask> {
    let (width, height) = rgb.dimensions();
    let hsv = hsv_plane(rgb);
    ranges
        .par_iter()
        .map(|range| {
            BinaryMask::from_fn(width, height, |x, y| {
                range.contains(hsv[(y * width + x) as usize])
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use pcbscope_core::palette::COMPONENT_COLOR_RANGES;

    #[test]
    fn primaries() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([200, 200, 200]), [0, 0, 200]);
    }

    #[test]
    fn near_red_wraps_below_180() {
        let [h, _, _] = rgb_to_hsv([255, 0, 1]);
        assert!(h < 180);
    }

    #[test]
    fn cyan_board_matches_no_component_range() {
        let hsv = rgb_to_hsv([100, 230, 220]);
        assert_eq!(hsv[0], 88);
        assert!(COMPONENT_COLOR_RANGES.iter().all(|r| !r.contains(hsv)));
    }

    #[test]
    fn segment_preserves_range_order() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([100, 230, 220]));
        img.put_pixel(0, 0, Rgb([5, 5, 5]));
        let masks = segment(&img, &COMPONENT_COLOR_RANGES);
        assert_eq!(masks.len(), COMPONENT_COLOR_RANGES.len());
        // black_dark is first and catches the near-black pixel.
        assert_eq!(masks[0].count_set(), 1);
        assert!(masks[0].is_set(0, 0));
    }
}
