// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization — local (adaptive) and global (Otsu) thresholds.

use image::GrayImage;
use imageproc::contrast::otsu_level;
use pcbscope_core::config::AdaptiveThresholdConfig;
use tracing::{debug, instrument};

use super::filter::{Border, gaussian_blur_sized};
use super::mask::BinaryMask;

/// Which side of the threshold becomes foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Bright pixels (above the threshold) are set.
    Normal,
    /// Dark pixels (at or below the threshold) are set. Used where ink,
    /// copper or silkscreen is darker than the board around it.
    Inverted,
}

impl Polarity {
    #[inline]
    fn decide(self, above: bool) -> bool {
        match self {
            Polarity::Normal => above,
            Polarity::Inverted => !above,
        }
    }
}

/// Adaptive binarization.
///
/// For each pixel the threshold is the Gaussian-weighted neighbourhood mean
/// over `cfg.block_size` minus `cfg.bias`. A pixel is "above" when it is
/// strictly greater than that threshold.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn adaptive_threshold(
    gray: &GrayImage,
    cfg: &AdaptiveThresholdConfig,
    polarity: Polarity,
) -> BinaryMask {
    let (width, height) = gray.dimensions();
    let local_mean = gaussian_blur_sized(gray, cfg.block_size, Border::Replicate);

    let mask = BinaryMask::from_fn(width, height, |x, y| {
        let value = gray.get_pixel(x, y).0[0] as i32;
        let mean = local_mean.get_pixel(x, y).0[0] as i32;
        polarity.decide(value - mean > -cfg.bias)
    });
    debug!(
        block_size = cfg.block_size,
        bias = cfg.bias,
        set = mask.count_set(),
        "Adaptive threshold complete"
    );
    mask
}

/// Global Otsu binarization. Returns the mask and the chosen level; a pixel
/// is "above" when strictly greater than the level.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn otsu(gray: &GrayImage, polarity: Polarity) -> (BinaryMask, u8) {
    let level = otsu_level(gray);
    debug!(level, "Otsu level computed");
    let mask = BinaryMask::from_fn(gray.width(), gray.height(), |x, y| {
        polarity.decide(gray.get_pixel(x, y).0[0] > level)
    });
    (mask, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn line_on_light_board() -> GrayImage {
        // Light board with a dark 2-px horizontal line.
        GrayImage::from_fn(60, 40, |_, y| Luma([if y == 20 || y == 21 { 60 } else { 200 }]))
    }

    fn cfg() -> AdaptiveThresholdConfig {
        AdaptiveThresholdConfig {
            block_size: 19,
            bias: 9,
        }
    }

    #[test]
    fn inverted_adaptive_picks_out_dark_line() {
        let img = line_on_light_board();
        let mask = adaptive_threshold(&img, &cfg(), Polarity::Inverted);
        assert!(mask.is_set(30, 20));
        assert!(mask.is_set(30, 21));
        assert!(!mask.is_set(30, 5));
        assert!(!mask.is_set(30, 35));
    }

    #[test]
    fn flat_region_is_not_foreground_when_inverted() {
        // value - mean = 0 > -bias, so "above": clear in inverted output.
        let flat = GrayImage::from_pixel(20, 20, Luma([128]));
        let mask = adaptive_threshold(&flat, &cfg(), Polarity::Inverted);
        assert!(mask.is_empty());
        let normal = adaptive_threshold(&flat, &cfg(), Polarity::Normal);
        assert_eq!(normal.count_set(), 400);
    }

    #[test]
    fn otsu_splits_bimodal_image() {
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 30 } else { 220 }]));
        let (mask, level) = otsu(&img, Polarity::Normal);
        assert!((30..220).contains(&level));
        assert_eq!(mask.count_set(), 50);
        assert!(mask.is_set(9, 0));
        let (inv, _) = otsu(&img, Polarity::Inverted);
        assert!(inv.is_set(0, 0));
    }
}
