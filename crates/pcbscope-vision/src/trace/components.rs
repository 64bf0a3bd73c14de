// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Component detection by HSV color segmentation.

use image::RgbImage;
use pcbscope_core::config::{OcrPrepConfig, TraceConfig};
use pcbscope_core::palette::{COMPONENT_COLOR_RANGES, ColorRange, OCR_COMPONENT_COLOR_RANGES};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::kernels::color::segment;
use crate::kernels::morphology::{close, dilate, open};
use crate::kernels::{BinaryMask, Kernel};

/// Set-pixel count of one named color range, before any morphology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCount {
    pub name: String,
    pub pixels: u64,
}

#[derive(Debug, Clone)]
pub struct ComponentDetection {
    /// Union of every per-range mask.
    pub raw_mask: BinaryMask,
    /// `raw_mask` after cleanup and dilation.
    pub mask: BinaryMask,
    /// Per-range counts in table order.
    pub range_counts: Vec<RangeCount>,
}

/// Builds a single "occupied by a component" mask from a color table.
#[derive(Debug, Clone)]
pub struct ComponentDetector {
    ranges: &'static [ColorRange],
    /// Close-then-open applied to the union.
    cleanup: Option<Kernel>,
    /// Growth applied last, as `(element, iterations)`.
    dilation: Option<(Kernel, u32)>,
}

impl ComponentDetector {
    /// Full color table, grown so the mask covers each footprint plus margin.
    pub fn for_traces(config: &TraceConfig) -> Self {
        Self {
            ranges: &COMPONENT_COLOR_RANGES,
            cleanup: None,
            dilation: Some((
                Kernel::square(config.component_dilate_kernel),
                config.component_dilate_iterations,
            )),
        }
    }

    /// Reduced table with speckle cleanup and no growth.
    pub fn for_ocr(config: &OcrPrepConfig) -> Self {
        Self {
            ranges: &OCR_COMPONENT_COLOR_RANGES,
            cleanup: Some(Kernel::square(config.component_cleanup_kernel)),
            dilation: None,
        }
    }

    pub fn ranges(&self) -> &'static [ColorRange] {
        self.ranges
    }

    #[instrument(skip_all, fields(width = rgb.width(), height = rgb.height(), ranges = self.ranges.len()))]
    pub fn detect(&self, rgb: &RgbImage) -> ComponentDetection {
        let (w, h) = rgb.dimensions();
        let per_range = segment(rgb, self.ranges);

        let range_counts = self
            .ranges
            .iter()
            .zip(&per_range)
            .map(|(range, mask)| RangeCount {
                name: range.name.to_string(),
                pixels: mask.count_set(),
            })
            .collect();

        let raw_mask = per_range
            .iter()
            .fold(BinaryMask::new(w, h), |acc, m| acc.union(m));

        let mut mask = raw_mask.clone();
        if let Some(kernel) = self.cleanup {
            mask = open(&close(&mask, kernel), kernel);
        }
        if let Some((kernel, iterations)) = self.dilation {
            mask = dilate(&mask, kernel, iterations);
        }

        debug!(
            raw = raw_mask.count_set(),
            dilated = mask.count_set(),
            "Component mask built"
        );
        ComponentDetection {
            raw_mask,
            mask,
            range_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn board_with_chip() -> RgbImage {
        RgbImage::from_fn(60, 40, |x, y| {
            if (20..35).contains(&x) && (10..25).contains(&y) {
                Rgb([10, 10, 10])
            } else {
                Rgb([100, 230, 220])
            }
        })
    }

    #[test]
    fn raw_mask_is_union_of_ranges() {
        let img = board_with_chip();
        let detection = ComponentDetector::for_traces(&TraceConfig::default()).detect(&img);
        let union = segment(&img, &COMPONENT_COLOR_RANGES)
            .iter()
            .fold(BinaryMask::new(60, 40), |acc, m| acc.union(m));
        assert_eq!(detection.raw_mask, union);
        assert_eq!(detection.raw_mask.count_set(), 15 * 15);
    }

    #[test]
    fn dilation_only_adds_pixels() {
        let detection = ComponentDetector::for_traces(&TraceConfig::default()).detect(&board_with_chip());
        assert!(detection.raw_mask.and_not(&detection.mask).is_empty());
        // 7x7 twice grows by 6 pixels per side.
        assert!(detection.mask.is_set(14, 17));
        assert!(!detection.mask.is_set(13, 17));
    }

    #[test]
    fn range_counts_follow_table_order() {
        let detection = ComponentDetector::for_traces(&TraceConfig::default()).detect(&board_with_chip());
        let names: Vec<&str> = detection.range_counts.iter().map(|c| c.name.as_str()).collect();
        let expected: Vec<&str> = COMPONENT_COLOR_RANGES.iter().map(|r| r.name).collect();
        assert_eq!(names, expected);
        assert_eq!(detection.range_counts[0].pixels, 225);
    }

    #[test]
    fn ocr_detector_cleans_specks() {
        let mut img = board_with_chip();
        img.put_pixel(50, 32, Rgb([0, 0, 0]));
        let detection = ComponentDetector::for_ocr(&OcrPrepConfig::default()).detect(&img);
        assert!(detection.raw_mask.is_set(50, 32));
        assert!(!detection.mask.is_set(50, 32));
        assert!(detection.mask.is_set(27, 17));
    }
}
