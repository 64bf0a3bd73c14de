// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trace-candidate preprocessing: blur once, then derive the adaptive, Otsu and
// edge variants from that same blurred image.

use image::GrayImage;
use imageproc::edges::canny;
use pcbscope_core::config::{AdaptiveThresholdConfig, TraceConfig};
use pcbscope_core::error::{Branch, PcbError, Result};
use tracing::{debug, instrument};

use crate::kernels::filter::{Border, gaussian_blur_sized};
use crate::kernels::threshold::{adaptive_threshold, otsu};
use crate::kernels::{BinaryMask, Polarity};

/// Smallest side the trace kernels accept.
pub const MIN_SIDE: u32 = 3;

/// The three trace-candidate variants plus the buffers they came from.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub gray: GrayImage,
    pub blurred: GrayImage,
    /// Inverted adaptive threshold (dark ink set).
    pub adaptive: BinaryMask,
    /// Inverted Otsu threshold.
    pub otsu: BinaryMask,
    pub otsu_level: u8,
    /// Canny edge map.
    pub edges: BinaryMask,
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    blur_kernel: u32,
    adaptive: AdaptiveThresholdConfig,
    canny_low: f32,
    canny_high: f32,
}

impl Preprocessor {
    pub fn new(config: &TraceConfig) -> Self {
        Self {
            blur_kernel: config.blur_kernel,
            adaptive: config.adaptive,
            canny_low: config.canny_low,
            canny_high: config.canny_high,
        }
    }

    /// Blur the grayscale input and compute the three variants concurrently.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn run(&self, gray: &GrayImage) -> Result<Preprocessed> {
        let (w, h) = gray.dimensions();
        if w < MIN_SIDE || h < MIN_SIDE {
            return Err(PcbError::stage(
                Branch::Trace,
                "preprocess",
                format!("image is {w}x{h}; trace kernels need at least {MIN_SIDE}x{MIN_SIDE}"),
            ));
        }

        let blurred = gaussian_blur_sized(gray, self.blur_kernel, Border::Reflect101);

        let (adaptive, ((otsu_mask, otsu_level), edges)) = rayon::join(
            || adaptive_threshold(&blurred, &self.adaptive, Polarity::Inverted),
            || {
                rayon::join(
                    || otsu(&blurred, Polarity::Inverted),
                    || {
                        BinaryMask::from_gray_nonzero(&canny(
                            &blurred,
                            self.canny_low,
                            self.canny_high,
                        ))
                    },
                )
            },
        );

        debug!(
            adaptive = adaptive.count_set(),
            otsu = otsu_mask.count_set(),
            otsu_level,
            edges = edges.count_set(),
            "Trace candidates computed"
        );

        Ok(Preprocessed {
            gray: gray.clone(),
            blurred,
            adaptive,
            otsu: otsu_mask,
            otsu_level,
            edges,
        })
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(&TraceConfig::default())
    }
}
