// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR preparation — turns a board photo into a clean binary image for a text
// recognizer, reusing the shared kernels with legibility-oriented tuning.

use image::{GrayImage, Luma, Rgb, RgbImage, imageops};
use imageproc::edges::canny;
use pcbscope_core::config::OcrPrepConfig;
use pcbscope_core::error::{Branch, PcbError, Result};
use pcbscope_core::types::RunId;
use tracing::{debug, info, instrument};

use crate::kernels::clahe::clahe;
use crate::kernels::filter::{Border, bilateral, gaussian_blur_sized, unsharp};
use crate::kernels::inpaint::telea;
use crate::kernels::morphology::{close, dilate, erode, open};
use crate::kernels::threshold::{adaptive_threshold, otsu};
use crate::kernels::{BinaryMask, Kernel, Polarity};
use crate::raster::BoardImage;
use crate::stages::{ProcessingStage, StageLog};
use crate::trace::ComponentDetector;

/// Stage labels recorded by [`OcrPreprocessor::prepare_with_stages`], in order.
pub const OCR_STAGE_LABELS: [&str; 18] = [
    "Original",
    "Grayscale",
    "Denoised",
    "Sharpened",
    "Enhanced",
    "Smoothed",
    "Binary (Adaptive)",
    "Binary (Otsu)",
    "Dilated",
    "Eroded",
    "Final Cleaned",
    "Canny Edges",
    "Trace Enhanced",
    "Component Mask",
    "Component Suppressed",
    "Trace Isolated",
    "Traces (Blue Overlay)",
    "Final Trace Map",
];

const MIN_SIDE: u32 = 3;

/// Result of a staged OCR preparation.
#[derive(Debug, Clone)]
pub struct OcrPrepared {
    /// Primary output: dark text on a light background, ready for recognition.
    pub binary: BinaryMask,
    /// Level chosen by the diagnostic Otsu threshold.
    pub otsu_level: u8,
    /// Suppressed board with traces drawn black.
    pub trace_map: GrayImage,
    pub stages: Vec<ProcessingStage>,
}

/// Intermediate buffers of the primary path.
struct Primary {
    smoothed: GrayImage,
    binary: BinaryMask,
}

#[derive(Debug, Clone, Default)]
pub struct OcrPreprocessor {
    config: OcrPrepConfig,
}

impl OcrPreprocessor {
    pub fn new(config: OcrPrepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcrPrepConfig {
        &self.config
    }

    /// Primary path only; this is what the recognizer consumes.
    #[instrument(skip_all, fields(width = board.width(), height = board.height()))]
    pub fn prepare(&self, board: &BoardImage) -> Result<BinaryMask> {
        check_size(board)?;
        let primary = self.primary(board, &mut StageLog::disabled());
        info!(ink = primary.binary.count_set(), "OCR preparation complete");
        Ok(primary.binary)
    }

    /// Primary path plus the trace/component diagnostics, every buffer
    /// recorded in execution order.
    #[instrument(skip_all, fields(run = %RunId::new(), width = board.width(), height = board.height()))]
    pub fn prepare_with_stages(&self, board: &BoardImage) -> Result<OcrPrepared> {
        check_size(board)?;
        let cfg = &self.config;
        let mut log = StageLog::enabled();
        let primary = self.primary(board, &mut log);

        // Diagnostics: edges and color-based component suppression.
        let edges = BinaryMask::from_gray_nonzero(&canny(
            &primary.smoothed,
            cfg.canny_low,
            cfg.canny_high,
        ));
        log.record_mask(OCR_STAGE_LABELS[11], "Gradient edges of the smoothed image", &edges);

        let trace_kernel = Kernel::square(cfg.trace_dilate_kernel);
        let trace_enhanced = erode(
            &dilate(&edges, trace_kernel, cfg.trace_dilate_iterations),
            trace_kernel,
            cfg.trace_erode_iterations,
        );
        log.record_mask(OCR_STAGE_LABELS[12], "Edges thickened and joined", &trace_enhanced);

        let components = if board.has_color() {
            ComponentDetector::for_ocr(cfg).detect(board.rgb()).mask
        } else {
            BinaryMask::new(board.width(), board.height())
        };
        log.record_mask(OCR_STAGE_LABELS[13], "Component body colors, cleaned", &components);

        let suppressed = if board.has_color() {
            let region = dilate(
                &components,
                Kernel::square(cfg.inpaint_mask_dilate_kernel),
                cfg.inpaint_mask_dilate_iterations,
            );
            imageops::grayscale(&telea(board.rgb(), &region, cfg.inpaint_radius))
        } else {
            board.gray().clone()
        };
        log.record_gray(OCR_STAGE_LABELS[14], "Components filled from the board around them", &suppressed);

        let (suppressed_otsu, _) = otsu(&suppressed, Polarity::Normal);
        let trace_mask = trace_enhanced.union(&suppressed_otsu);
        log.record_mask(OCR_STAGE_LABELS[15], "Traces on the component-free board", &trace_mask);

        let overlay = blue_overlay(board.rgb(), &trace_mask, cfg.overlay_alpha);
        log.record_color(OCR_STAGE_LABELS[16], "Traces tinted blue over the board", &overlay);

        let trace_map = GrayImage::from_fn(board.width(), board.height(), |x, y| {
            if trace_mask.is_set(x, y) {
                Luma([0])
            } else {
                *suppressed.get_pixel(x, y)
            }
        });
        log.record_gray(OCR_STAGE_LABELS[17], "Suppressed board with traces in black", &trace_map);

        let (_, otsu_level) = otsu(&primary.smoothed, Polarity::Normal);
        info!(stages = log.len(), "OCR preparation with diagnostics complete");
        Ok(OcrPrepared {
            binary: primary.binary,
            otsu_level,
            trace_map,
            stages: log.into_stages(),
        })
    }

    fn primary(&self, board: &BoardImage, log: &mut StageLog) -> Primary {
        let cfg = &self.config;
        log.record_color(OCR_STAGE_LABELS[0], "Board photo as received", board.rgb());
        let gray = board.gray();
        log.record_gray(OCR_STAGE_LABELS[1], "Single-channel luma", gray);

        let denoised = bilateral(
            gray,
            cfg.bilateral_diameter,
            cfg.bilateral_sigma_color,
            cfg.bilateral_sigma_space,
        );
        log.record_gray(OCR_STAGE_LABELS[2], "Edge-preserving bilateral filter", &denoised);

        let sharpened = unsharp(&denoised, cfg.unsharp_sigma, cfg.unsharp_amount);
        log.record_gray(OCR_STAGE_LABELS[3], "Unsharp mask on glyph edges", &sharpened);

        let enhanced = clahe(&sharpened, cfg.clahe_clip_limit, cfg.clahe_tiles);
        log.record_gray(OCR_STAGE_LABELS[4], "Contrast-limited local equalization", &enhanced);

        let smoothed = gaussian_blur_sized(&enhanced, cfg.smooth_kernel, Border::Reflect101);
        log.record_gray(OCR_STAGE_LABELS[5], "Light smoothing before binarization", &smoothed);

        let adaptive = adaptive_threshold(&smoothed, &cfg.adaptive, Polarity::Normal);
        log.record_mask(OCR_STAGE_LABELS[6], "Local threshold, text dark on light", &adaptive);

        if log.is_enabled() {
            let (otsu_mask, level) = otsu(&smoothed, Polarity::Normal);
            debug!(level, "Diagnostic Otsu level");
            log.record_mask(OCR_STAGE_LABELS[7], "Global Otsu threshold for comparison", &otsu_mask);
        }

        let stroke = Kernel::square(cfg.stroke_kernel);
        let dilated = dilate(&adaptive, stroke, 1);
        log.record_mask(OCR_STAGE_LABELS[8], "Strokes thickened", &dilated);
        let eroded = erode(&dilated, stroke, 1);
        log.record_mask(OCR_STAGE_LABELS[9], "Strokes trimmed back", &eroded);
        let binary = open(&close(&eroded, stroke), stroke);
        log.record_mask(OCR_STAGE_LABELS[10], "Close then open to drop speckle", &binary);

        Primary { smoothed, binary }
    }
}

fn check_size(board: &BoardImage) -> Result<()> {
    let (w, h) = board.dimensions();
    if w < MIN_SIDE || h < MIN_SIDE {
        return Err(PcbError::stage(
            Branch::Ocr,
            "prepare",
            format!("image is {w}x{h}; OCR preparation needs at least {MIN_SIDE}x{MIN_SIDE}"),
        ));
    }
    Ok(())
}

/// `(1 - alpha) * img + alpha * blue * mask`, truncated per channel.
fn blue_overlay(rgb: &RgbImage, mask: &BinaryMask, alpha: f32) -> RgbImage {
    RgbImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let tint = if mask.is_set(x, y) { 255.0 * alpha } else { 0.0 };
        let keep = 1.0 - alpha;
        Rgb([
            (r as f32 * keep) as u8,
            (g as f32 * keep) as u8,
            (b as f32 * keep + tint).min(255.0) as u8,
        ])
    })
}
