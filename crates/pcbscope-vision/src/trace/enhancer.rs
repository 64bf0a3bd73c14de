// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trace-visualization branch: preprocess → detect components → synthesize
// traces → (inpaint) → composite.

use image::RgbImage;
use pcbscope_core::config::TraceConfig;
use pcbscope_core::error::Result;
use pcbscope_core::types::RunId;
use tracing::{info, instrument};

use super::components::{ComponentDetection, ComponentDetector};
use super::composite::Compositor;
use super::preprocess::Preprocessor;
use super::synthesize::TraceSynthesizer;
use crate::kernels::inpaint::telea;
use crate::kernels::BinaryMask;
use crate::raster::BoardImage;
use crate::report::{MethodStats, TraceAnalysis};
use crate::stages::{ProcessingStage, StageLog};

/// Stage labels recorded by [`TraceEnhancer::process_with_stages`], in order.
pub const TRACE_STAGE_LABELS: [&str; 10] = [
    "Original (Trace Detection)",
    "Preprocessed (Blur)",
    "Traces (Adaptive Threshold)",
    "Traces (Otsu Threshold)",
    "Traces (Canny Edges)",
    "Component Mask",
    "Traces (Enhanced)",
    "Inpainted (Components Removed)",
    "Traces (Component-Free)",
    "Output (Blue Trace Overlay)",
];

/// Everything the trace branch produced for one board.
#[derive(Debug, Clone)]
pub struct TraceOutcome {
    pub overlay: RgbImage,
    pub traces: BinaryMask,
    pub components: ComponentDetection,
    /// Component-free background; only synthesized when stages are recorded.
    pub inpainted: Option<RgbImage>,
    pub stages: Vec<ProcessingStage>,
}

/// Isolates copper traces and renders them over a dimmed board.
///
/// ```ignore
/// let enhancer = TraceEnhancer::new(config.trace.clone());
/// let outcome = enhancer.process_with_stages(&board)?;
/// assert_eq!(outcome.stages.len(), TRACE_STAGE_LABELS.len());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TraceEnhancer {
    config: TraceConfig,
}

impl TraceEnhancer {
    pub fn new(config: TraceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Overlay only. The inpainted background is not part of the overlay, so
    /// it is skipped here.
    #[instrument(skip_all, fields(width = board.width(), height = board.height()))]
    pub fn process(&self, board: &BoardImage) -> Result<RgbImage> {
        Ok(self.render(board)?.overlay)
    }

    /// Overlay plus the trace and component masks, without stages or
    /// inpainting.
    #[instrument(skip_all, fields(width = board.width(), height = board.height()))]
    pub fn render(&self, board: &BoardImage) -> Result<TraceOutcome> {
        self.run(board, StageLog::disabled(), false)
    }

    /// Full run with every intermediate buffer recorded in execution order.
    #[instrument(skip_all, fields(run = %RunId::new(), width = board.width(), height = board.height()))]
    pub fn process_with_stages(&self, board: &BoardImage) -> Result<TraceOutcome> {
        self.run(board, StageLog::enabled(), true)
    }

    /// Pixel statistics per detection method, without images.
    #[instrument(skip_all, fields(width = board.width(), height = board.height()))]
    pub fn analyze(&self, board: &BoardImage) -> Result<TraceAnalysis> {
        let preprocessor = Preprocessor::new(&self.config);
        let detector = ComponentDetector::for_traces(&self.config);
        let (pre, components) =
            rayon::join(|| preprocessor.run(board.gray()), || detector.detect(board.rgb()));
        let pre = pre?;
        let synthesized = TraceSynthesizer::new(&self.config).synthesize(
            &pre.adaptive,
            &pre.otsu,
            &pre.edges,
            &components.mask,
        );

        Ok(TraceAnalysis {
            width: board.width(),
            height: board.height(),
            total_pixels: board.area(),
            adaptive_threshold: MethodStats::from_mask(&pre.adaptive),
            otsu_threshold: MethodStats::from_mask(&pre.otsu),
            otsu_level: pre.otsu_level,
            canny_edges: MethodStats::from_mask(&pre.edges),
            component_mask: MethodStats::from_mask(&components.mask),
            final_traces: MethodStats::from_mask(&synthesized.traces),
            component_ranges: components.range_counts,
        })
    }

    fn run(&self, board: &BoardImage, mut log: StageLog, inpaint: bool) -> Result<TraceOutcome> {
        let cfg = &self.config;
        log.record_color(
            TRACE_STAGE_LABELS[0],
            "Board photo as received",
            board.rgb(),
        );

        // Candidate thresholds and component segmentation only need the
        // original image, so they run side by side.
        let preprocessor = Preprocessor::new(cfg);
        let detector = ComponentDetector::for_traces(cfg);
        let (pre, components) =
            rayon::join(|| preprocessor.run(board.gray()), || detector.detect(board.rgb()));
        let pre = pre?;

        log.record_gray(TRACE_STAGE_LABELS[1], "Gaussian-smoothed grayscale", &pre.blurred);
        log.record_mask(TRACE_STAGE_LABELS[2], "Local threshold, dark ink set", &pre.adaptive);
        log.record_mask(TRACE_STAGE_LABELS[3], "Global Otsu threshold, dark ink set", &pre.otsu);
        log.record_mask(TRACE_STAGE_LABELS[4], "Gradient edges with hysteresis", &pre.edges);
        log.record_mask(
            TRACE_STAGE_LABELS[5],
            "Pixels matching a component body color, grown by a safety margin",
            &components.mask,
        );

        let synthesizer = TraceSynthesizer::new(cfg);
        let (synthesized, inpainted) = rayon::join(
            || synthesizer.synthesize(&pre.adaptive, &pre.otsu, &pre.edges, &components.mask),
            || inpaint.then(|| telea(board.rgb(), &components.mask, cfg.inpaint_radius)),
        );

        log.record_mask(
            TRACE_STAGE_LABELS[6],
            "Candidates merged, bridged, trimmed and closed",
            &synthesized.enhanced,
        );
        if let Some(clean) = &inpainted {
            log.record_color(
                TRACE_STAGE_LABELS[7],
                "Component footprints filled from the surrounding board",
                clean,
            );
        }
        log.record_mask(
            TRACE_STAGE_LABELS[8],
            "Trace mask with component footprints excluded",
            &synthesized.traces,
        );

        let overlay = Compositor::new(cfg).compose(board.rgb(), &synthesized.traces);
        log.record_color(TRACE_STAGE_LABELS[9], "Traces drawn over the dimmed board", &overlay);

        info!(
            traces = synthesized.traces.count_set(),
            components = components.mask.count_set(),
            stages = log.len(),
            "Trace branch complete"
        );

        debug_assert!(!synthesized.traces.intersects(&components.mask));
        Ok(TraceOutcome {
            overlay,
            traces: synthesized.traces,
            components,
            inpainted,
            stages: log.into_stages(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const BACKGROUND: Rgb<u8> = Rgb([100, 230, 220]);

    /// 400x300 board: cyan background, a 2-px gray trace across the full
    /// width, and a black IC body drawn over the middle of it.
    fn scenario() -> BoardImage {
        let rgb = RgbImage::from_fn(400, 300, |x, y| {
            if (150..250).contains(&x) && (100..200).contains(&y) {
                Rgb([0, 0, 0])
            } else if y == 149 || y == 150 {
                Rgb([101, 101, 101])
            } else {
                BACKGROUND
            }
        });
        BoardImage::from_rgb(rgb).unwrap()
    }

    #[test]
    fn component_mask_covers_the_chip() {
        let outcome = TraceEnhancer::default().process_with_stages(&scenario()).unwrap();
        for (x, y) in [(150, 100), (249, 199), (200, 150), (150, 199)] {
            assert!(outcome.components.mask.is_set(x, y), "({x},{y})");
        }
    }

    #[test]
    fn trace_mask_follows_the_line_outside_the_chip() {
        let outcome = TraceEnhancer::default().process_with_stages(&scenario()).unwrap();
        for x in [20, 60, 100, 300, 340, 380] {
            assert!(
                outcome.traces.is_set(x, 149) || outcome.traces.is_set(x, 150),
                "line missing at x={x}"
            );
        }
        for (x, y) in [(200, 150), (160, 110), (240, 190)] {
            assert!(!outcome.traces.is_set(x, y));
        }
        assert!(!outcome.traces.intersects(&outcome.components.mask));
    }

    #[test]
    fn overlay_shows_blue_line_and_dim_chip() {
        let overlay = TraceEnhancer::default().process(&scenario()).unwrap();
        let line = overlay.get_pixel(60, 149).0;
        assert!(line[2] > 150 && line[0] < 80, "line pixel {line:?}");
        let chip = overlay.get_pixel(200, 120).0;
        assert!(chip[2] < 20, "chip pixel {chip:?}");
        let bg = overlay.get_pixel(30, 40).0;
        for (got, want) in bg.iter().zip([50u8, 115, 110]) {
            assert!(got.abs_diff(want) <= 1, "background {bg:?}");
        }
    }

    #[test]
    fn stage_labels_are_stable_across_runs() {
        let enhancer = TraceEnhancer::default();
        let board = scenario();
        let first: Vec<_> = enhancer
            .process_with_stages(&board)
            .unwrap()
            .stages
            .iter()
            .map(|s| s.label)
            .collect();
        let second: Vec<_> = enhancer
            .process_with_stages(&board)
            .unwrap()
            .stages
            .iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(first, TRACE_STAGE_LABELS.to_vec());
        assert_eq!(first, second);
    }

    #[test]
    fn inpainting_only_touches_the_component_mask() {
        let board = scenario();
        let outcome = TraceEnhancer::default().process_with_stages(&board).unwrap();
        let clean = outcome.inpainted.unwrap();
        let (x, y) = (20, 20);
        assert_eq!(clean.get_pixel(x, y), board.rgb().get_pixel(x, y));
        // Chip interior is replaced by something far from black.
        let fill = clean.get_pixel(200, 120).0;
        assert!(fill.iter().map(|&c| c as u32).sum::<u32>() > 150, "fill {fill:?}");
    }

    #[test]
    fn analysis_counts_every_method() {
        let analysis = TraceEnhancer::default().analyze(&scenario()).unwrap();
        assert_eq!(analysis.total_pixels, 120_000);
        assert!(analysis.component_mask.pixels >= 100 * 100);
        assert!(analysis.final_traces.pixels > 0);
        assert_eq!(analysis.component_ranges.len(), 12);
        assert!(analysis.component_mask.percentage <= 100.0);
    }

    #[test]
    fn tiny_boards_fail_in_preprocess() {
        let board = BoardImage::from_rgb(RgbImage::from_pixel(2, 2, BACKGROUND)).unwrap();
        assert!(TraceEnhancer::default().process(&board).is_err());
    }
}
