// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Board analysis — runs the trace, OCR and quality branches side by side on
// one decoded image and reports each branch on its own.
//
// A branch failure stops that branch only. The other branches still report.

use pcbscope_core::config::PipelineConfig;
use pcbscope_core::error::{PcbError, Result};
use pcbscope_core::human_errors::humanize_error;
use pcbscope_core::types::{QualityMetrics, RunId};
use pcbscope_vision::raster::{encode_jpeg_rgb, jpeg_data_uri};
use pcbscope_vision::{BoardImage, MethodStats, QualityAnalyzer, QualityOutcome, TraceEnhancer};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::ocr_service::{OcrReport, OcrService};

/// Outcome of one branch of a board analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum BranchOutcome<T> {
    Completed { result: T },
    /// A collaborator the branch needs is missing.
    Unavailable { reason: String },
    Failed { failure: BranchFailure },
}

impl<T> BranchOutcome<T> {
    pub fn result(&self) -> Option<&T> {
        match self {
            BranchOutcome::Completed { result } => Some(result),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, BranchOutcome::Completed { .. })
    }

    fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(result) => BranchOutcome::Completed { result },
            Err(PcbError::DependencyUnavailable { dependency, .. }) => {
                BranchOutcome::Unavailable {
                    reason: format!("{dependency} is not available"),
                }
            }
            Err(err) => BranchOutcome::Failed {
                failure: BranchFailure::from_error(&err),
            },
        }
    }
}

/// Why a branch stopped, with enough detail to decide on a retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchFailure {
    pub message: String,
    pub suggestion: String,
    pub detail: String,
    pub retry_with_new_input: bool,
}

impl BranchFailure {
    fn from_error(err: &PcbError) -> Self {
        let human = humanize_error(err);
        warn!(branch = ?human.branch, %err, "Branch failed");
        Self {
            message: human.message,
            suggestion: human.suggestion,
            detail: err.to_string(),
            retry_with_new_input: human.retry_with_new_input,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Overlay as a `data:image/jpeg;base64,…` URI.
    pub overlay: String,
    pub traces: MethodStats,
    pub components: MethodStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub metrics: QualityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardReport {
    pub run_id: RunId,
    pub width: u32,
    pub height: u32,
    pub trace: BranchOutcome<TraceSummary>,
    pub ocr: BranchOutcome<OcrReport>,
    pub quality: BranchOutcome<QualitySummary>,
}

/// Runs every branch of a board analysis with one configuration.
pub struct BoardAnalyzer {
    enhancer: TraceEnhancer,
    ocr: OcrService,
    quality: QualityAnalyzer,
    overlay_quality: u8,
}

impl BoardAnalyzer {
    pub fn new(config: &PipelineConfig, ocr: OcrService) -> Self {
        Self {
            enhancer: TraceEnhancer::new(config.trace.clone()),
            ocr,
            quality: QualityAnalyzer::new(config.quality.clone()),
            overlay_quality: config.output.overlay_jpeg_quality,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config, OcrService::from_config(config))
    }

    /// Analyze one board. Never fails as a whole; each branch carries its own
    /// outcome.
    pub fn analyze(&self, board: &BoardImage) -> BoardReport {
        self.analyze_run(RunId::new(), board)
    }

    #[instrument(skip_all, fields(run = %run_id, width = board.width(), height = board.height()))]
    fn analyze_run(&self, run_id: RunId, board: &BoardImage) -> BoardReport {
        let (trace, (ocr, quality)) = rayon::join(
            || self.trace_branch(board),
            || rayon::join(|| self.ocr.read(board), || self.quality_branch(board)),
        );

        let report = BoardReport {
            run_id,
            width: board.width(),
            height: board.height(),
            trace: BranchOutcome::from_result(trace),
            ocr: BranchOutcome::from_result(ocr),
            quality: BranchOutcome::from_result(quality),
        };
        info!(
            trace = report.trace.is_completed(),
            ocr = report.ocr.is_completed(),
            quality = report.quality.is_completed(),
            "Board analysis complete"
        );
        report
    }

    fn trace_branch(&self, board: &BoardImage) -> Result<TraceSummary> {
        let outcome = self.enhancer.render(board)?;
        let jpeg = encode_jpeg_rgb(&outcome.overlay, self.overlay_quality)?;
        Ok(TraceSummary {
            overlay: jpeg_data_uri(&jpeg),
            traces: MethodStats::from_mask(&outcome.traces),
            components: MethodStats::from_mask(&outcome.components.mask),
        })
    }

    fn quality_branch(&self, board: &BoardImage) -> Result<QualitySummary> {
        match self.quality.analyze(board.gray()) {
            QualityOutcome::Available { metrics, .. } => Ok(QualitySummary { metrics }),
            QualityOutcome::Unavailable { reason } => Err(PcbError::DependencyUnavailable {
                branch: pcbscope_core::Branch::Quality,
                dependency: reason,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn analyzer() -> BoardAnalyzer {
        let config = PipelineConfig::default();
        BoardAnalyzer::new(&config, OcrService::without_engine(&config))
    }

    fn board() -> BoardImage {
        BoardImage::from_rgb(RgbImage::from_fn(120, 90, |x, y| {
            if (40..80).contains(&x) && (30..60).contains(&y) {
                Rgb([0, 0, 0])
            } else if y == 45 || y == 46 {
                Rgb([101, 101, 101])
            } else {
                Rgb([100, 230, 220])
            }
        }))
        .unwrap()
    }

    #[test]
    fn every_branch_reports() {
        let report = analyzer().analyze(&board());
        assert_eq!((report.width, report.height), (120, 90));

        let trace = report.trace.result().expect("trace completes");
        assert!(trace.overlay.starts_with("data:image/jpeg;base64,"));
        assert!(trace.traces.pixels > 0);
        assert!(trace.components.pixels >= 40 * 30);

        // No engine: the OCR branch completes in explicit fallback mode.
        let ocr = report.ocr.result().expect("ocr completes");
        assert!(matches!(ocr.mode, pcbscope_text::OcrMode::Fallback { .. }));
    }

    #[test]
    fn failed_branches_do_not_sink_the_others() {
        let tiny = BoardImage::from_rgb(RgbImage::from_pixel(2, 2, Rgb([90, 90, 90]))).unwrap();
        let report = analyzer().analyze(&tiny);

        let BranchOutcome::Failed { failure } = &report.trace else {
            panic!("trace should fail on a 2x2 image: {:?}", report.trace);
        };
        assert!(failure.retry_with_new_input);
        assert!(failure.detail.contains("trace"));
        assert!(matches!(report.ocr, BranchOutcome::Failed { .. }));

        #[cfg(feature = "quality")]
        assert!(report.quality.is_completed());
    }

    #[test]
    fn report_serializes_with_status_tags() {
        let report = analyzer().analyze(&board());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["trace"]["status"], "completed");
        assert!(json["run_id"].is_string());
    }
}
