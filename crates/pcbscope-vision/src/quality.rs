// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame-quality scoring: sharpness, exposure and the motion placeholder.

use image::GrayImage;
use pcbscope_core::config::QualityConfig;
use pcbscope_core::types::QualityMetrics;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Either a full set of scores or an explicit statement that scoring could
/// not run. Never a numeric stand-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum QualityOutcome {
    Available {
        metrics: QualityMetrics,
        width: u32,
        height: u32,
    },
    Unavailable {
        reason: String,
    },
}

impl QualityOutcome {
    pub fn metrics(&self) -> Option<&QualityMetrics> {
        match self {
            QualityOutcome::Available { metrics, .. } => Some(metrics),
            QualityOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, QualityOutcome::Available { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct QualityAnalyzer {
    config: QualityConfig,
}

impl QualityAnalyzer {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Score a grayscale frame.
    ///
    /// `blur = var(laplacian) / blur_normalization`, `exposure = 1 - |0.5 -
    /// mean/255|`, and `motion = max(0.5, blur)`. The motion score is a
    /// heuristic placeholder kept for compatibility with existing consumers;
    /// it does not measure directional blur.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn analyze(&self, gray: &GrayImage) -> QualityOutcome {
        let Some(variance) = laplacian_variance(gray) else {
            warn!("Laplacian backend not compiled in; quality check unavailable");
            return QualityOutcome::Unavailable {
                reason: "quality check unavailable: convolution backend disabled".into(),
            };
        };

        let pixels = gray.as_raw();
        let mean = if pixels.is_empty() {
            0.0
        } else {
            pixels.iter().map(|&v| v as f64).sum::<f64>() / pixels.len() as f64
        };

        let metrics = QualityMetrics::from_scores(
            variance / self.config.blur_normalization,
            mean / 255.0,
        );
        debug!(variance, mean, overall = metrics.overall_quality, "Quality scored");
        QualityOutcome::Available {
            metrics,
            width: gray.width(),
            height: gray.height(),
        }
    }
}

#[cfg(feature = "quality")]
fn laplacian_variance(gray: &GrayImage) -> Option<f64> {
    let response = imageproc::filter::laplacian_filter(gray);
    let values = response.as_raw();
    if values.is_empty() {
        return Some(0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    Some(var)
}

#[cfg(not(feature = "quality"))]
fn laplacian_variance(_gray: &GrayImage) -> Option<f64> {
    None
}


#[cfg(all(test, not(feature = "quality")))]
mod unavailable_tests {
    use super::*;

    #[test]
    fn missing_backend_is_explicit() {
        let outcome = QualityAnalyzer::default().analyze(&GrayImage::new(8, 8));
        assert!(!outcome.is_available());
        assert!(outcome.metrics().is_none());
    }
}
