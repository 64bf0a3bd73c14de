// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types shared by the vision and text crates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one pipeline invocation, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned bounding box in image pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Normalized frame-quality scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Laplacian-variance sharpness, normalized and clamped.
    pub blur_score: f64,
    /// Heuristic placeholder: `max(0.5, blur_score)`. This is not a
    /// directional motion-blur measurement.
    pub motion_score: f64,
    /// `1 - |0.5 - mean_brightness|`, peaking at mid-gray.
    pub exposure_quality: f64,
    /// Arithmetic mean of the three scores above.
    pub overall_quality: f64,
}

impl QualityMetrics {
    /// Build metrics from a blur score and mean brightness (both `[0, 1]`).
    ///
    /// Inputs are clamped so every field stays in `[0, 1]` even for
    /// degenerate images.
    pub fn from_scores(blur_score: f64, mean_brightness: f64) -> Self {
        let blur_score = clamp_unit(blur_score);
        let mean_brightness = clamp_unit(mean_brightness);
        let exposure_quality = clamp_unit(1.0 - (0.5 - mean_brightness).abs());
        let motion_score = blur_score.max(0.5);
        let overall_quality = clamp_unit((blur_score + motion_score + exposure_quality) / 3.0);
        Self {
            blur_score,
            motion_score,
            exposure_quality,
            overall_quality,
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One text region reported by the OCR collaborator, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrToken {
    pub text: String,
    /// Confidence in `[0, 1]` (native 0–100 score divided by 100).
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

/// How a reference designator was established.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MatchMethod {
    /// The OCR text itself is a valid designator.
    Direct,
    /// The OCR text was reconciled with an expected designator.
    Fuzzy { ratio: f64 },
}

/// A validated component reference designator found on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMatch {
    /// Canonical designator, e.g. `R120`.
    pub reference_designator: String,
    /// Component family from the prefix table, e.g. `Resistor`.
    pub component_kind: String,
    /// The raw OCR text the designator came from.
    pub marking: String,
    pub confidence: f64,
    pub bounding_box: BoundingBox,
    pub method: MatchMethod,
}
