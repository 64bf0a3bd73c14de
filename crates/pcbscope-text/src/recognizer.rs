// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR collaborator interface.
//
// The pipeline hands a prepared binary image to a `TextRecognizer` and gets
// back raw `{text, 0..=100 confidence, box}` detections. When no engine is
// available the result says so explicitly instead of looking like an image
// with no text on it.

use image::GrayImage;
use pcbscope_core::config::TextConfig;
use pcbscope_core::error::{Branch, PcbError, Result};
use pcbscope_core::types::{BoundingBox, OcrToken};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::tokens::normalize_tokens;

/// One text region as reported by the recognizer, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDetection {
    pub text: String,
    /// Native engine confidence, 0–100.
    pub confidence: i32,
    pub bounding_box: BoundingBox,
}

/// A text recognition backend.
pub trait TextRecognizer: Send + Sync {
    /// Human-readable backend name (e.g. "ocrs").
    fn name(&self) -> &str;

    /// Recognize text in a binarized board image (dark text on white).
    fn recognize(&self, binary: &GrayImage) -> Result<Vec<RawDetection>>;
}

/// Recognizer used when no OCR engine is compiled in or its models are
/// missing. Every call reports `DependencyUnavailable`.
#[derive(Debug, Clone)]
pub struct UnavailableRecognizer {
    dependency: String,
}

impl UnavailableRecognizer {
    pub fn new(dependency: impl Into<String>) -> Self {
        Self {
            dependency: dependency.into(),
        }
    }
}

impl Default for UnavailableRecognizer {
    fn default() -> Self {
        Self::new("OCR engine")
    }
}

impl TextRecognizer for UnavailableRecognizer {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn recognize(&self, _binary: &GrayImage) -> Result<Vec<RawDetection>> {
        warn!(dependency = %self.dependency, "TextRecognizer::recognize called without an OCR engine");
        Err(PcbError::DependencyUnavailable {
            branch: Branch::Ocr,
            dependency: self.dependency.clone(),
        })
    }
}

/// Which path produced a recognition result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum OcrMode {
    /// A real engine ran; an empty token list means no text was found.
    Engine { name: String },
    /// No engine ran; the token list is empty because nothing was looked at.
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub mode: OcrMode,
    /// Tokens that passed length and confidence filtering.
    pub tokens: Vec<OcrToken>,
    /// Raw regions the engine reported, before filtering.
    pub regions_analyzed: usize,
}

impl RecognitionResult {
    pub fn is_fallback(&self) -> bool {
        matches!(self.mode, OcrMode::Fallback { .. })
    }
}

/// Run `recognizer` over `binary` and normalize its output.
///
/// An unavailable engine becomes `OcrMode::Fallback`; any other recognizer
/// failure is returned as an error.
#[instrument(skip_all, fields(engine = recognizer.name(), width = binary.width(), height = binary.height()))]
pub fn recognize(
    recognizer: &dyn TextRecognizer,
    binary: &GrayImage,
    config: &TextConfig,
) -> Result<RecognitionResult> {
    match recognizer.recognize(binary) {
        Ok(raw) => {
            let regions_analyzed = raw.len();
            let tokens = normalize_tokens(raw, config);
            info!(regions_analyzed, kept = tokens.len(), "OCR completed");
            Ok(RecognitionResult {
                mode: OcrMode::Engine {
                    name: recognizer.name().to_string(),
                },
                tokens,
                regions_analyzed,
            })
        }
        Err(err @ PcbError::DependencyUnavailable { .. }) => {
            warn!(%err, "OCR running in fallback mode");
            Ok(RecognitionResult {
                mode: OcrMode::Fallback {
                    reason: err.to_string(),
                },
                tokens: Vec::new(),
                regions_analyzed: 0,
            })
        }
        Err(err) => Err(err),
    }
}
