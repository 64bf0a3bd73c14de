// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ocrs`-backed text recognizer.
//
// Only compiled with the `ocr` feature. The engine needs the two `.rten`
// model files (`text-detection.rten`, `text-recognition.rten`); `ocrs-cli`
// downloads them to `$XDG_CACHE_HOME/ocrs` on first use.
//
// `ocrs` does not score its output, so every word is reported with native
// confidence 100.

use std::path::{Path, PathBuf};

use image::GrayImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use pcbscope_core::error::{PcbError, Result};
use pcbscope_core::types::BoundingBox;
use rten::Model;
use tracing::{debug, info, instrument};

use crate::recognizer::{RawDetection, TextRecognizer};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, else `~/.cache/ocrs`, else `./ocrs-models`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Model locations and the character whitelist for [`OcrsRecognizer`].
#[derive(Debug, Clone)]
pub struct OcrsConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
    /// Characters the recognizer may emit; empty means unrestricted.
    pub allowed_chars: String,
}

impl Default for OcrsConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrsConfig {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
            allowed_chars: String::new(),
        }
    }

    pub fn with_allowed_chars(mut self, allowed: impl Into<String>) -> Self {
        self.allowed_chars = allowed.into();
        self
    }

    /// Both model files must exist. A missing model is a dependency problem,
    /// so callers can fall back to [`crate::UnavailableRecognizer`].
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(PcbError::DependencyUnavailable {
                    branch: pcbscope_core::Branch::Ocr,
                    dependency: format!("OCR model {}", path.display()),
                });
            }
        }
        Ok(())
    }

    pub fn models_available(&self) -> bool {
        self.validate().is_ok()
    }
}

pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load both models and build the engine. Keep the recognizer around;
    /// model loading dominates the cost of a single image.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: &OcrsConfig) -> Result<Self> {
        config.validate()?;

        let load = |path: &Path, what: &str| {
            Model::load_file(path).map_err(|err| {
                PcbError::Ocr(format!(
                    "failed to load {what} model from {}: {err}",
                    path.display()
                ))
            })
        };
        let detection_model = load(&config.detection_model_path, "detection")?;
        let recognition_model = load(&config.recognition_model_path, "recognition")?;

        let allowed_chars =
            (!config.allowed_chars.is_empty()).then(|| config.allowed_chars.clone());
        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            allowed_chars,
            ..Default::default()
        })
        .map_err(|err| PcbError::Ocr(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn name(&self) -> &str {
        "ocrs"
    }

    #[instrument(skip_all, fields(width = binary.width(), height = binary.height()))]
    fn recognize(&self, binary: &GrayImage) -> Result<Vec<RawDetection>> {
        let (width, height) = binary.dimensions();
        let source = ImageSource::from_bytes(binary.as_raw(), (width, height)).map_err(|err| {
            PcbError::Ocr(format!("failed to create image source ({width}x{height}): {err}"))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| PcbError::Ocr(format!("OCR preprocessing failed: {err}")))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| PcbError::Ocr(format!("word detection failed: {err}")))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        debug!(words = word_rects.len(), lines = line_rects.len(), "Text layout found");

        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| PcbError::Ocr(format!("line recognition failed: {err}")))?;

        let mut detections = Vec::new();
        for word in lines.iter().flatten().flat_map(|line| line.words()) {
            let text = word.to_string();
            if text.trim().is_empty() {
                continue;
            }
            let rect = word.bounding_rect();
            detections.push(RawDetection {
                text,
                confidence: 100,
                bounding_box: BoundingBox::new(
                    rect.left().max(0) as u32,
                    rect.top().max(0) as u32,
                    rect.width().max(0) as u32,
                    rect.height().max(0) as u32,
                ),
            });
        }
        Ok(detections)
    }
}
