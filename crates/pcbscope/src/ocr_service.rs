// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR service — binarize the board, run the recognizer, then match
// designators and look for a board identifier.
//
// The recognizer is chosen once at construction. Without the `ocr` feature,
// or when the models are missing, the service runs in fallback mode and says
// so in every report.

use pcbscope_core::config::{PipelineConfig, TextConfig};
use pcbscope_core::error::Result;
use pcbscope_core::types::OcrToken;
use pcbscope_text::{
    BoardId, DesignatorMatcher, MatchReport, OcrMode, TextRecognizer, UnavailableRecognizer,
    extract_board_id, recognize,
};
use pcbscope_vision::{BoardImage, OcrPreprocessor};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Everything the OCR branch learned about one board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrReport {
    pub mode: OcrMode,
    pub tokens: Vec<OcrToken>,
    pub regions_analyzed: usize,
    pub components: MatchReport,
    pub board_id: Option<BoardId>,
}

pub struct OcrService {
    preprocessor: OcrPreprocessor,
    recognizer: Box<dyn TextRecognizer>,
    matcher: DesignatorMatcher,
    text: TextConfig,
}

impl OcrService {
    pub fn new(config: &PipelineConfig, recognizer: Box<dyn TextRecognizer>) -> Self {
        Self {
            preprocessor: OcrPreprocessor::new(config.ocr_prep.clone()),
            recognizer,
            matcher: DesignatorMatcher::from_config(&config.text),
            text: config.text.clone(),
        }
    }

    /// Service that always reports fallback mode.
    pub fn without_engine(config: &PipelineConfig) -> Self {
        Self::new(config, Box::new(UnavailableRecognizer::default()))
    }

    /// Best recognizer this build can offer: `ocrs` with the cached models
    /// when the `ocr` feature is on and the models load, otherwise fallback.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config, default_recognizer(&config.text))
    }

    /// Expected designators used for fuzzy reconciliation.
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.matcher = self.matcher.with_candidates(candidates);
        self
    }

    pub fn engine_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Prepare, recognize and match. A preparation failure fails the whole
    /// call since recognition has nothing to run on.
    #[instrument(skip_all, fields(engine = self.recognizer.name(), width = board.width(), height = board.height()))]
    pub fn read(&self, board: &BoardImage) -> Result<OcrReport> {
        let binary = self.preprocessor.prepare(board)?;
        let recognized = recognize(self.recognizer.as_ref(), binary.as_gray(), &self.text)?;
        let components = self.matcher.match_tokens(&recognized.tokens);
        let board_id = extract_board_id(&recognized.tokens);
        info!(
            tokens = recognized.tokens.len(),
            designators = components.matches.len(),
            board_id = board_id.as_ref().map(|b| b.id.as_str()),
            "OCR branch complete"
        );
        Ok(OcrReport {
            mode: recognized.mode,
            tokens: recognized.tokens,
            regions_analyzed: recognized.regions_analyzed,
            components,
            board_id,
        })
    }
}

#[cfg(feature = "ocr")]
fn default_recognizer(text: &TextConfig) -> Box<dyn TextRecognizer> {
    use pcbscope_text::{OcrsConfig, OcrsRecognizer};

    let config = OcrsConfig::default().with_allowed_chars(text.char_whitelist.clone());
    match OcrsRecognizer::new(&config) {
        Ok(engine) => Box::new(engine),
        Err(err) => {
            tracing::warn!(%err, "OCR engine unavailable; using fallback recognizer");
            Box::new(UnavailableRecognizer::new(err.to_string()))
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn default_recognizer(_text: &TextConfig) -> Box<dyn TextRecognizer> {
    Box::new(UnavailableRecognizer::new("OCR engine (built without the `ocr` feature)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb, RgbImage};
    use pcbscope_core::types::BoundingBox;
    use pcbscope_text::RawDetection;

    struct ScriptedRecognizer(Vec<(&'static str, i32)>);

    impl TextRecognizer for ScriptedRecognizer {
        fn name(&self) -> &str {
            "scripted"
        }

        fn recognize(&self, _binary: &GrayImage) -> Result<Vec<RawDetection>> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, (text, confidence))| RawDetection {
                    text: (*text).to_string(),
                    confidence: *confidence,
                    bounding_box: BoundingBox::new(i as u32 * 10, 0, 10, 10),
                })
                .collect())
        }
    }

    fn board() -> BoardImage {
        BoardImage::from_rgb(RgbImage::from_pixel(64, 48, Rgb([100, 230, 220]))).unwrap()
    }

    #[test]
    fn fallback_mode_is_explicit() {
        let report = OcrService::without_engine(&PipelineConfig::default())
            .read(&board())
            .unwrap();
        assert!(matches!(report.mode, OcrMode::Fallback { .. }));
        assert!(report.components.matches.is_empty());
        assert!(report.board_id.is_none());
    }

    #[test]
    fn recognized_text_is_matched() {
        let service = OcrService::new(
            &PipelineConfig::default(),
            Box::new(ScriptedRecognizer(vec![
                ("R120", 92),
                ("Rl2O", 85),
                ("MAIN-BOARD", 77),
                ("C", 99),
                ("U7", 30),
            ])),
        )
        .with_candidates(["R120"]);
        let report = service.read(&board()).unwrap();

        assert_eq!(report.regions_analyzed, 5);
        assert_eq!(report.tokens.len(), 3);
        assert_eq!(report.components.direct, 1);
        assert_eq!(report.components.fuzzy, 1);
        assert_eq!(report.board_id.unwrap().id, "MAIN-BOARD");
    }

    #[test]
    fn preparation_failure_fails_the_read() {
        let tiny = BoardImage::from_rgb(RgbImage::new(2, 2)).unwrap();
        let err = OcrService::without_engine(&PipelineConfig::default())
            .read(&tiny)
            .unwrap_err();
        assert_eq!(err.branch(), Some(pcbscope_core::Branch::Ocr));
    }
}
