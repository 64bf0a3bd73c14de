// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pcbscope-text — Everything downstream of the binarized OCR image: the
// recognizer interface, token filtering, reference designator matching and
// board-ID extraction.

pub mod board_id;
pub mod designators;
#[cfg(feature = "ocr")]
pub mod ocrs_engine;
pub mod recognizer;
pub mod tokens;

pub use board_id::{BoardId, extract_board_id};
pub use designators::{Designator, DesignatorMatcher, MatchReport, parse_designator};
#[cfg(feature = "ocr")]
pub use ocrs_engine::{OcrsConfig, OcrsRecognizer};
pub use recognizer::{
    OcrMode, RawDetection, RecognitionResult, TextRecognizer, UnavailableRecognizer, recognize,
};
pub use tokens::normalize_tokens;
