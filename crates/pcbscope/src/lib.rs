// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pcbscope — Board-level analysis over the vision and text crates, plus the
// `pcbscope` command-line front end.

pub mod board;
pub mod ocr_service;

pub use board::{
    BoardAnalyzer, BoardReport, BranchFailure, BranchOutcome, QualitySummary, TraceSummary,
};
pub use ocr_service::{OcrReport, OcrService};
