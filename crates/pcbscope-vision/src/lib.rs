// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pcbscope-vision — Raster pipeline for PCB photos: shared kernels, trace
// isolation and overlay, OCR preparation, frame-quality scoring, and
// diagnostic stage recording.

pub mod kernels;
pub mod ocr_prep;
pub mod quality;
pub mod raster;
pub mod report;
pub mod stages;
pub mod trace;

pub use kernels::BinaryMask;
pub use ocr_prep::{OCR_STAGE_LABELS, OcrPrepared, OcrPreprocessor};
pub use quality::{QualityAnalyzer, QualityOutcome};
pub use raster::BoardImage;
pub use report::{Capabilities, MethodStats, TraceAnalysis, capabilities};
pub use stages::{ProcessingStage, StageImage, StageLog, StagePayload, encode_stages};
pub use trace::{TRACE_STAGE_LABELS, TraceEnhancer, TraceOutcome};
