// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trace module — copper trace isolation and overlay rendering.

pub mod components;
pub mod composite;
pub mod enhancer;
pub mod preprocess;
pub mod synthesize;

pub use components::{ComponentDetection, ComponentDetector, RangeCount};
pub use composite::Compositor;
pub use enhancer::{TRACE_STAGE_LABELS, TraceEnhancer, TraceOutcome};
pub use preprocess::{Preprocessed, Preprocessor};
pub use synthesize::{SynthesizedTraces, TraceSynthesizer};
