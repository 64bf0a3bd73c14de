// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pcbscope — Core types, color tables, configuration and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod palette;
pub mod types;

pub use config::PipelineConfig;
pub use error::{Branch, PcbError};
pub use types::*;
