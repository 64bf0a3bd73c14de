// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pcbscope.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Independent processing branch of a board analysis.
///
/// Branches share nothing but the decoded input, so a failure in one never
/// invalidates the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    /// Trace isolation, component suppression, and overlay rendering.
    Trace,
    /// OCR-tuned binarization and text recognition.
    Ocr,
    /// Blur / exposure / motion scoring.
    Quality,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Trace => "trace",
            Self::Ocr => "ocr",
            Self::Quality => "quality",
        })
    }
}

/// Top-level error type for all pcbscope operations.
#[derive(Debug, Error)]
pub enum PcbError {
    // -- Input / output --
    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("image encode failed: {0}")]
    Encode(String),

    #[error("invalid input image: {0}")]
    InvalidImage(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Processing --
    #[error("{branch} branch failed at stage '{stage}': {detail}")]
    Stage {
        branch: Branch,
        stage: &'static str,
        detail: String,
    },

    #[error("{branch} branch unavailable: {dependency} is not available")]
    DependencyUnavailable {
        branch: Branch,
        dependency: String,
    },

    #[error("OCR failed: {0}")]
    Ocr(String),

    // -- Plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PcbError {
    /// Convenience constructor for a mid-branch processing failure.
    pub fn stage(branch: Branch, stage: &'static str, detail: impl Into<String>) -> Self {
        Self::Stage {
            branch,
            stage,
            detail: detail.into(),
        }
    }

    /// The branch this error is scoped to, if it is branch-local.
    pub fn branch(&self) -> Option<Branch> {
        match self {
            Self::Stage { branch, .. } | Self::DependencyUnavailable { branch, .. } => {
                Some(*branch)
            }
            Self::Ocr(_) => Some(Branch::Ocr),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PcbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_names_branch_and_stage() {
        let err = PcbError::stage(Branch::Trace, "preprocess", "image has zero area");
        assert_eq!(
            err.to_string(),
            "trace branch failed at stage 'preprocess': image has zero area"
        );
        assert_eq!(err.branch(), Some(Branch::Trace));
    }

    #[test]
    fn decode_error_is_not_branch_scoped() {
        assert_eq!(PcbError::Decode("truncated".into()).branch(), None);
    }
}
