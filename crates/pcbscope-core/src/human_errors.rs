// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Caller-facing error dispositions.
//
// Every processing error is mapped to a plain summary plus a decision hint:
// resubmit with a different image, fix the deployment, or surface to the
// end user. The pipeline itself never retries.

use crate::error::{Branch, PcbError};

/// Severity of an error from the caller's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The input image is the problem; a different photo may succeed.
    BadInput,
    /// Only one branch is affected; other results are still usable.
    Degraded,
    /// Deployment or configuration issue; resubmitting will not help.
    Permanent,
}

/// A caller-facing description of a failure with a suggested action.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary suitable for an API error body.
    pub message: String,
    /// What the caller (or end user) should try next.
    pub suggestion: String,
    /// Whether resubmitting with a new image is a sensible reaction.
    pub retry_with_new_input: bool,
    /// Severity level.
    pub severity: Severity,
    /// Branch the failure is scoped to, when it is branch-local.
    pub branch: Option<Branch>,
}

/// Convert a `PcbError` into a `HumanError`.
pub fn humanize_error(err: &PcbError) -> HumanError {
    let branch = err.branch();
    match err {
        PcbError::Decode(detail) => HumanError {
            message: "The uploaded file could not be read as an image.".into(),
            suggestion: format!("Upload a JPEG, PNG, or similar photo of the board. ({detail})"),
            retry_with_new_input: true,
            severity: Severity::BadInput,
            branch,
        },

        PcbError::InvalidImage(detail) => HumanError {
            message: "The image is not usable for board analysis.".into(),
            suggestion: format!("Take a new photo that shows the whole board. ({detail})"),
            retry_with_new_input: true,
            severity: Severity::BadInput,
            branch,
        },

        PcbError::Encode(detail) => HumanError {
            message: "The result image could not be encoded.".into(),
            suggestion: format!("Report this as a server problem. ({detail})"),
            retry_with_new_input: false,
            severity: Severity::Permanent,
            branch,
        },

        PcbError::InvalidConfig(detail) => HumanError {
            message: "The analysis pipeline is misconfigured.".into(),
            suggestion: format!("Fix the pipeline configuration and restart. ({detail})"),
            retry_with_new_input: false,
            severity: Severity::Permanent,
            branch,
        },

        PcbError::Stage { stage, detail, .. } => HumanError {
            message: format!("Processing stopped at the '{stage}' step."),
            suggestion: format!(
                "Try a sharper, evenly lit photo; other results may still be available. ({detail})"
            ),
            retry_with_new_input: true,
            severity: Severity::Degraded,
            branch,
        },

        PcbError::DependencyUnavailable { dependency, .. } => HumanError {
            message: format!("{dependency} is not installed on this server."),
            suggestion: "Results from the other analysis steps are still valid.".into(),
            retry_with_new_input: false,
            severity: Severity::Degraded,
            branch,
        },

        PcbError::Ocr(detail) => humanize_ocr_error(detail),

        PcbError::Io(err) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check the path and permissions. ({err})"),
            retry_with_new_input: false,
            severity: Severity::Permanent,
            branch,
        },

        PcbError::Serialization(err) => HumanError {
            message: "A configuration or report file is malformed.".into(),
            suggestion: format!("Check the JSON syntax. ({err})"),
            retry_with_new_input: false,
            severity: Severity::Permanent,
            branch,
        },
    }
}

/// OCR failures split into "models missing" (deployment) and everything else.
fn humanize_ocr_error(detail: &str) -> HumanError {
    let lower = detail.to_lowercase();
    if lower.contains("model not found") || lower.contains("failed to load") {
        HumanError {
            message: "The text recognition models are missing.".into(),
            suggestion: format!("Install the OCR model files on the server. ({detail})"),
            retry_with_new_input: false,
            severity: Severity::Permanent,
            branch: Some(Branch::Ocr),
        }
    } else {
        HumanError {
            message: "Text on the board could not be read.".into(),
            suggestion: format!("Try a closer photo of the labels. ({detail})"),
            retry_with_new_input: true,
            severity: Severity::Degraded,
            branch: Some(Branch::Ocr),
        }
    }
}
