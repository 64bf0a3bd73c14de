// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw detection filtering and confidence normalization.

use pcbscope_core::config::TextConfig;
use pcbscope_core::types::OcrToken;
use tracing::debug;

use crate::recognizer::RawDetection;

/// Trim, filter and normalize raw detections.
///
/// A detection is kept when its trimmed text has at least
/// `min_token_len` characters and its native confidence is strictly above
/// `min_native_confidence`. Kept confidences are divided by 100.
pub fn normalize_tokens(raw: Vec<RawDetection>, config: &TextConfig) -> Vec<OcrToken> {
    let total = raw.len();
    let tokens: Vec<OcrToken> = raw
        .into_iter()
        .filter_map(|det| {
            let text = det.text.trim();
            if text.chars().count() < config.min_token_len
                || det.confidence <= config.min_native_confidence
            {
                return None;
            }
            Some(OcrToken {
                text: text.to_string(),
                confidence: f64::from(det.confidence.clamp(0, 100)) / 100.0,
                bounding_box: det.bounding_box,
            })
        })
        .collect();
    debug!(total, kept = tokens.len(), "OCR tokens filtered");
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcbscope_core::types::BoundingBox;

    fn raw(text: &str, confidence: i32) -> RawDetection {
        RawDetection {
            text: text.into(),
            confidence,
            bounding_box: BoundingBox::default(),
        }
    }

    #[test]
    fn short_and_blank_tokens_are_dropped() {
        let tokens = normalize_tokens(
            vec![raw("U", 95), raw("   ", 95), raw(" U7 ", 95)],
            &TextConfig::default(),
        );
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "U7");
    }

    #[test]
    fn confidence_threshold_is_exclusive() {
        let tokens = normalize_tokens(
            vec![raw("R1", 40), raw("R2", 41)],
            &TextConfig::default(),
        );
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "R2");
        assert!((tokens[0].confidence - 0.41).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let tokens = normalize_tokens(vec![raw("C33", 250)], &TextConfig::default());
        assert_eq!(tokens[0].confidence, 1.0);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let config = TextConfig {
            min_token_len: 3,
            ..TextConfig::default()
        };
        let tokens = normalize_tokens(vec![raw("Ωµ", 90)], &config);
        assert!(tokens.is_empty());
    }
}
