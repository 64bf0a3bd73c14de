// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Board identifier extraction from OCR tokens.

use std::sync::LazyLock;

use pcbscope_core::types::{BoundingBox, OcrToken};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Board-ID patterns, tried in order against the uppercased token text.
static RE_BOARD_ID: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        // XXXX-XXXX part numbers
        Regex::new(r"([A-Z0-9]{4,}-[A-Z0-9]{4,})").expect("valid part number regex"),
        Regex::new(r"(REV\s*[A-Z0-9]+)").expect("valid revision regex"),
        Regex::new(r"(MODEL\s*[\w-]+)").expect("valid model regex"),
        // XXXXXX-X extended part numbers
        Regex::new(r"([A-Z0-9]{6,}-[A-Z0-9]+)").expect("valid extended part number regex"),
    ]
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardId {
    pub id: String,
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

/// Find the highest-confidence token containing a board identifier.
///
/// Within one token the first matching pattern wins. A later token replaces
/// the current best only with strictly higher confidence, and a token with
/// zero confidence never qualifies.
#[instrument(skip_all, fields(tokens = tokens.len()))]
pub fn extract_board_id(tokens: &[OcrToken]) -> Option<BoardId> {
    let mut best: Option<BoardId> = None;
    let mut best_confidence = 0.0;

    for token in tokens {
        let text = token.text.to_uppercase();
        let Some(id) = RE_BOARD_ID
            .iter()
            .find_map(|re| re.captures(&text).and_then(|c| c.get(1)))
        else {
            continue;
        };
        if token.confidence > best_confidence {
            best_confidence = token.confidence;
            best = Some(BoardId {
                id: id.as_str().to_string(),
                confidence: token.confidence,
                bounding_box: token.bounding_box,
            });
        }
    }

    debug!(found = best.is_some(), "Board ID scan complete");
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, confidence: f64, x: u32) -> OcrToken {
        OcrToken {
            text: text.into(),
            confidence,
            bounding_box: BoundingBox::new(x, 0, 40, 12),
        }
    }

    #[test]
    fn part_number_is_found() {
        let id = extract_board_id(&[token("pn 1234-5678", 0.8, 3)]).unwrap();
        assert_eq!(id.id, "1234-5678");
        assert_eq!(id.bounding_box.x, 3);
    }

    #[test]
    fn revision_and_model_markings() {
        assert_eq!(extract_board_id(&[token("Rev A1", 0.7, 0)]).unwrap().id, "REV A1");
        assert_eq!(
            extract_board_id(&[token("model ESP-32", 0.7, 0)]).unwrap().id,
            "MODEL ESP-32"
        );
    }

    #[test]
    fn extended_part_number() {
        assert_eq!(
            extract_board_id(&[token("ABC123-7", 0.9, 0)]).unwrap().id,
            "ABC123-7"
        );
    }

    #[test]
    fn highest_confidence_wins() {
        let id = extract_board_id(&[
            token("REV B", 0.6, 1),
            token("R120", 0.99, 2),
            token("MAIN-BOARD", 0.9, 3),
            token("REV C", 0.9, 4),
        ])
        .unwrap();
        assert_eq!(id.id, "MAIN-BOARD");
        assert_eq!(id.bounding_box.x, 3);
    }

    #[test]
    fn no_identifier_yields_none() {
        assert!(extract_board_id(&[token("R120", 0.9, 0), token("C33", 0.9, 0)]).is_none());
        assert!(extract_board_id(&[token("REV A", 0.0, 0)]).is_none());
        assert!(extract_board_id(&[]).is_none());
    }
}
