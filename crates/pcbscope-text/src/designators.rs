// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reference designator recognition.
//
// A token is a designator when it reads `{1-3 letters}{digits}{optional
// letter}` and the letters are a known prefix. Tokens that fail the direct
// check can still be reconciled with an expected designator (from a BOM or a
// detector) through a similarity ratio that tolerates the usual OCR
// confusions.

use std::sync::LazyLock;

use pcbscope_core::config::TextConfig;
use pcbscope_core::types::{ComponentMatch, MatchMethod, OcrToken};
use difflib::sequencematcher::SequenceMatcher;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

static RE_DESIGNATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{1,3})(\d+)([A-Z]?)$").expect("valid designator regex")
});

/// Known designator prefixes and the component family each denotes.
pub const PREFIXES: [(&str, &str); 16] = [
    ("R", "Resistor"),
    ("C", "Capacitor"),
    ("L", "Inductor"),
    ("U", "IC"),
    ("Q", "Transistor"),
    ("D", "Diode"),
    ("LED", "LED"),
    ("SW", "Switch"),
    ("J", "Connector"),
    ("P", "Connector"),
    ("X", "Crystal"),
    ("Y", "Crystal"),
    ("FB", "Ferrite Bead"),
    ("T", "Transformer"),
    ("M", "Motor"),
    ("TP", "Test Point"),
];

/// For each target character, the characters OCR tends to read in its place.
const CONFUSABLES: [(char, &[char]); 9] = [
    ('0', &['O']),
    ('O', &['0']),
    ('1', &['I', 'L']),
    ('I', &['1', 'L']),
    ('L', &['1', 'I']),
    ('5', &['S']),
    ('S', &['5']),
    ('8', &['B']),
    ('B', &['8']),
];

/// Component family for a designator prefix, if the prefix is known.
pub fn component_kind(prefix: &str) -> Option<&'static str> {
    PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, kind)| *kind)
}

/// A validated reference designator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Designator {
    /// Uppercased, trimmed designator text, e.g. `R120A`.
    pub text: String,
    pub prefix: String,
    pub kind: String,
}

/// Parse `text` as a designator after uppercasing and trimming it.
pub fn parse_designator(text: &str) -> Option<Designator> {
    let upper = text.trim().to_uppercase();
    let prefix = RE_DESIGNATOR.captures(&upper)?.get(1)?.as_str().to_string();
    let kind = component_kind(&prefix)?;
    Some(Designator {
        text: upper,
        prefix,
        kind: kind.to_string(),
    })
}

/// Ratcliff/Obershelp similarity, `2·M / T` where `M` counts the characters
/// in matching blocks and `T` is the combined length. Two empty strings score
/// 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let mut matcher = SequenceMatcher::new(a, b);
    f64::from(matcher.ratio())
}

/// Similarity between an expected designator and OCR text.
///
/// The best of the plain ratio and the ratio after each single confusable
/// substitution applied to the whole OCR text.
pub fn confusable_ratio(expected: &str, ocr_text: &str) -> f64 {
    let expected = expected.trim().to_uppercase();
    let observed = ocr_text.trim().to_uppercase();

    let mut best = similarity(&expected, &observed);
    for (target, alternatives) in CONFUSABLES {
        for &alt in alternatives {
            if !observed.contains(alt) {
                continue;
            }
            let substituted = observed.replace(alt, &target.to_string());
            best = best.max(similarity(&expected, &substituted));
        }
    }
    best
}

/// Matches OCR tokens against the prefix table and an optional list of
/// expected designators.
#[derive(Debug, Clone)]
pub struct DesignatorMatcher {
    candidates: Vec<Designator>,
    threshold: f64,
}

impl Default for DesignatorMatcher {
    fn default() -> Self {
        Self::new(TextConfig::default().fuzzy_threshold)
    }
}

impl DesignatorMatcher {
    /// Matcher with no expected candidates; only direct matches are found.
    pub fn new(threshold: f64) -> Self {
        Self {
            candidates: Vec::new(),
            threshold,
        }
    }

    pub fn from_config(config: &TextConfig) -> Self {
        Self::new(config.fuzzy_threshold)
    }

    /// Add expected designators for fuzzy reconciliation. Entries that are
    /// not valid designators themselves are skipped.
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for candidate in candidates {
            match parse_designator(candidate.as_ref()) {
                Some(d) if !self.candidates.contains(&d) => self.candidates.push(d),
                Some(_) => {}
                None => debug!(candidate = candidate.as_ref(), "Ignoring invalid candidate"),
            }
        }
        self
    }

    pub fn candidates(&self) -> &[Designator] {
        &self.candidates
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Best expected candidate for `text` whose ratio strictly exceeds the
    /// threshold. The first candidate wins a tie.
    pub fn fuzzy(&self, text: &str) -> Option<(&Designator, f64)> {
        let mut best: Option<(&Designator, f64)> = None;
        let mut best_ratio = self.threshold;
        for candidate in &self.candidates {
            let ratio = confusable_ratio(&candidate.text, text);
            if ratio > best_ratio {
                best_ratio = ratio;
                best = Some((candidate, ratio));
            }
        }
        best
    }

    /// Match one token, directly if possible, otherwise fuzzily.
    pub fn match_token(&self, token: &OcrToken) -> Option<ComponentMatch> {
        if let Some(designator) = parse_designator(&token.text) {
            return Some(ComponentMatch {
                reference_designator: designator.text,
                component_kind: designator.kind,
                marking: token.text.clone(),
                confidence: token.confidence,
                bounding_box: token.bounding_box,
                method: MatchMethod::Direct,
            });
        }

        let (designator, ratio) = self.fuzzy(&token.text)?;
        Some(ComponentMatch {
            reference_designator: designator.text.clone(),
            component_kind: designator.kind.clone(),
            marking: token.text.clone(),
            confidence: token.confidence * ratio,
            bounding_box: token.bounding_box,
            method: MatchMethod::Fuzzy { ratio },
        })
    }

    /// Match every token, in order.
    #[instrument(skip_all, fields(tokens = tokens.len(), candidates = self.candidates.len()))]
    pub fn match_tokens(&self, tokens: &[OcrToken]) -> MatchReport {
        let matches: Vec<ComponentMatch> =
            tokens.iter().filter_map(|t| self.match_token(t)).collect();
        let direct = matches
            .iter()
            .filter(|m| m.method == MatchMethod::Direct)
            .count();
        let report = MatchReport {
            fuzzy: matches.len() - direct,
            direct,
            regions_analyzed: tokens.len(),
            matches,
        };
        info!(
            matched = report.matches.len(),
            direct = report.direct,
            fuzzy = report.fuzzy,
            "Designator matching complete"
        );
        report
    }
}

/// Designators found across a set of OCR tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub matches: Vec<ComponentMatch>,
    pub regions_analyzed: usize,
    pub direct: usize,
    pub fuzzy: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcbscope_core::types::BoundingBox;

    fn token(text: &str, confidence: f64) -> OcrToken {
        OcrToken {
            text: text.into(),
            confidence,
            bounding_box: BoundingBox::new(5, 6, 20, 8),
        }
    }

    #[test]
    fn exact_designator_matches_directly() {
        let m = DesignatorMatcher::default()
            .match_token(&token("R120", 0.9))
            .unwrap();
        assert_eq!(m.reference_designator, "R120");
        assert_eq!(m.component_kind, "Resistor");
        assert_eq!(m.method, MatchMethod::Direct);
        assert_eq!(m.confidence, 0.9);
    }

    #[test]
    fn confused_characters_match_fuzzily() {
        let matcher = DesignatorMatcher::default().with_candidates(["R120", "C33"]);
        let m = matcher.match_token(&token("Rl2O", 0.8)).unwrap();
        assert_eq!(m.reference_designator, "R120");
        assert_eq!(m.marking, "Rl2O");
        let MatchMethod::Fuzzy { ratio } = m.method else {
            panic!("expected fuzzy match, got {:?}", m.method);
        };
        assert!(ratio > 0.6);
        assert!(close(m.confidence, 0.8 * ratio));
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-6
    }

    #[test]
    fn similarity_counts_matching_blocks() {
        assert!(close(similarity("C33", "C33.."), 0.75));
        assert!(close(similarity("U17", "U17 IC"), 2.0 / 3.0));
        assert!(close(similarity("R120", "R12O"), 0.75));
        assert!(close(similarity("", ""), 1.0));
        assert!(close(similarity("R1", ""), 0.0));
    }

    #[test]
    fn substitution_beats_plain_ratio() {
        assert!(close(similarity("R120", "RL2O"), 0.5));
        assert!(close(confusable_ratio("R120", "Rl2O"), 0.75));
        assert!(close(confusable_ratio("R120", "R12O"), 1.0));
    }

    #[test]
    fn trailing_noise_still_reconciles() {
        let matcher = DesignatorMatcher::default().with_candidates(["C33"]);
        let m = matcher.match_token(&token("C33..", 0.8)).unwrap();
        assert_eq!(m.reference_designator, "C33");
        assert_eq!(m.component_kind, "Capacitor");
        let MatchMethod::Fuzzy { ratio } = m.method else {
            panic!("expected fuzzy match, got {:?}", m.method);
        };
        assert!(close(ratio, 0.75));
        assert!(close(m.confidence, 0.6));
    }

    #[test]
    fn unknown_prefix_yields_no_match() {
        let matcher = DesignatorMatcher::default().with_candidates(["R120"]);
        assert!(matcher.match_token(&token("XYZ", 0.9)).is_none());
        assert!(parse_designator("XYZ").is_none());
        assert!(parse_designator("ZZ12").is_none());
    }

    #[test]
    fn multi_letter_prefixes_and_suffix() {
        assert_eq!(parse_designator("led1").unwrap().kind, "LED");
        assert_eq!(parse_designator("TP3").unwrap().kind, "Test Point");
        let d = parse_designator(" r120a ").unwrap();
        assert_eq!(d.text, "R120A");
        assert_eq!(d.prefix, "R");
        assert!(parse_designator("R120AB").is_none());
        assert!(parse_designator("R").is_none());
    }

    #[test]
    fn fuzzy_requires_strictly_exceeding_threshold() {
        // One shared character out of four: ratio 0.5.
        let matcher = DesignatorMatcher::new(0.5).with_candidates(["R2"]);
        assert!(matcher.fuzzy("RZ").is_none());
    }

    #[test]
    fn first_candidate_wins_a_tie() {
        let matcher = DesignatorMatcher::default().with_candidates(["R10", "R12"]);
        let (d, ratio) = matcher.fuzzy("R1").unwrap();
        assert_eq!(d.text, "R10");
        assert!(close(ratio, 0.8));
    }

    #[test]
    fn highest_ratio_wins() {
        let matcher = DesignatorMatcher::default().with_candidates(["C12", "C10"]);
        let (d, ratio) = matcher.fuzzy("CX1O").unwrap();
        assert_eq!(d.text, "C10");
        assert!(close(ratio, 6.0 / 7.0));
    }

    #[test]
    fn invalid_and_duplicate_candidates_are_skipped() {
        let matcher = DesignatorMatcher::default().with_candidates(["R1", "r1", "hello"]);
        assert_eq!(matcher.candidates().len(), 1);
    }

    #[test]
    fn report_counts_methods() {
        let matcher = DesignatorMatcher::default().with_candidates(["U17"]);
        let report = matcher.match_tokens(&[
            token("C33", 0.9),
            token("U7", 0.7),
            token("UI7", 0.7),
            token("noise", 0.5),
        ]);
        assert_eq!(report.regions_analyzed, 4);
        assert_eq!(report.direct, 2);
        assert_eq!(report.fuzzy, 1);
        assert_eq!(report.matches[2].reference_designator, "U17");
    }
}
