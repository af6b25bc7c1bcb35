//! Quality report and round-trip similarity

use crate::issue::ValidationIssue;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[a-z0-9]+").unwrap();
}

/// Text, tokens and back again
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundTrip {
    pub tokens: String,
    pub reconstructed: String,
    /// Word-overlap similarity in `[0, 1]`
    pub similarity: f64,
}

/// Counts behind a quality report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub original_words: usize,
    pub token_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roundtrip: Option<RoundTrip>,
}

/// Output of a validation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationQuality {
    /// False iff some issue has severity error
    pub is_valid: bool,
    /// Composite score in `[0, 1]`
    pub score: f64,
    /// Unclamped; negative when the tokens outnumber the words
    pub token_efficiency: f64,
    pub confidence: f64,
    pub issues: Vec<ValidationIssue>,
    pub metrics: QualityMetrics,
}

impl std::fmt::Display for TranslationQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.is_valid { "VALID" } else { "INVALID" };
        write!(
            f,
            "{} (score: {:.2}, efficiency: {:.0}%, confidence: {:.2})",
            status,
            self.score,
            self.token_efficiency * 100.0,
            self.confidence
        )
    }
}

fn words(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Jaccard overlap of the two texts' lowercase word sets, rounded to two decimals
///
/// Two empty texts are identical; one empty text shares nothing.
pub fn word_similarity(a: &str, b: &str) -> f64 {
    let a = words(a);
    let b = words(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let shared = a.intersection(&b).count();
    let union = a.union(&b).count();
    molt_core::round2(shared as f64 / union as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity() {
        assert_eq!(word_similarity("Fetch data", "fetch DATA."), 1.0);
        assert_eq!(
            word_similarity(
                "Fetch user data from the API and return JSON",
                "Fetch data from the API as JSON."
            ),
            0.6
        );
        assert_eq!(word_similarity("", ""), 1.0);
        assert_eq!(word_similarity("fetch", ""), 0.0);
    }

    #[test]
    fn test_display() {
        let quality = TranslationQuality {
            is_valid: true,
            score: 0.9167,
            token_efficiency: 0.6667,
            confidence: 0.97,
            issues: Vec::new(),
            metrics: QualityMetrics {
                original_words: 9,
                token_count: 3,
                roundtrip: None,
            },
        };
        assert_eq!(
            quality.to_string(),
            "VALID (score: 0.92, efficiency: 67%, confidence: 0.97)"
        );
    }
}
