//! The Validator
//!
//! Score weights are fixed so results are reproducible:
//!
//! ```text
//! score = 0.40 * syntax       (1 when no error-level syntax issue, else 0)
//!       + 0.35 * completeness (structural bonus normalised to [0, 1])
//!       + 0.25 * efficiency   (clamped to [0, 1] for scoring only)
//! ```

use crate::issue::{IssueKind, Severity, ValidationIssue};
use crate::quality::{word_similarity, QualityMetrics, RoundTrip, TranslationQuality};
use molt_config::{ConfigError, MoltConfig};
use molt_core::{
    canonical_subtype, confidence, round2, word_count, Completeness, ParseError, Token,
    TokenCatalog, TokenLexer, TokenSequence, Translate,
};
use std::sync::Arc;

const SYNTAX_WEIGHT: f64 = 0.4;
const COMPLETENESS_WEIGHT: f64 = 0.35;
const EFFICIENCY_WEIGHT: f64 = 0.25;

/// Result of a syntax check
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxCheck {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    /// Tokens that parsed and are in the catalog, canonicalised
    pub sequence: TokenSequence,
    /// Bracket tokens found, including the ones rejected above
    pub token_count: usize,
}

/// Result of a semantic check
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticCheck {
    pub token_efficiency: f64,
    pub confidence: f64,
    pub completeness: Completeness,
    pub issues: Vec<ValidationIssue>,
}

/// Checks token strings for syntax, catalog membership and quality
#[derive(Debug)]
pub struct Validator {
    config: MoltConfig,
    catalog: Arc<TokenCatalog>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(MoltConfig::default(), Arc::new(TokenCatalog::builtin()))
    }
}

impl Validator {
    pub fn new(config: MoltConfig, catalog: Arc<TokenCatalog>) -> Self {
        Self { config, catalog }
    }

    /// Validator whose catalog includes the configured custom tokens
    pub fn from_config(config: MoltConfig) -> Result<Self, ConfigError> {
        let catalog = config.catalog_registry()?.snapshot();
        Ok(Self::new(config, catalog))
    }

    pub fn catalog(&self) -> &Arc<TokenCatalog> {
        &self.catalog
    }

    /// Check bracket balance, token shape, category and subtype
    ///
    /// Unbalanced brackets stop the check with a single error. Otherwise every
    /// token is checked on its own, so one bad token does not hide the rest.
    /// Case that differs from `CATEGORY:subtype` is only a warning.
    pub fn check_syntax(&self, tokens: &str) -> SyntaxCheck {
        let mut issues = Vec::new();
        let mut sequence = TokenSequence::new();

        let raw_tokens = match TokenLexer::new(tokens).tokenize_all() {
            Ok(raw_tokens) => raw_tokens,
            Err(e) => {
                issues.push(parse_issue(&e));
                return SyntaxCheck::finish(issues, sequence, 0);
            }
        };

        for (index, raw) in raw_tokens.iter().enumerate() {
            let shape = match raw.shape() {
                Ok(shape) => shape,
                Err(e) => {
                    issues.push(parse_issue(&e).at(index));
                    continue;
                }
            };
            let Some(category) = shape.category() else {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::UnknownCategory,
                        format!("Unknown category '{}' in {}", shape.category_text, raw.text()),
                    )
                    .at(index),
                );
                continue;
            };
            let subtype = match canonical_subtype(shape.subtype_text) {
                Ok(subtype) => subtype,
                Err(e) => {
                    issues.push(
                        ValidationIssue::new(IssueKind::MalformedToken, e.to_string()).at(index),
                    );
                    continue;
                }
            };

            if !shape.is_canonical_case() {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::NonCanonicalCase,
                        format!("{} should be written [{}:{}]", raw.text(), category, subtype),
                    )
                    .at(index),
                );
            }

            if !self.catalog.contains(category, &subtype) {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::UnknownSubtype,
                        format!("Unknown subtype '{}' in category {}", subtype, category),
                    )
                    .at(index),
                );
                continue;
            }

            let token = Token::new(category, subtype);
            match shape.value {
                Some(value) => match token.with_value(value) {
                    Ok(token) => {
                        sequence.push(token);
                    }
                    Err(e) => issues.push(
                        ValidationIssue::new(IssueKind::MalformedToken, e.to_string()).at(index),
                    ),
                },
                None => {
                    sequence.push(token);
                }
            }
        }

        SyntaxCheck::finish(issues, sequence, raw_tokens.len())
    }

    /// Whether `tokens` passes the syntax check
    pub fn is_well_formed(&self, tokens: &str) -> bool {
        self.check_syntax(tokens).is_valid
    }

    /// Efficiency, confidence and structure of `tokens` against `original`
    pub fn check_semantics(&self, original: &str, tokens: &str) -> SemanticCheck {
        self.semantics(original, &self.check_syntax(tokens))
    }

    /// Efficiency counts every bracket token in the candidate; completeness
    /// and confidence only the ones the catalog accepted
    fn semantics(&self, original: &str, syntax: &SyntaxCheck) -> SemanticCheck {
        let mut issues = Vec::new();
        let completeness = Completeness::of(&syntax.sequence);
        let words = word_count(original);
        let token_efficiency = if syntax.token_count == 0 || words == 0 {
            0.0
        } else {
            1.0 - syntax.token_count as f64 / words as f64
        };
        let confidence = confidence(&syntax.sequence);

        if !completeness.has_operation {
            issues.push(ValidationIssue::new(
                IssueKind::MissingOperation,
                "No operation token present",
            ));
        }
        if token_efficiency < self.config.min_token_efficiency {
            issues.push(ValidationIssue::new(
                IssueKind::LowEfficiency,
                format!(
                    "Token efficiency {:.0}% below minimum {:.0}%",
                    token_efficiency * 100.0,
                    self.config.min_token_efficiency * 100.0
                ),
            ));
        }
        if confidence < self.config.confidence_threshold {
            issues.push(ValidationIssue::new(
                IssueKind::LowConfidence,
                format!(
                    "Confidence {:.2} below threshold {:.2}",
                    confidence, self.config.confidence_threshold
                ),
            ));
        }

        SemanticCheck {
            token_efficiency,
            confidence,
            completeness,
            issues,
        }
    }

    /// Full validation of a candidate token string for `original`
    pub fn validate(&self, original: &str, tokens: &str) -> TranslationQuality {
        let syntax = self.check_syntax(tokens);
        let semantics = self.semantics(original, &syntax);

        let syntax_score = if syntax.is_valid { 1.0 } else { 0.0 };
        let score = round2(
            SYNTAX_WEIGHT * syntax_score
                + COMPLETENESS_WEIGHT * semantics.completeness.ratio()
                + EFFICIENCY_WEIGHT * semantics.token_efficiency.clamp(0.0, 1.0),
        );

        let mut issues = syntax.issues;
        issues.extend(semantics.issues);
        let is_valid = !issues.iter().any(ValidationIssue::is_error);

        tracing::debug!(issues = issues.len(), is_valid, score, "validated translation");

        TranslationQuality {
            is_valid,
            score,
            token_efficiency: semantics.token_efficiency,
            confidence: semantics.confidence,
            issues,
            metrics: QualityMetrics {
                original_words: word_count(original),
                token_count: syntax.token_count,
                roundtrip: None,
            },
        }
    }

    /// Translate `text` to tokens and back, then validate the tokens
    ///
    /// Similarity is reported as a metric. It never makes the result invalid;
    /// a drift issue is info, or a warning below the configured floor.
    pub fn validate_roundtrip<T: Translate + ?Sized>(
        &self,
        text: &str,
        translator: &T,
    ) -> molt_core::Result<TranslationQuality> {
        let forward = translator.translate_to_tokens(text)?;
        let back = translator.translate_from_tokens(&forward.text)?;
        let similarity = word_similarity(text, &back.text);

        let mut quality = self.validate(text, &forward.text);
        if similarity < 1.0 {
            let issue = ValidationIssue::new(
                IssueKind::RoundTripDrift,
                format!("Round-trip similarity {:.2}", similarity),
            );
            let issue = if similarity < self.config.roundtrip_warn_below {
                issue.with_severity(Severity::Warning)
            } else {
                issue
            };
            quality.issues.push(issue);
        }
        quality.metrics.roundtrip = Some(RoundTrip {
            tokens: forward.text,
            reconstructed: back.text,
            similarity,
        });

        tracing::debug!(similarity, "round trip validated");
        Ok(quality)
    }
}

impl SyntaxCheck {
    fn finish(issues: Vec<ValidationIssue>, sequence: TokenSequence, token_count: usize) -> Self {
        let is_valid = !issues.iter().any(ValidationIssue::is_error);
        if !issues.is_empty() {
            tracing::debug!(issues = issues.len(), is_valid, "syntax issues");
        }
        Self {
            is_valid,
            issues,
            sequence,
            token_count,
        }
    }
}

fn parse_issue(error: &ParseError) -> ValidationIssue {
    let kind = match error {
        ParseError::UnbalancedBrackets { .. } => IssueKind::UnbalancedBrackets,
        ParseError::MalformedToken { .. } => IssueKind::MalformedToken,
        ParseError::UnknownCategory { .. } => IssueKind::UnknownCategory,
    };
    ValidationIssue::new(kind, error.to_string())
}
