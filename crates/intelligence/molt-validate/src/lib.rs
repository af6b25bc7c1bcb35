//! # molt-validate
//!
//! Quality checks for MoltLang translations.
//!
//! - **Syntax**: bracket balance, token shape, category and catalog membership.
//!   Case drift is a warning, never a failure.
//! - **Semantics**: efficiency and confidence against configured floors, and
//!   whether an operation is present.
//! - **Round trip**: text to tokens and back, scored by word overlap as a metric.
//!
//! A [`TranslationQuality`] is valid iff none of its issues is an error.

pub mod issue;
pub mod quality;
pub mod validator;

pub use issue::{IssueKind, Severity, ValidationIssue};
pub use quality::{word_similarity, QualityMetrics, RoundTrip, TranslationQuality};
pub use validator::{SemanticCheck, SyntaxCheck, Validator};
