//! Fallback Rule Engine
//!
//! Fills in tokens the wording implies but no cue stated. Rules only ever
//! insert, and each checks for its own output first, so applying the engine
//! twice gives the same sequence as applying it once.
//!
//! | Rule      | Trigger                                  | Insertion             |
//! |-----------|------------------------------------------|-----------------------|
//! | Caution   | safe, careful, graceful, handle          | `CTL:try` + `CTL:catch` |
//! | Assurance | ensure, guarantee, verify                | `OP:validate`         |
//! | Question  | ends in `?` with no operation            | `OP:search`           |

use lazy_static::lazy_static;
use molt_core::{Category, Token, TokenSequence};
use regex::Regex;

lazy_static! {
    static ref CAUTION: Regex = Regex::new(
        r"\b(?:safe|safely|safety|careful|carefully|graceful|gracefully|handle|handles|handling)\b"
    ).unwrap();

    static ref ASSURANCE: Regex = Regex::new(
        r"\b(?:ensure|ensures|guarantee|guarantees|verify|verifies)\b"
    ).unwrap();

    /// "ensure it returns JSON" names a return type, not a check
    static ref ENSURE_RETURNS: Regex = Regex::new(
        r"\bensure\s+(?:that\s+)?(?:it\s+)?returns?\b"
    ).unwrap();
}

/// A rule that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackRule {
    Caution,
    Assurance,
    Question,
}

/// Applies the fallback rules in order
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackEngine;

impl FallbackEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply every rule to `sequence`, returning the ones that inserted
    pub fn apply(&self, text: &str, sequence: &mut TokenSequence) -> Vec<FallbackRule> {
        let lower = text.to_lowercase();
        let mut fired = Vec::new();

        if CAUTION.is_match(&lower) && !sequence.contains(Category::ControlFlow, "try") {
            sequence.insert(0, Token::new(Category::ControlFlow, "try"));
            if !sequence.contains(Category::ControlFlow, "catch") {
                let at = sequence
                    .first_of(Category::ErrorHandling)
                    .unwrap_or(sequence.len());
                sequence.insert(at, Token::new(Category::ControlFlow, "catch"));
            }
            fired.push(FallbackRule::Caution);
        }

        if ASSURANCE.is_match(&lower)
            && !ENSURE_RETURNS.is_match(&lower)
            && !sequence.contains(Category::Operation, "validate")
        {
            sequence.push(Token::new(Category::Operation, "validate"));
            fired.push(FallbackRule::Assurance);
        }

        if text.trim_end().ends_with('?') && !sequence.has_category(Category::Operation) {
            let at = operation_segment_start(sequence);
            sequence.insert(at, Token::new(Category::Operation, "search"));
            fired.push(FallbackRule::Question);
        }

        for rule in &fired {
            tracing::debug!(?rule, "fallback rule applied");
        }
        fired
    }
}

/// Index just past the leading try, modifiers and branch/loop tokens
fn operation_segment_start(sequence: &TokenSequence) -> usize {
    sequence
        .iter()
        .position(|token| {
            let leading = match token.category() {
                Category::ControlFlow => !matches!(token.subtype(), "catch" | "finally"),
                Category::Modifier => token.subtype() != "cached",
                Category::Operation
                | Category::Source
                | Category::Parameter
                | Category::ReturnType
                | Category::TypeConstraint
                | Category::ErrorHandling => false,
            };
            !leading
        })
        .unwrap_or(sequence.len())
}
