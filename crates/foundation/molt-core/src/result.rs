//! Translation output record and the translator seam

use crate::score;
use crate::token::TokenSequence;
use crate::Result;
use serde::Serialize;

/// Output of one forward or reverse translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationResult {
    /// Token string (forward) or reconstructed English (reverse)
    pub text: String,
    pub tokens: TokenSequence,
    pub token_count: usize,
    /// Word count of the English side
    pub original_token_count: usize,
    pub token_efficiency: f64,
    pub confidence: f64,
}

impl TranslationResult {
    /// Assemble a result, deriving count, efficiency and confidence
    pub fn new(text: String, tokens: TokenSequence, english_words: usize) -> Self {
        let token_efficiency = if tokens.is_empty() {
            0.0
        } else {
            score::efficiency(&tokens, english_words)
        };
        Self {
            text,
            token_count: tokens.len(),
            original_token_count: english_words,
            token_efficiency,
            confidence: score::confidence(&tokens),
            tokens,
        }
    }
}

impl std::fmt::Display for TranslationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Bidirectional text/token translation
pub trait Translate {
    /// English text to a token string
    fn translate_to_tokens(&self, text: &str) -> Result<TranslationResult>;

    /// Token string to an English paraphrase
    fn translate_from_tokens(&self, tokens: &str) -> Result<TranslationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::token::Token;

    #[test]
    fn test_empty_sequence_reports_zero() {
        let result = TranslationResult::new(String::new(), TokenSequence::new(), 7);
        assert_eq!(result.token_count, 0);
        assert_eq!(result.token_efficiency, 0.0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_derived_fields() {
        let tokens: TokenSequence = [
            Token::new(Category::Operation, "fetch"),
            Token::new(Category::Source, "api"),
        ]
        .into_iter()
        .collect();
        let result = TranslationResult::new(tokens.to_string(), tokens, 4);
        assert_eq!(result.text, "[OP:fetch][SRC:api]");
        assert_eq!(result.token_count, 2);
        assert_eq!(result.original_token_count, 4);
        assert_eq!(result.token_efficiency, 0.5);
        assert!(result.confidence > 0.8);
    }
}
