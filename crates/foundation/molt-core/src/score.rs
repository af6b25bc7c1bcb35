//! Confidence and efficiency scoring
//!
//! ```text
//! confidence = min(1.0, base(n) + completeness)
//!
//! base(n)      = 0.2 * (1 - 0.5^n)          saturates at 0.2
//! completeness = 0.3  operation present
//!              + 0.3  source or return present
//!              + 0.2  both of the above
//! ```
//!
//! Token count alone never reaches 0.8; structure carries the score.

use crate::catalog::Category;
use crate::token::TokenSequence;

const BASE_CEILING: f64 = 0.2;
const BASE_DECAY: f64 = 0.5;
const OPERATION_BONUS: f64 = 0.3;
const DATA_BONUS: f64 = 0.3;
const COMPLETE_BONUS: f64 = 0.2;

/// Structural features of a token sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Completeness {
    pub has_operation: bool,
    pub has_source: bool,
    pub has_return: bool,
}

impl Completeness {
    pub fn of(sequence: &TokenSequence) -> Self {
        let mut completeness = Self::default();
        for token in sequence {
            match token.category() {
                Category::Operation => completeness.has_operation = true,
                Category::Source => completeness.has_source = true,
                Category::ReturnType => completeness.has_return = true,
                Category::Parameter
                | Category::ControlFlow
                | Category::TypeConstraint
                | Category::ErrorHandling
                | Category::Modifier => {}
            }
        }
        completeness
    }

    /// Completeness bonus in `[0, 0.8]`
    pub fn bonus(&self) -> f64 {
        let has_data = self.has_source || self.has_return;
        let mut bonus = 0.0;
        if self.has_operation {
            bonus += OPERATION_BONUS;
        }
        if has_data {
            bonus += DATA_BONUS;
        }
        if self.has_operation && has_data {
            bonus += COMPLETE_BONUS;
        }
        bonus
    }

    /// Bonus normalised to `[0, 1]`
    pub fn ratio(&self) -> f64 {
        self.bonus() / (OPERATION_BONUS + DATA_BONUS + COMPLETE_BONUS)
    }
}

/// Round to two decimals
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Whitespace-delimited word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Confidence in `[0, 1]` for a translated sequence
pub fn confidence(sequence: &TokenSequence) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let n = sequence.len().min(i32::MAX as usize) as i32;
    let base = BASE_CEILING * (1.0 - BASE_DECAY.powi(n));
    round2((base + Completeness::of(sequence).bonus()).min(1.0))
}

/// Efficiency against an original word count, 0 when undefined
pub fn efficiency(sequence: &TokenSequence, original_word_count: usize) -> f64 {
    sequence.efficiency(original_word_count).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn seq(specs: &[(Category, &str)]) -> TokenSequence {
        specs.iter().map(|(c, s)| Token::new(*c, *s)).collect()
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(confidence(&TokenSequence::new()), 0.0);
    }

    #[test]
    fn test_complete_sequence_is_confident() {
        let sequence = seq(&[
            (Category::Operation, "fetch"),
            (Category::Source, "api"),
            (Category::ReturnType, "json"),
        ]);
        let score = confidence(&sequence);
        assert!(score >= 0.8, "got {score}");
        assert!(score <= 1.0);
    }

    #[test]
    fn test_single_arbitrary_token_is_not_confident() {
        let sequence = seq(&[(Category::Modifier, "async")]);
        assert!(confidence(&sequence) < 0.2);

        let many: TokenSequence =
            (0..50).map(|_| Token::new(Category::Modifier, "batch")).collect();
        assert!(confidence(&many) <= BASE_CEILING);
    }

    #[test]
    fn test_completeness_bonus() {
        let op_only = Completeness::of(&seq(&[(Category::Operation, "parse")]));
        assert!((op_only.bonus() - 0.3).abs() < 1e-9);

        let full = Completeness::of(&seq(&[
            (Category::Operation, "parse"),
            (Category::ReturnType, "json"),
        ]));
        assert!((full.bonus() - 0.8).abs() < 1e-9);
        assert!((full.ratio() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_efficiency_reports_negative() {
        let sequence = seq(&[
            (Category::Operation, "fetch"),
            (Category::Source, "api"),
            (Category::ReturnType, "json"),
            (Category::ErrorHandling, "log"),
        ]);
        assert_eq!(efficiency(&sequence, 2), -1.0);
        assert_eq!(efficiency(&sequence, 0), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.9749), 0.97);
        assert_eq!(round2(0.975_01), 0.98);
    }
}
