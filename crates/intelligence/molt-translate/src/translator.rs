//! The Translator: forward and reverse pipelines
//!
//! ```text
//! forward:  text → Detector → SemanticGrouper → flatten → FallbackEngine → score
//! reverse:  tokens → parse → phrase table → sentence → score
//! ```

use crate::detector::Detector;
use crate::fallback::FallbackEngine;
use crate::grouper::SemanticGrouper;
use crate::phrases;
use molt_config::{ConfigError, MoltConfig};
use molt_core::{
    word_count, MoltError, Result, TokenCatalog, TokenSequence, Translate, TranslationResult,
};
use std::sync::Arc;

/// Bidirectional MoltLang translator
///
/// Holds only immutable state, so a single instance can be shared across
/// threads; every call works on its own cue lists and groups.
#[derive(Debug)]
pub struct Translator {
    config: MoltConfig,
    catalog: Arc<TokenCatalog>,
    detector: Detector,
    grouper: SemanticGrouper,
    fallback: FallbackEngine,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(MoltConfig::default(), Arc::new(TokenCatalog::builtin()))
    }
}

impl Translator {
    /// Create a translator over a catalog snapshot
    pub fn new(config: MoltConfig, catalog: Arc<TokenCatalog>) -> Self {
        Self {
            detector: Detector::new(Arc::clone(&catalog)),
            grouper: SemanticGrouper::new(config.return_lookahead),
            fallback: FallbackEngine::new(),
            catalog,
            config,
        }
    }

    /// Create a translator whose catalog includes the configured custom tokens
    pub fn from_config(config: MoltConfig) -> std::result::Result<Self, ConfigError> {
        let catalog = config.catalog_registry()?.snapshot();
        Ok(Self::new(config, catalog))
    }

    pub fn config(&self) -> &MoltConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<TokenCatalog> {
        &self.catalog
    }

    /// English to tokens
    ///
    /// Unrecognised input yields an empty sequence with zero confidence.
    /// Only oversized input is rejected.
    pub fn translate_to_tokens(&self, text: &str) -> Result<TranslationResult> {
        let chars = text.chars().count();
        if chars > self.config.max_input_chars {
            return Err(MoltError::InputTooLarge {
                chars,
                limit: self.config.max_input_chars,
            });
        }

        let cues = self.detector.detect(text);
        let grouping = self.grouper.group(text, cues);
        let mut tokens = grouping.flatten();
        self.fallback.apply(text, &mut tokens);

        let result = TranslationResult::new(tokens.to_string(), tokens, word_count(text));
        tracing::debug!(
            tokens = result.token_count,
            words = result.original_token_count,
            confidence = result.confidence,
            "translated to tokens"
        );
        Ok(result)
    }

    /// Tokens to English
    ///
    /// Malformed token strings fail with a parse error. Well-formed tokens
    /// with unknown subtypes are skipped.
    pub fn translate_from_tokens(&self, tokens: &str) -> Result<TranslationResult> {
        let parsed = TokenSequence::parse(tokens, &self.catalog)?;
        if !parsed.unknown.is_empty() {
            tracing::debug!(skipped = parsed.unknown.len(), "unknown subtypes in token string");
        }

        let text = phrases::render(&parsed.sequence);
        let words = word_count(&text);
        let result = TranslationResult::new(text, parsed.sequence, words);
        tracing::debug!(tokens = result.token_count, words, "translated from tokens");
        Ok(result)
    }
}

impl Translate for Translator {
    fn translate_to_tokens(&self, text: &str) -> Result<TranslationResult> {
        Translator::translate_to_tokens(self, text)
    }

    fn translate_from_tokens(&self, tokens: &str) -> Result<TranslationResult> {
        Translator::translate_from_tokens(self, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use molt_config::CustomToken;
    use molt_core::{Category, ParseError};

    #[test]
    fn test_forward() {
        let result = Translator::default()
            .translate_to_tokens("Fetch user data from the API and return JSON")
            .unwrap();
        assert_eq!(result.text, "[OP:fetch][SRC:api][RET:json]");
        assert_eq!(result.token_count, 3);
        assert_eq!(result.original_token_count, 9);
        assert!((result.token_efficiency - 2.0 / 3.0).abs() < 1e-9);
        assert!(result.confidence >= 0.8);
    }

    #[test]
    fn test_unrecognised_input() {
        let result = Translator::default().translate_to_tokens("hello there").unwrap();
        assert!(result.tokens.is_empty());
        assert_eq!(result.text, "");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.token_efficiency, 0.0);
    }

    #[test]
    fn test_input_too_large() {
        let config = MoltConfig {
            max_input_chars: 10,
            ..MoltConfig::default()
        };
        let translator = Translator::new(config, Arc::new(TokenCatalog::builtin()));
        let err = translator.translate_to_tokens("fetch the data please").unwrap_err();
        assert!(matches!(err, MoltError::InputTooLarge { chars: 21, limit: 10 }));
        assert!(translator.translate_to_tokens("fetch").is_ok());
    }

    #[test]
    fn test_reverse() {
        let result = Translator::default()
            .translate_from_tokens("[OP:fetch][SRC:api]")
            .unwrap();
        assert_eq!(result.text, "Fetch data from the API.");
        assert_eq!(result.token_count, 2);
        assert_eq!(result.original_token_count, 5);
    }

    #[test]
    fn test_reverse_parse_errors() {
        let translator = Translator::default();
        assert!(matches!(
            translator.translate_from_tokens("[OP:fetch"),
            Err(MoltError::Parse(ParseError::UnbalancedBrackets { offset: 0 }))
        ));
        assert!(matches!(
            translator.translate_from_tokens("[OP-fetch]"),
            Err(MoltError::Parse(ParseError::MalformedToken { .. }))
        ));
    }

    #[test]
    fn test_reverse_skips_unknown_subtypes() {
        let result = Translator::default()
            .translate_from_tokens("[OP:fetch][SRC:moon]")
            .unwrap();
        assert_eq!(result.token_count, 1);
        assert_eq!(result.text, "Fetch data.");
    }

    #[test]
    fn test_reverse_of_nothing() {
        let translator = Translator::default();
        let result = translator.translate_from_tokens("").unwrap();
        assert_eq!(result.text, "Empty operation.");
        assert_eq!(result.token_count, 0);
        assert_eq!(result.original_token_count, 2);

        let result = translator.translate_from_tokens("[OP:zzz]").unwrap();
        assert_eq!(result.text, "Empty operation.");
    }

    #[test]
    fn test_custom_tokens_from_config() {
        let config = MoltConfig {
            custom_tokens: vec![CustomToken {
                category: Category::Source,
                subtype: "warehouse".to_string(),
            }],
            ..MoltConfig::default()
        };
        let translator = Translator::from_config(config).unwrap();

        let forward = translator.translate_to_tokens("fetch events from the warehouse").unwrap();
        assert_eq!(forward.text, "[OP:fetch][SRC:warehouse]");

        let reverse = translator.translate_from_tokens("[OP:fetch][SRC:warehouse]").unwrap();
        assert_eq!(reverse.text, "Fetch data from warehouse.");
    }
}
