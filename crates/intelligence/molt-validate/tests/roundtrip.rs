//! Validator against the real translator

use molt_core::{MoltError, Translate, TranslationResult};
use molt_translate::Translator;
use molt_validate::{IssueKind, Severity, Validator};

#[test]
fn roundtrip_is_a_metric() {
    let quality = Validator::default()
        .validate_roundtrip("Fetch user data from the API and return JSON", &Translator::default())
        .unwrap();
    assert!(quality.is_valid);

    let roundtrip = quality.metrics.roundtrip.as_ref().unwrap();
    assert_eq!(roundtrip.tokens, "[OP:fetch][SRC:api][RET:json]");
    assert_eq!(roundtrip.reconstructed, "Fetch data from the API as JSON.");
    assert_eq!(roundtrip.similarity, 0.6);

    let drift: Vec<_> = quality
        .issues
        .iter()
        .filter(|i| i.kind == IssueKind::RoundTripDrift)
        .collect();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].severity, Severity::Info);
}

#[test]
fn unrecognised_text_drifts_with_warning() {
    let quality = Validator::default()
        .validate_roundtrip("hello there", &Translator::default())
        .unwrap();
    assert!(quality.is_valid);
    assert_eq!(quality.score, 0.4);
    assert!(quality
        .issues
        .iter()
        .any(|i| i.kind == IssueKind::RoundTripDrift && i.severity == Severity::Warning));
    assert!(quality.issues.iter().any(|i| i.kind == IssueKind::MissingOperation));
}

#[test]
fn forward_output_always_passes_syntax() {
    let translator = Translator::default();
    let validator = Validator::default();
    for text in [
        "Search database for user with ID 12345, return profile as dictionary",
        "Try to fetch from API, retry on failure, otherwise log error",
        "Parse JSON data from file, validate structure, transform to CSV",
        "Safely fetch",
    ] {
        let result = translator.translate_to_tokens(text).unwrap();
        let check = validator.check_syntax(&result.text);
        assert!(check.is_valid, "{text}");
        assert!(check.issues.is_empty(), "{text}");
        assert_eq!(check.sequence, result.tokens);
    }
}

struct Failing;

impl Translate for Failing {
    fn translate_to_tokens(&self, text: &str) -> molt_core::Result<TranslationResult> {
        Err(MoltError::InputTooLarge {
            chars: text.chars().count(),
            limit: 0,
        })
    }

    fn translate_from_tokens(&self, _tokens: &str) -> molt_core::Result<TranslationResult> {
        unreachable!()
    }
}

#[test]
fn translator_errors_propagate() {
    let err = Validator::default().validate_roundtrip("fetch", &Failing).unwrap_err();
    assert!(matches!(err, MoltError::InputTooLarge { chars: 5, limit: 0 }));
}
