//! End-to-end translation scenarios

use molt_core::{Category, TokenCatalog, TokenSequence};
use molt_translate::{FallbackEngine, Translator};
use std::sync::Arc;
use std::thread;

fn forward(text: &str) -> String {
    Translator::default().translate_to_tokens(text).unwrap().text
}

#[test]
fn fetch_from_api_as_json() {
    let result = Translator::default()
        .translate_to_tokens("Fetch user data from the API and return JSON")
        .unwrap();
    assert_eq!(result.text, "[OP:fetch][SRC:api][RET:json]");
    assert!(result.confidence >= 0.8);
    assert!(result.token_efficiency >= 0.5);
}

#[test]
fn search_keeps_literal_id() {
    let text = forward("Search database for user with ID 12345, return profile as dictionary");
    assert!(text.contains("[PARAM:key=12345]"));
    assert_eq!(text, "[OP:search][SRC:db][PARAM:key=12345][RET:dict]");
}

#[test]
fn try_fetch_with_error_handling() {
    let result = Translator::default()
        .translate_to_tokens("Try to fetch from API, retry on failure, otherwise log error")
        .unwrap();
    let tokens = &result.tokens;
    assert!(tokens.has_category(Category::ControlFlow));
    assert!(tokens.has_category(Category::ErrorHandling));

    let fetch = tokens.iter().position(|t| t.is(Category::Operation, "fetch")).unwrap();
    assert!(tokens.tokens()[fetch + 1].is(Category::Source, "api"));
    assert_eq!(
        result.text,
        "[CTL:try][OP:fetch][SRC:api][CTL:catch][ERR:retry][ERR:log]"
    );
}

#[test]
fn reverse_mentions_operation_and_source() {
    let result = Translator::default()
        .translate_from_tokens("[OP:fetch][SRC:api]")
        .unwrap();
    let lower = result.text.to_lowercase();
    assert!(!lower.is_empty());
    assert!(lower.contains("fetch"));
    assert!(lower.contains("api"));
}

#[test]
fn multi_return_pipeline() {
    let result = Translator::default()
        .translate_to_tokens("Parse JSON data from file, validate structure, transform to CSV")
        .unwrap();
    assert_eq!(
        result.text,
        "[OP:parse][SRC:file][RET:json][OP:validate][OP:transform][RET:text]"
    );
}

#[test]
fn operation_order_follows_text() {
    assert_eq!(
        forward("Filter the records, then aggregate totals, then validate the output"),
        "[OP:filter][OP:aggregate][OP:validate]"
    );
    assert_eq!(
        forward("Validate the input, then aggregate totals, then filter the records"),
        "[OP:validate][OP:aggregate][OP:filter]"
    );
}

#[test]
fn leading_source_is_claimed_by_first_operation() {
    // Known approximation: the first operation takes the first source however
    // far before it the source appears
    assert_eq!(forward("From the API, fetch user data"), "[OP:fetch][SRC:api]");
}

#[test]
fn negative_efficiency_is_reported() {
    let result = Translator::default().translate_to_tokens("Safely fetch").unwrap();
    assert_eq!(result.text, "[CTL:try][OP:fetch][CTL:catch]");
    assert_eq!(result.token_efficiency, -0.5);
}

#[test]
fn question_becomes_search() {
    assert_eq!(forward("What is in the database?"), "[OP:search][SRC:db]");
}

#[test]
fn fallback_is_idempotent_on_translations() {
    let engine = FallbackEngine::new();
    for text in [
        "Handle errors gracefully when you fetch from the API",
        "Ensure the file is parsed safely",
        "anything in the cache?",
    ] {
        let result = Translator::default().translate_to_tokens(text).unwrap();
        let mut again = result.tokens.clone();
        engine.apply(text, &mut again);
        assert_eq!(again, result.tokens, "{text}");
    }
}

#[test]
fn forward_output_reparses_to_same_sequence() {
    let catalog = TokenCatalog::builtin();
    for text in [
        "Fetch user data from the API and return JSON",
        "Search database for user with ID 12345, return profile as dictionary",
        r#"search the database for "active users" with a timeout of 30"#,
        "Asynchronously fetch cached results from the API in parallel",
    ] {
        let result = Translator::default().translate_to_tokens(text).unwrap();
        let parsed = TokenSequence::parse(&result.text, &catalog).unwrap();
        assert!(parsed.unknown.is_empty());
        assert_eq!(parsed.sequence, result.tokens, "{text}");
    }
}

#[test]
fn shared_translator_across_threads() {
    let inputs = [
        "Fetch user data from the API and return JSON",
        "Parse JSON data from file, validate structure, transform to CSV",
        "Try to fetch from API, retry on failure, otherwise log error",
        "What is in the database?",
    ];
    let translator = Arc::new(Translator::default());
    let expected: Vec<String> = inputs
        .iter()
        .map(|text| translator.translate_to_tokens(text).unwrap().text)
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let translator = Arc::clone(&translator);
            thread::spawn(move || {
                inputs
                    .iter()
                    .map(|text| translator.translate_to_tokens(text).unwrap().text)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
