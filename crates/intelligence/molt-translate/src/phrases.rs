//! Reverse rendering: tokens to an English paraphrase
//!
//! Each token maps to a fixed phrase. Operations, control flow and error
//! handling open a clause; sources, parameters, returns and types extend
//! the current one. A leading try or modifier prefixes the next clause.
//!
//! ```text
//! [CTL:try][OP:fetch][SRC:api][CTL:catch][ERR:retry][PARAM:times=3]
//!   → "Try to fetch data from the API, on failure, retry up to 3 times."
//! ```
//!
//! The result is a paraphrase. The original wording is not recoverable.

use molt_core::{Category, Token, TokenSequence};

/// Rendering of a sequence with no tokens
pub const EMPTY_SENTENCE: &str = "Empty operation.";

/// Where a token's phrase goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Before the next clause
    Prefix,
    /// Starts a clause
    Clause,
    /// Extends the current clause
    Attach,
}

fn placement(token: &Token) -> Placement {
    match token.category() {
        Category::Operation | Category::ErrorHandling => Placement::Clause,
        Category::ControlFlow if token.subtype() == "try" => Placement::Prefix,
        Category::ControlFlow => Placement::Clause,
        Category::Modifier if token.subtype() == "cached" => Placement::Attach,
        Category::Modifier => Placement::Prefix,
        Category::Source
        | Category::Parameter
        | Category::ReturnType
        | Category::TypeConstraint => Placement::Attach,
    }
}

fn spoken(subtype: &str) -> String {
    subtype.replace('_', " ")
}

/// The English phrase for one token
pub fn phrase(token: &Token) -> String {
    let subtype = token.subtype();
    match token.category() {
        Category::Operation => operation_phrase(subtype),
        Category::Source => source_phrase(subtype),
        Category::Parameter => parameter_phrase(subtype, token.value()),
        Category::ReturnType => return_phrase(subtype),
        Category::ControlFlow => control_phrase(subtype),
        Category::TypeConstraint => type_phrase(subtype),
        Category::ErrorHandling => error_phrase(subtype),
        Category::Modifier => modifier_phrase(subtype),
    }
}

fn operation_phrase(subtype: &str) -> String {
    let phrase = match subtype {
        "fetch" => "fetch data",
        "parse" => "parse the data",
        "transform" => "transform the data",
        "validate" => "validate the result",
        "compute" => "compute the result",
        "search" => "search",
        "filter" => "filter the results",
        "map" => "map over each item",
        "reduce" => "reduce the results",
        "aggregate" => "aggregate the results",
        "process" => "process the data",
        other => return spoken(other),
    };
    phrase.to_string()
}

fn source_phrase(subtype: &str) -> String {
    let phrase = match subtype {
        "api" => "from the API",
        "db" => "from the database",
        "file" => "from a file",
        "mem" => "from memory",
        "stream" => "from a data stream",
        "queue" => "from a queue",
        "cache" => "from the cache",
        other => return format!("from {}", spoken(other)),
    };
    phrase.to_string()
}

fn parameter_phrase(subtype: &str, value: Option<&str>) -> String {
    match (subtype, value) {
        ("key", Some(v)) => format!("with key {v}"),
        ("key", None) => "by key".to_string(),
        ("token", Some(v)) => format!("with token {v}"),
        ("token", None) => "with an auth token".to_string(),
        ("query", Some(v)) => format!("matching \"{v}\""),
        ("query", None) => "with a query".to_string(),
        ("body", Some(v)) => format!("with body {v}"),
        ("body", None) => "with a request body".to_string(),
        ("header", Some(v)) => format!("with header {v}"),
        ("header", None) => "with headers".to_string(),
        ("timeout", Some(v)) => format!("with a timeout of {v}"),
        ("timeout", None) => "with a timeout".to_string(),
        ("limit", Some(v)) => format!("limited to {v}"),
        ("limit", None) => "with a limit".to_string(),
        ("offset", Some(v)) => format!("skipping {v}"),
        ("offset", None) => "with an offset".to_string(),
        ("times", Some(v)) => format!("up to {v} times"),
        ("times", None) => "repeatedly".to_string(),
        (other, Some(v)) => format!("with {} {v}", spoken(other)),
        (other, None) => format!("with {}", spoken(other)),
    }
}

fn return_phrase(subtype: &str) -> String {
    let phrase = match subtype {
        "json" => "as JSON",
        "text" => "as text",
        "bin" => "as binary",
        "stream" => "as a stream",
        "bool" => "as a boolean",
        "num" => "as a number",
        "list" => "as a list",
        "dict" => "as a dictionary",
        "null" => "returning nothing",
        other => return format!("as {}", spoken(other)),
    };
    phrase.to_string()
}

fn control_phrase(subtype: &str) -> String {
    let phrase = match subtype {
        "if" => "if the condition holds",
        "else" => "otherwise",
        "loop" => "for each item",
        "break" => "stop the loop",
        "continue" => "skip to the next item",
        "try" => "try to",
        "catch" => "on failure",
        "finally" => "finally clean up",
        other => return spoken(other),
    };
    phrase.to_string()
}

fn type_phrase(subtype: &str) -> String {
    let phrase = match subtype {
        "str" => "typed as string",
        "int" => "typed as integer",
        "float" => "typed as float",
        "bool" => "typed as boolean",
        "list" => "typed as list",
        "dict" => "typed as dictionary",
        "any" => "of any type",
        other => return format!("typed as {}", spoken(other)),
    };
    phrase.to_string()
}

fn error_phrase(subtype: &str) -> String {
    let phrase = match subtype {
        "retry" => "retry",
        "log" => "log the error",
        "fail" => "fail with an error",
        "ignore" => "ignore errors",
        other => return spoken(other),
    };
    phrase.to_string()
}

fn modifier_phrase(subtype: &str) -> String {
    let phrase = match subtype {
        "async" => "asynchronously",
        "batch" => "in bulk",
        "parallel" => "concurrently",
        "cached" => "with caching",
        other => return spoken(other),
    };
    phrase.to_string()
}

/// Render a sequence as one English sentence
pub fn render(sequence: &TokenSequence) -> String {
    let mut clauses: Vec<String> = Vec::new();
    let mut prefix: Vec<String> = Vec::new();

    for token in sequence {
        let phrase = phrase(token);
        match placement(token) {
            Placement::Prefix => prefix.push(phrase),
            Placement::Attach if prefix.is_empty() && !clauses.is_empty() => {
                if let Some(clause) = clauses.last_mut() {
                    clause.push(' ');
                    clause.push_str(&phrase);
                }
            }
            Placement::Attach | Placement::Clause => {
                prefix.push(phrase);
                clauses.push(std::mem::take(&mut prefix).join(" "));
            }
        }
    }
    if !prefix.is_empty() {
        clauses.push(prefix.join(" "));
    }

    let sentence = clauses.join(", ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => EMPTY_SENTENCE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use molt_core::TokenCatalog;

    fn render_str(tokens: &str) -> String {
        let parsed = TokenSequence::parse(tokens, &TokenCatalog::builtin()).unwrap();
        render(&parsed.sequence)
    }

    #[test]
    fn test_simple_sentence() {
        assert_eq!(render_str("[OP:fetch][SRC:api]"), "Fetch data from the API.");
        assert_eq!(
            render_str("[OP:fetch][SRC:api][RET:json]"),
            "Fetch data from the API as JSON."
        );
    }

    #[test]
    fn test_prefixes_and_clauses() {
        assert_eq!(
            render_str("[CTL:try][OP:fetch][SRC:api][CTL:catch][ERR:retry][PARAM:times=3]"),
            "Try to fetch data from the API, on failure, retry up to 3 times."
        );
        assert_eq!(
            render_str("[MOD:async][OP:search][SRC:db][PARAM:key=12345][RET:dict]"),
            "Asynchronously search from the database with key 12345 as a dictionary."
        );
    }

    #[test]
    fn test_orphan_attach_starts_clause() {
        assert_eq!(render_str("[SRC:api][RET:json]"), "From the API as JSON.");
        assert_eq!(render_str("[CTL:try]"), "Try to.");
    }

    #[test]
    fn test_every_builtin_has_a_phrase() {
        for (category, subtype) in TokenCatalog::builtin().list(None) {
            let text = phrase(&Token::new(category, subtype.as_str()));
            assert!(!text.is_empty(), "{category}:{subtype}");
        }
    }

    #[test]
    fn test_custom_subtype_phrase() {
        assert_eq!(phrase(&Token::new(Category::Source, "kafka_topic")), "from kafka topic");
        assert_eq!(phrase(&Token::new(Category::Operation, "summarize")), "summarize");
    }

    #[test]
    fn test_empty() {
        assert_eq!(render(&TokenSequence::new()), EMPTY_SENTENCE);
    }
}
