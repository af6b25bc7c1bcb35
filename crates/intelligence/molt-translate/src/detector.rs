//! Cue Detector
//!
//! Scans lowercased text for the phrases that signal each token.
//!
//! ## Matching
//!
//! ```text
//! "Fetch user data from the API and return JSON"
//!  ^fetch              ^api           ^json
//!  OP:fetch @0         SRC:api @25    RET:json @40
//! ```
//!
//! - Phrases match on word boundaries, so "profile" is not a file and
//!   "retry" is not a try
//! - Operation, control and error phrases also match inflected forms
//!   ("fetched", "parsing"); the rest match plurals only
//! - One cue per subtype (the earliest), except return types, which keep
//!   every occurrence because a pipeline can change format mid-sentence
//! - Parameters capture a literal value ("ID 12345" → `PARAM:key=12345`)
//! - Custom catalog subtypes are detected by their own name

use lazy_static::lazy_static;
use molt_core::{Category, Token, TokenCatalog};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// A token found in the input text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCue {
    pub token: Token,
    /// Byte offset into the lowercased text
    pub offset: usize,
    /// The matched text
    pub phrase: String,
}

impl DetectedCue {
    pub fn new(token: Token, offset: usize, phrase: impl Into<String>) -> Self {
        Self {
            token,
            offset,
            phrase: phrase.into(),
        }
    }

    pub fn category(&self) -> Category {
        self.token.category()
    }

    /// Byte offset just past the matched text
    pub fn end(&self) -> usize {
        self.offset + self.phrase.len()
    }

    fn encloses(&self, other: &DetectedCue) -> bool {
        self.offset <= other.offset
            && other.end() <= self.end()
            && self.phrase.len() > other.phrase.len()
    }

    fn overlaps(&self, other: &DetectedCue) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

type CueTable = &'static [(&'static str, &'static [&'static str])];

const OPERATION_CUES: CueTable = &[
    ("fetch", &["fetch", "get", "retrieve", "download", "pull", "load"]),
    ("parse", &["parse", "analyze", "analyse", "extract"]),
    ("transform", &["transform", "convert", "change", "reformat"]),
    ("validate", &["validate", "verify", "check"]),
    ("compute", &["compute", "calculate"]),
    ("search", &["search", "find", "lookup", "look up"]),
    ("filter", &["filter", "sift", "screen", "exclude"]),
    ("map", &["map over", "map each"]),
    ("reduce", &["reduce", "fold"]),
    ("aggregate", &["aggregate", "combine", "merge", "summarize", "summarise", "group by"]),
    ("process", &["process", "handle"]),
];

const SOURCE_CUES: CueTable = &[
    ("api", &["api", "endpoint", "graphql", "web service", "http"]),
    ("db", &["database", "db", "sql", "postgres", "mysql", "mongo"]),
    ("file", &["file", "disk"]),
    ("mem", &["memory", "ram"]),
    ("stream", &["data stream", "event stream", "websocket"]),
    ("queue", &["queue", "kafka", "rabbitmq", "message bus"]),
    ("cache", &["cache", "redis", "memcache"]),
];

const RETURN_CUES: CueTable = &[
    ("json", &["json", "object"]),
    ("text", &["text", "csv", "plain"]),
    ("bin", &["binary", "bytes", "blob"]),
    ("stream", &["as a stream", "streamed", "streaming"]),
    ("bool", &["boolean", "bool", "true or false", "yes or no"]),
    ("num", &["number", "numeric"]),
    ("list", &["list", "array"]),
    ("dict", &["dictionary", "dict", "hash map", "mapping"]),
    ("null", &["nothing", "null", "void"]),
];

const CONTROL_CUES: CueTable = &[
    ("if", &["if", "when", "whenever", "in case", "depending on"]),
    ("else", &["else", "otherwise", "alternatively", "fallback", "or else"]),
    ("loop", &["loop", "iterate", "repeat", "for each", "while", "cycle through"]),
    ("break", &["break", "stop early", "exit the loop"]),
    ("continue", &["continue", "skip to the next", "move on"]),
    ("try", &["try", "attempt", "give it a shot"]),
    ("catch", &["catch", "handle error", "on error", "on failure", "except", "error handler"]),
    ("finally", &["finally", "cleanup", "clean up", "afterwards", "always do"]),
];

const TYPE_CUES: CueTable = &[
    ("str", &["type str", "type string", "string type", "as string", "as a string"]),
    ("int", &["type int", "integer type", "as integer", "as an integer", "to integer"]),
    ("float", &["type float", "float type", "decimal type", "as float"]),
    ("bool", &["type bool", "boolean type", "as boolean"]),
    ("list", &["type list", "list type", "array type", "as list", "to list"]),
    ("dict", &["type dict", "dict type", "map type", "as dict", "to dict"]),
    ("any", &["type any", "any type"]),
];

const ERROR_CUES: CueTable = &[
    (
        "retry",
        &[
            "retry",
            "retries",
            "retried",
            "try again",
            "reattempt",
            "attempt again",
            "keep trying",
        ],
    ),
    ("log", &["log", "logging", "logged", "write to the log", "log error"]),
    ("fail", &["fail", "throw error", "throw an error", "raise error", "raise an error", "abort"]),
    ("ignore", &["ignore", "skip error", "continue on error", "suppress error"]),
];

const MODIFIER_CUES: CueTable = &[
    ("async", &["async", "asynchronous", "asynchronously"]),
    ("batch", &["batch", "bulk"]),
    ("parallel", &["parallel", "concurrent", "concurrently", "simultaneous", "simultaneously"]),
    ("cached", &["cached", "caching", "memoize", "memoized"]),
];

fn cue_table(category: Category) -> CueTable {
    match category {
        Category::Operation => OPERATION_CUES,
        Category::Source => SOURCE_CUES,
        Category::ReturnType => RETURN_CUES,
        Category::ControlFlow => CONTROL_CUES,
        Category::TypeConstraint => TYPE_CUES,
        Category::ErrorHandling => ERROR_CUES,
        Category::Modifier => MODIFIER_CUES,
        // Parameters carry values and use PARAM_PATTERNS
        Category::Parameter => &[],
    }
}

/// Whether phrases in this category are verbs that take inflections
fn inflects(category: Category) -> bool {
    match category {
        Category::Operation | Category::ControlFlow | Category::ErrorHandling => true,
        Category::Source
        | Category::Parameter
        | Category::ReturnType
        | Category::TypeConstraint
        | Category::Modifier => false,
    }
}

/// Word-boundary pattern for a phrase, including its inflected forms
fn phrase_pattern(phrase: &str, category: Category) -> String {
    let escaped = regex::escape(phrase).replace(' ', r"\s+");
    let body = if !inflects(category) {
        format!("{escaped}(?:s|es)?")
    } else {
        match phrase.strip_suffix('e') {
            Some(stem) => {
                let stem = regex::escape(stem).replace(' ', r"\s+");
                format!("(?:{escaped}(?:s|d)?|{stem}ing)")
            }
            None => format!("{escaped}(?:s|es|ed|ing)?"),
        }
    };
    format!(r"\b{body}\b")
}

/// A compiled phrase for one subtype
#[derive(Debug)]
struct CuePattern {
    category: Category,
    subtype: String,
    regex: Regex,
}

impl CuePattern {
    fn compile(category: Category, subtype: &str, phrase: &str) -> Option<Self> {
        Regex::new(&phrase_pattern(phrase, category))
            .map(|regex| Self {
                category,
                subtype: subtype.to_string(),
                regex,
            })
            .ok()
    }

    fn scan<'a>(&'a self, lower: &'a str) -> impl Iterator<Item = DetectedCue> + 'a {
        self.regex.find_iter(lower).map(move |m| {
            DetectedCue::new(
                Token::new(self.category, self.subtype.as_str()),
                m.start(),
                m.as_str(),
            )
        })
    }
}

/// A value-capturing parameter pattern
struct ParamPattern {
    subtype: &'static str,
    regex: Regex,
}

impl ParamPattern {
    fn new(subtype: &'static str, pattern: &str) -> Self {
        Self {
            subtype,
            regex: Regex::new(pattern).unwrap(),
        }
    }

    /// First match: the first participating capture group is the value
    fn find(&self, lower: &str) -> Option<DetectedCue> {
        let caps = self.regex.captures(lower)?;
        let whole = caps.get(0)?;
        let value = caps.iter().skip(1).flatten().next()?;
        match Token::new(Category::Parameter, self.subtype).with_value(value.as_str()) {
            Ok(token) => Some(DetectedCue::new(token, whole.start(), whole.as_str())),
            Err(e) => {
                tracing::trace!(subtype = self.subtype, error = %e, "dropping parameter value");
                None
            }
        }
    }
}

lazy_static! {
    static ref BUILTIN_PATTERNS: Vec<CuePattern> = Category::ALL
        .into_iter()
        .flat_map(|category| {
            cue_table(category).iter().flat_map(move |(subtype, phrases)| {
                phrases
                    .iter()
                    .filter_map(move |phrase| CuePattern::compile(category, subtype, phrase))
            })
        })
        .collect();

    /// `type: int`, `type=string`
    static ref TYPE_DECLARATION: Regex = Regex::new(
        r"\btype\s*[:=]\s*(str|string|int|integer|float|bool|boolean|list|dict|any)\b"
    ).unwrap();

    /// `list of strings`
    static ref LIST_OF: Regex = Regex::new(
        r"\blist\s+of\s+(strings?|ints?|integers?|floats?|bools?|booleans?)\b"
    ).unwrap();

    static ref PARAM_PATTERNS: Vec<ParamPattern> = vec![
        ParamPattern::new("key", r"\b(?:user\s+)?(?:id|identifier)\s*(?:of|:|=|#)?\s*(\d[\w-]*)"),
        ParamPattern::new(
            "key",
            r#"\b(?:api\s+)?key\s*(?:[:=]\s*["']?([\w-]+)|\s+["']([\w-]+)["']|\s+(\w*\d[\w-]*))"#,
        ),
        ParamPattern::new("times", r"\b(\d+)\s+times?\b"),
        ParamPattern::new("timeout", r"\btime\s?out\s*(?:of|after|:|=)?\s*(\d+)"),
        ParamPattern::new(
            "limit",
            r"\b(?:process|batch|handle)\s+(\d+)\s+(?:records?|items?|entries|entry|rows?)\b",
        ),
        ParamPattern::new("limit", r"\b(?:limit|max|maximum)\s*(?:of|:|=|to)?\s*(\d+)"),
        ParamPattern::new("limit", r"\bat\s+most\s+(\d+)"),
        ParamPattern::new("offset", r"\b(?:offset|skip)\s*(?:of|:|=|by)?\s*(\d+)"),
        ParamPattern::new("token", r#"\btoken\s*[:=]\s*["']?([\w.-]+)"#),
        ParamPattern::new("token", r#"\b(?:auth|bearer|access)\s+token\s+["']?([\w.-]+)"#),
        ParamPattern::new(
            "query",
            r#"\b(?:query|find|search|look)\b[^"'\[\]]{0,40}?["']([^"'\[\]]{1,60})["']"#,
        ),
        ParamPattern::new("query", r#"\bquery\s*[:=]\s*["']?([^"',.;\[\]]{1,40})"#),
    ];
}

fn type_subtype(word: &str) -> Option<&'static str> {
    match word.trim_end_matches('s') {
        "str" | "string" => Some("str"),
        "int" | "integer" => Some("int"),
        "float" => Some("float"),
        "bool" | "boolean" => Some("bool"),
        "list" => Some("list"),
        "dict" => Some("dict"),
        "any" => Some("any"),
        _ => None,
    }
}

/// Whole-text facts the context rules consult
#[derive(Debug, Clone, Copy)]
struct Context {
    /// Mentions errors or failure
    error: bool,
    /// Mentions logging or recording
    logs: bool,
}

impl Context {
    fn of(lower: &str) -> Self {
        Self {
            error: ["error", "fail", "exception"].iter().any(|w| lower.contains(w)),
            logs: ["log", "record", "print"].iter().any(|w| lower.contains(w)),
        }
    }

    /// Context rules that veto an otherwise valid cue
    fn suppresses(&self, cue: &DetectedCue) -> bool {
        match (cue.category(), cue.token.subtype()) {
            // "when an error occurs" is a catch, not a branch
            (Category::ControlFlow, "if") => self.error,
            // "otherwise log the error" is error handling, not a branch
            (Category::ControlFlow, "else") => self.logs && cue.phrase.starts_with("otherwise"),
            // "failed records" describes data
            (Category::ErrorHandling, "fail") => cue.phrase == "failed",
            _ => false,
        }
    }
}

/// The cue detector
///
/// Built from a catalog snapshot; detection itself holds no state, so one
/// detector can serve any number of threads.
#[derive(Debug)]
pub struct Detector {
    catalog: Arc<TokenCatalog>,
    custom: Vec<CuePattern>,
}

impl Detector {
    pub fn new(catalog: Arc<TokenCatalog>) -> Self {
        let mut custom = Vec::new();
        for (category, subtype) in catalog.list(None) {
            // Parameters need a value pattern
            if category == Category::Parameter
                || category.builtin_subtypes().contains(&subtype.as_str())
            {
                continue;
            }
            let phrase = subtype.replace('_', " ");
            match CuePattern::compile(category, &subtype, &phrase) {
                Some(pattern) => custom.push(pattern),
                None => tracing::warn!(
                    %category,
                    subtype = %subtype,
                    "custom subtype has no usable pattern"
                ),
            }
        }
        Self { catalog, custom }
    }

    pub fn catalog(&self) -> &Arc<TokenCatalog> {
        &self.catalog
    }

    /// Find every cue in `text`, sorted by offset
    pub fn detect(&self, text: &str) -> Vec<DetectedCue> {
        let lower = text.to_lowercase();
        let context = Context::of(&lower);

        let mut candidates: Vec<DetectedCue> = BUILTIN_PATTERNS
            .iter()
            .chain(self.custom.iter())
            .flat_map(|pattern| pattern.scan(&lower))
            .collect();
        candidates.extend(type_declarations(&lower));
        candidates.retain(|cue| !context.suppresses(cue));

        let mut cues = select(drop_enclosed(candidates));
        cues.extend(parameters(&lower));
        cues.sort_by_key(|cue| cue.offset);

        tracing::debug!(cues = cues.len(), "detected cues");
        cues
    }
}

/// `type: X` declarations and `list of X`
fn type_declarations(lower: &str) -> Vec<DetectedCue> {
    [&*TYPE_DECLARATION, &*LIST_OF]
        .into_iter()
        .filter_map(|regex| regex.captures(lower)?.get(1))
        .filter_map(|word| {
            let subtype = type_subtype(word.as_str())?;
            Some(DetectedCue::new(
                Token::new(Category::TypeConstraint, subtype),
                word.start(),
                word.as_str(),
            ))
        })
        .collect()
}

/// Drop operation and control cues nested inside a longer cue of another
/// category ("handle" in "handle errors", "try" in "try again")
fn drop_enclosed(candidates: Vec<DetectedCue>) -> Vec<DetectedCue> {
    let keep: Vec<bool> = candidates
        .iter()
        .map(|cue| {
            !matches!(cue.category(), Category::Operation | Category::ControlFlow)
                || !candidates
                    .iter()
                    .any(|other| other.category() != cue.category() && other.encloses(cue))
        })
        .collect();
    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(cue, keep)| keep.then_some(cue))
        .collect()
}

/// Earliest cue per subtype; every distinct return cue; type constraints
/// that do not overlap a return
fn select(mut candidates: Vec<DetectedCue>) -> Vec<DetectedCue> {
    // Earliest first, longer phrase first on a tie
    candidates.sort_by(|a, b| {
        a.offset
            .cmp(&b.offset)
            .then_with(|| b.phrase.len().cmp(&a.phrase.len()))
    });

    let returns: Vec<DetectedCue> = candidates
        .iter()
        .filter(|c| c.category() == Category::ReturnType)
        .cloned()
        .collect();

    let mut seen: HashSet<(Category, String, Option<usize>)> = HashSet::new();
    let mut selected = Vec::new();
    for cue in candidates {
        let key = match cue.category() {
            Category::ReturnType => {
                (cue.category(), cue.token.subtype().to_string(), Some(cue.offset))
            }
            Category::TypeConstraint if returns.iter().any(|r| r.overlaps(&cue)) => continue,
            _ => (cue.category(), cue.token.subtype().to_string(), None),
        };
        if seen.insert(key) {
            selected.push(cue);
        }
    }
    selected
}

/// Earliest value-carrying match per parameter subtype
fn parameters(lower: &str) -> Vec<DetectedCue> {
    let mut found: Vec<DetectedCue> = Vec::new();
    for pattern in PARAM_PATTERNS.iter() {
        let Some(cue) = pattern.find(lower) else {
            continue;
        };
        match found.iter_mut().find(|c| c.token.subtype() == pattern.subtype) {
            Some(existing) if cue.offset < existing.offset => *existing = cue,
            Some(_) => {}
            None => found.push(cue),
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> Detector {
        Detector::new(Arc::new(TokenCatalog::builtin()))
    }

    fn rendered(cues: &[DetectedCue]) -> Vec<String> {
        cues.iter().map(|c| c.token.to_string()).collect()
    }

    #[test]
    fn test_simple_detection() {
        let cues = detector().detect("Fetch user data from the API and return JSON");
        assert_eq!(rendered(&cues), vec!["[OP:fetch]", "[SRC:api]", "[RET:json]"]);
        assert_eq!(cues[0].offset, 0);
        assert_eq!(cues[1].phrase, "api");
    }

    #[test]
    fn test_word_boundaries() {
        let cues = detector().detect("Update the profile and retry");
        let tokens = rendered(&cues);
        assert!(!tokens.contains(&"[SRC:file]".to_string()));
        assert!(!tokens.contains(&"[CTL:try]".to_string()));
        assert!(tokens.contains(&"[ERR:retry]".to_string()));
    }

    #[test]
    fn test_inflections() {
        let cues = detector().detect("Parsing the fetched records");
        let tokens = rendered(&cues);
        assert!(tokens.contains(&"[OP:parse]".to_string()));
        assert!(tokens.contains(&"[OP:fetch]".to_string()));
    }

    #[test]
    fn test_single_occurrence_per_subtype() {
        let cues = detector().detect("fetch the page, then fetch the next page");
        let fetches: Vec<_> = cues
            .iter()
            .filter(|c| c.token.is(Category::Operation, "fetch"))
            .collect();
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].offset, 0);
    }

    #[test]
    fn test_returns_keep_every_occurrence() {
        let cues =
            detector().detect("Parse JSON data from file, validate structure, transform to CSV");
        let returns: Vec<_> = cues
            .iter()
            .filter(|c| c.category() == Category::ReturnType)
            .map(|c| c.token.subtype().to_string())
            .collect();
        assert_eq!(returns, vec!["json", "text"]);

        let cues = detector().detect("emit json now and json later");
        let json = cues.iter().filter(|c| c.token.is(Category::ReturnType, "json")).count();
        assert_eq!(json, 2);
    }

    #[test]
    fn test_parameter_capture() {
        let cues = detector()
            .detect("Search database for user with ID 12345, return profile as dictionary");
        let key = cues
            .iter()
            .find(|c| c.category() == Category::Parameter)
            .unwrap();
        assert_eq!(key.token.to_string(), "[PARAM:key=12345]");

        let cues = detector().detect("fetch with a timeout of 30 seconds, limit 50, retry 3 times");
        let tokens = rendered(&cues);
        assert!(tokens.contains(&"[PARAM:timeout=30]".to_string()));
        assert!(tokens.contains(&"[PARAM:limit=50]".to_string()));
        assert!(tokens.contains(&"[PARAM:times=3]".to_string()));
    }

    #[test]
    fn test_quoted_query() {
        let cues = detector().detect(r#"search the database for "active users""#);
        assert!(cues.iter().any(|c| c.token.to_string() == "[PARAM:query=active users]"));
    }

    #[test]
    fn test_context_rules() {
        // No branch in an error context, no else from "otherwise log"
        let cues =
            detector().detect("Try to fetch from API, retry on failure, otherwise log error");
        let tokens = rendered(&cues);
        assert!(!tokens.contains(&"[CTL:else]".to_string()));
        assert!(!tokens.contains(&"[CTL:if]".to_string()));
        assert!(!tokens.contains(&"[ERR:fail]".to_string()));
        assert!(tokens.contains(&"[CTL:catch]".to_string()));

        let cues = detector().detect("if the list is empty return null, otherwise fetch");
        let tokens = rendered(&cues);
        assert!(tokens.contains(&"[CTL:if]".to_string()));
        assert!(tokens.contains(&"[CTL:else]".to_string()));

        let cues = detector().detect("process the failed records");
        assert!(!rendered(&cues).contains(&"[ERR:fail]".to_string()));
    }

    #[test]
    fn test_enclosed_cues_dropped() {
        let cues = detector().detect("handle errors and try again");
        let tokens = rendered(&cues);
        assert!(tokens.contains(&"[CTL:catch]".to_string()));
        assert!(tokens.contains(&"[ERR:retry]".to_string()));
        assert!(!tokens.contains(&"[OP:process]".to_string()));
        assert!(!tokens.contains(&"[CTL:try]".to_string()));
    }

    #[test]
    fn test_types_do_not_shadow_returns() {
        let cues = detector().detect("fetch items and return as list");
        let tokens = rendered(&cues);
        assert!(tokens.contains(&"[RET:list]".to_string()));
        assert!(!tokens.contains(&"[TYPE:list]".to_string()));

        let cues = detector().detect("return a list of strings with type: int");
        let tokens = rendered(&cues);
        assert!(tokens.contains(&"[TYPE:str]".to_string()));
        assert!(tokens.contains(&"[TYPE:int]".to_string()));
    }

    #[test]
    fn test_no_cues() {
        assert!(detector().detect("hello there").is_empty());
        assert!(detector().detect("").is_empty());
    }

    #[test]
    fn test_custom_subtype_detected_by_name() {
        let catalog = TokenCatalog::builtin()
            .with_custom(Category::Operation, "summarize_thread")
            .unwrap();
        let detector = Detector::new(Arc::new(catalog));
        let cues = detector.detect("Summarize thread from the queue");
        let tokens = rendered(&cues);
        assert!(tokens.contains(&"[OP:summarize_thread]".to_string()));
        assert!(tokens.contains(&"[SRC:queue]".to_string()));
    }
}
