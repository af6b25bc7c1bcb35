//! MoltLang Token Catalog
//!
//! The closed set of token categories and the subtypes each one admits.
//!
//! Categories:
//! - Operation (`OP`): fetch, parse, transform, validate, compute, search, ...
//! - Source (`SRC`): api, db, file, mem, stream, queue, cache
//! - Parameter (`PARAM`): token, key, query, body, header, timeout, ...
//! - Return type (`RET`): json, text, bin, stream, bool, num, list, dict, null
//! - Control flow (`CTL`): if, else, loop, break, continue, try, catch, finally
//! - Type constraint (`TYPE`): str, int, float, bool, list, dict, any
//! - Error handling (`ERR`): retry, fail, log, ignore
//! - Modifier (`MOD`): async, batch, parallel, cached
//!
//! A [`TokenCatalog`] is an immutable snapshot. Detectors and validators are
//! built from a snapshot, so a translation never observes a half-applied
//! registration. Custom subtypes go through [`CatalogRegistry`], which swaps
//! in a new snapshot under a write lock.

use crate::token::Token;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Catalog errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unknown token category '{0}'")]
    UnknownCategory(String),

    #[error("Unknown subtype '{subtype}' in category {category}")]
    UnknownSubtype { category: Category, subtype: String },

    #[error("Invalid subtype '{0}': expected a lowercase identifier")]
    InvalidSubtype(String),

    #[error("Invalid token value '{0}': must be non-empty and free of brackets")]
    InvalidValue(String),
}

/// Token category - one variant per kind of token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// An action to perform
    #[serde(rename = "OP", alias = "op", alias = "operation")]
    Operation,
    /// Where data comes from
    #[serde(rename = "SRC", alias = "src", alias = "source")]
    Source,
    /// A named argument, optionally carrying a literal value
    #[serde(rename = "PARAM", alias = "param", alias = "parameter")]
    Parameter,
    /// Shape of the produced data
    #[serde(rename = "RET", alias = "ret", alias = "return")]
    ReturnType,
    /// Branching, looping and try/catch structure
    #[serde(rename = "CTL", alias = "ctl", alias = "control")]
    ControlFlow,
    /// Declared data type
    #[serde(rename = "TYPE", alias = "type")]
    TypeConstraint,
    /// What to do when something goes wrong
    #[serde(rename = "ERR", alias = "err", alias = "error")]
    ErrorHandling,
    /// Execution style of an operation
    #[serde(rename = "MOD", alias = "mod", alias = "modifier")]
    Modifier,
}

impl Category {
    /// All categories in catalog order
    pub const ALL: [Category; 8] = [
        Category::Operation,
        Category::Source,
        Category::Parameter,
        Category::ReturnType,
        Category::ControlFlow,
        Category::TypeConstraint,
        Category::ErrorHandling,
        Category::Modifier,
    ];

    /// Canonical (uppercase) wire prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Operation => "OP",
            Self::Source => "SRC",
            Self::Parameter => "PARAM",
            Self::ReturnType => "RET",
            Self::ControlFlow => "CTL",
            Self::TypeConstraint => "TYPE",
            Self::ErrorHandling => "ERR",
            Self::Modifier => "MOD",
        }
    }

    /// Human-readable category name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Operation => "operation",
            Self::Source => "source",
            Self::Parameter => "parameter",
            Self::ReturnType => "return-type",
            Self::ControlFlow => "control-flow",
            Self::TypeConstraint => "type-constraint",
            Self::ErrorHandling => "error-handling",
            Self::Modifier => "modifier",
        }
    }

    /// Parse a wire prefix, ignoring case
    pub fn from_prefix(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OP" => Some(Self::Operation),
            "SRC" => Some(Self::Source),
            "PARAM" => Some(Self::Parameter),
            "RET" => Some(Self::ReturnType),
            "CTL" => Some(Self::ControlFlow),
            "TYPE" => Some(Self::TypeConstraint),
            "ERR" => Some(Self::ErrorHandling),
            "MOD" => Some(Self::Modifier),
            _ => None,
        }
    }

    /// Built-in subtypes for this category
    pub fn builtin_subtypes(&self) -> &'static [&'static str] {
        match self {
            Self::Operation => &[
                "fetch", "parse", "transform", "validate", "compute", "search", "filter", "map",
                "reduce", "aggregate", "process",
            ],
            Self::Source => &["api", "db", "file", "mem", "stream", "queue", "cache"],
            Self::Parameter => &[
                "token", "key", "query", "body", "header", "timeout", "limit", "offset", "times",
            ],
            Self::ReturnType => &[
                "json", "text", "bin", "stream", "bool", "num", "list", "dict", "null",
            ],
            Self::ControlFlow => &[
                "if", "else", "loop", "break", "continue", "try", "catch", "finally",
            ],
            Self::TypeConstraint => &["str", "int", "float", "bool", "list", "dict", "any"],
            Self::ErrorHandling => &["retry", "fail", "log", "ignore"],
            Self::Modifier => &["async", "batch", "parallel", "cached"],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

impl std::str::FromStr for Category {
    type Err = CatalogError;

    /// Accepts wire prefixes (`OP`) and category names (`operation`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(category) = Self::from_prefix(s) {
            return Ok(category);
        }
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == lower || c.name().replace('-', "_") == lower)
            .ok_or_else(|| CatalogError::UnknownCategory(s.to_string()))
    }
}

lazy_static! {
    static ref SUBTYPE_SHAPE: Regex = Regex::new(r"^[a-z][a-z0-9_]*$").unwrap();
}

/// Canonicalize a subtype name, rejecting anything that is not an identifier
pub fn canonical_subtype(subtype: &str) -> Result<String, CatalogError> {
    let lower = subtype.trim().to_ascii_lowercase();
    if SUBTYPE_SHAPE.is_match(&lower) {
        Ok(lower)
    } else {
        Err(CatalogError::InvalidSubtype(subtype.to_string()))
    }
}

/// Immutable snapshot of the token vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCatalog {
    entries: BTreeMap<Category, Vec<String>>,
}

impl Default for TokenCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TokenCatalog {
    /// Catalog holding only the built-in vocabulary
    pub fn builtin() -> Self {
        let entries = Category::ALL
            .into_iter()
            .map(|c| {
                let subtypes = c.builtin_subtypes().iter().map(|s| s.to_string()).collect();
                (c, subtypes)
            })
            .collect();
        Self { entries }
    }

    /// Allowed subtypes for a category, built-ins first
    pub fn subtypes(&self, category: Category) -> &[String] {
        self.entries.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `subtype` (any case) is registered under `category`
    pub fn contains(&self, category: Category, subtype: &str) -> bool {
        self.subtypes(category)
            .iter()
            .any(|s| s.eq_ignore_ascii_case(subtype))
    }

    /// Build a catalog-checked token
    pub fn token(&self, category: Category, subtype: &str) -> Result<Token, CatalogError> {
        let subtype = canonical_subtype(subtype)?;
        if !self.contains(category, &subtype) {
            return Err(CatalogError::UnknownSubtype { category, subtype });
        }
        Ok(Token::new(category, subtype))
    }

    /// Check that an already-built token belongs to this catalog
    pub fn validate(&self, token: &Token) -> Result<(), CatalogError> {
        if self.contains(token.category(), token.subtype()) {
            Ok(())
        } else {
            Err(CatalogError::UnknownSubtype {
                category: token.category(),
                subtype: token.subtype().to_string(),
            })
        }
    }

    /// Resolve a single bracket string such as `[op:FETCH]` or `[PARAM:key=42]`
    ///
    /// Category case is tolerated; the returned token is canonical.
    pub fn lookup(&self, bracket: &str) -> Result<Token, CatalogError> {
        let body = bracket.trim().trim_start_matches('[').trim_end_matches(']');
        let (head, value) = match body.split_once('=') {
            Some((head, value)) => (head, Some(value)),
            None => (body, None),
        };
        let (category, subtype) = head
            .split_once(':')
            .ok_or_else(|| CatalogError::UnknownCategory(head.to_string()))?;
        let category = Category::from_prefix(category)
            .ok_or_else(|| CatalogError::UnknownCategory(category.to_string()))?;
        let token = self.token(category, subtype)?;
        match value {
            Some(value) => token.with_value(value),
            None => Ok(token),
        }
    }

    /// Enumerate `(category, subtype)` pairs, optionally for one category
    pub fn list(&self, category: Option<Category>) -> Vec<(Category, String)> {
        self.entries
            .iter()
            .filter(|(c, _)| category.map_or(true, |want| **c == want))
            .flat_map(|(c, subtypes)| subtypes.iter().map(move |s| (*c, s.clone())))
            .collect()
    }

    /// Total number of registered subtypes
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// New snapshot with one more subtype appended under `category`
    ///
    /// Registering an existing subtype returns an identical catalog.
    pub fn with_custom(&self, category: Category, subtype: &str) -> Result<Self, CatalogError> {
        let subtype = canonical_subtype(subtype)?;
        let mut next = self.clone();
        if !next.contains(category, &subtype) {
            next.entries.entry(category).or_default().push(subtype);
        }
        Ok(next)
    }
}

/// Single-writer registry handing out catalog snapshots
///
/// Readers take an `Arc` snapshot and never block each other; registration
/// copies the current snapshot, appends, and swaps it in.
#[derive(Debug, Default)]
pub struct CatalogRegistry {
    current: RwLock<Arc<TokenCatalog>>,
}

impl CatalogRegistry {
    /// Create a registry seeded with `catalog`
    pub fn new(catalog: TokenCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<TokenCatalog> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a custom subtype and return its token
    ///
    /// Snapshots handed out before this call are unaffected.
    pub fn register_custom(
        &self,
        category: Category,
        subtype: &str,
    ) -> Result<Token, CatalogError> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = current.with_custom(category, subtype)?;
        let token = next.token(category, subtype)?;
        if next != **current {
            tracing::debug!(
                category = %category,
                subtype = token.subtype(),
                "registered custom token"
            );
            *current = Arc::new(next);
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_subtypes() {
        let catalog = TokenCatalog::builtin();
        assert!(catalog.contains(Category::Operation, "fetch"));
        assert!(catalog.contains(Category::Source, "api"));
        assert!(catalog.contains(Category::ReturnType, "json"));
        assert!(!catalog.contains(Category::Source, "fetch"));
    }

    #[test]
    fn test_prefix_case_insensitive() {
        assert_eq!(Category::from_prefix("op"), Some(Category::Operation));
        assert_eq!(Category::from_prefix("Src"), Some(Category::Source));
        assert_eq!(Category::from_prefix("nope"), None);
        assert_eq!("return-type".parse::<Category>(), Ok(Category::ReturnType));
        assert_eq!("ERR".parse::<Category>(), Ok(Category::ErrorHandling));
    }

    #[test]
    fn test_lookup_canonicalizes() {
        let catalog = TokenCatalog::builtin();
        let token = catalog.lookup("[op:FETCH]").unwrap();
        assert_eq!(token.to_string(), "[OP:fetch]");

        let token = catalog.lookup("[PARAM:key=12345]").unwrap();
        assert_eq!(token.value(), Some("12345"));
    }

    #[test]
    fn test_lookup_unknown() {
        let catalog = TokenCatalog::builtin();
        assert!(matches!(
            catalog.lookup("[OP:teleport]"),
            Err(CatalogError::UnknownSubtype { .. })
        ));
        assert!(matches!(
            catalog.lookup("[XYZ:fetch]"),
            Err(CatalogError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_list_filtered() {
        let catalog = TokenCatalog::builtin();
        let ops = catalog.list(Some(Category::Operation));
        assert_eq!(ops.len(), Category::Operation.builtin_subtypes().len());
        assert_eq!(ops[0], (Category::Operation, "fetch".to_string()));
        assert!(ops.iter().all(|(c, _)| *c == Category::Operation));
        assert_eq!(catalog.list(None).len(), catalog.len());
    }

    #[test]
    fn test_register_custom_keeps_old_snapshot() {
        let registry = CatalogRegistry::new(TokenCatalog::builtin());
        let before = registry.snapshot();

        let token = registry.register_custom(Category::Operation, "Summon").unwrap();
        assert_eq!(token.to_string(), "[OP:summon]");

        assert!(!before.contains(Category::Operation, "summon"));
        assert!(registry.snapshot().contains(Category::Operation, "summon"));

        // Custom entries come after built-ins
        let ops = registry.snapshot().list(Some(Category::Operation));
        assert_eq!(ops.last().map(|(_, s)| s.as_str()), Some("summon"));
    }

    #[test]
    fn test_register_custom_idempotent() {
        let registry = CatalogRegistry::new(TokenCatalog::builtin());
        registry.register_custom(Category::Source, "kafka").unwrap();
        let len = registry.snapshot().len();
        registry.register_custom(Category::Source, "KAFKA").unwrap();
        assert_eq!(registry.snapshot().len(), len);
    }

    #[test]
    fn test_register_rejects_bad_subtype() {
        let registry = CatalogRegistry::new(TokenCatalog::builtin());
        assert!(matches!(
            registry.register_custom(Category::Source, "my source"),
            Err(CatalogError::InvalidSubtype(_))
        ));
        assert!(registry.register_custom(Category::Source, "").is_err());
    }
}
