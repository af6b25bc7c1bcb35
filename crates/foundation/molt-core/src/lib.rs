//! # molt-core
//!
//! MoltLang: a compact bracketed token notation for machine-to-machine
//! instructions.
//!
//! ```text
//! English:   Fetch user data from the API and return JSON   (9 words)
//! MoltLang:  [OP:fetch][SRC:api][RET:json]                   (3 tokens)
//! ```
//!
//! This crate holds the pieces every other MoltLang crate shares:
//!
//! - **Catalog** - [`Category`], [`TokenCatalog`] snapshots and the
//!   single-writer [`CatalogRegistry`] for custom subtypes
//! - **Tokens** - [`Token`], [`TokenSequence`] with round-trip-stable
//!   serialization and strict parsing
//! - **Scoring** - confidence from structural completeness, efficiency
//!   from token/word ratio
//! - **Results** - [`TranslationResult`] and the [`Translate`] seam

pub mod catalog;
pub mod lexer;
pub mod result;
pub mod score;
pub mod token;

pub use catalog::{canonical_subtype, Category, CatalogError, CatalogRegistry, TokenCatalog};
pub use lexer::{ParseError, RawShape, RawToken, TokenLexer};
pub use result::{Translate, TranslationResult};
pub use score::{confidence, efficiency, round2, word_count, Completeness};
pub use token::{ParsedSequence, Token, TokenSequence, UnknownToken};

/// Result type for MoltLang operations
pub type Result<T> = std::result::Result<T, MoltError>;

/// Errors a translation call can return
#[derive(Debug, thiserror::Error)]
pub enum MoltError {
    #[error("Input too large: {chars} characters (limit {limit})")]
    InputTooLarge { chars: usize, limit: usize },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
