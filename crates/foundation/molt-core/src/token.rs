//! MoltLang tokens and token sequences
//!
//! A token serializes as `[CATEGORY:subtype]` or `[CATEGORY:subtype=value]`.
//! Categories are uppercase on the wire, subtypes and values lowercase.
//!
//! ```text
//! [OP:fetch][SRC:api][PARAM:key=12345][RET:json]
//! ```

use crate::catalog::{canonical_subtype, Category, CatalogError, TokenCatalog};
use crate::lexer::{ParseError, TokenLexer};
use serde::Serialize;

/// A single MoltLang token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    category: Category,
    subtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    /// Index within the owning sequence
    position: usize,
}

impl Token {
    /// Create a token without consulting a catalog
    ///
    /// The subtype is lowercased. Use [`TokenCatalog::token`] when the
    /// subtype comes from outside the crate.
    pub fn new(category: Category, subtype: impl Into<String>) -> Self {
        Self {
            category,
            subtype: subtype.into().to_ascii_lowercase(),
            value: None,
            position: 0,
        }
    }

    /// Attach a literal payload
    pub fn with_value(mut self, value: &str) -> Result<Self, CatalogError> {
        let value = value.trim();
        if value.is_empty() || value.contains(|c| c == '[' || c == ']') {
            return Err(CatalogError::InvalidValue(value.to_string()));
        }
        self.value = Some(value.to_lowercase());
        Ok(self)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Same category and subtype, ignoring value and position
    pub fn is(&self, category: Category, subtype: &str) -> bool {
        self.category == category && self.subtype == subtype
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "[{}:{}={}]", self.category.prefix(), self.subtype, value),
            None => write!(f, "[{}:{}]", self.category.prefix(), self.subtype),
        }
    }
}

/// Ordered token list; insertion order is wire order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TokenSequence {
    tokens: Vec<Token>,
}

impl TokenSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a token, assigning its position
    pub fn push(&mut self, mut token: Token) -> &mut Self {
        token.position = self.tokens.len();
        self.tokens.push(token);
        self
    }

    /// Insert a token at `index` (clamped to the end) and renumber
    pub fn insert(&mut self, index: usize, token: Token) {
        let index = index.min(self.tokens.len());
        self.tokens.insert(index, token);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (i, token) in self.tokens.iter_mut().enumerate() {
            token.position = i;
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Whether any token has this category and subtype
    pub fn contains(&self, category: Category, subtype: &str) -> bool {
        self.tokens.iter().any(|t| t.is(category, subtype))
    }

    /// Whether any token belongs to `category`
    pub fn has_category(&self, category: Category) -> bool {
        self.tokens.iter().any(|t| t.category == category)
    }

    /// Index of the first token in `category`
    pub fn first_of(&self, category: Category) -> Option<usize> {
        self.tokens.iter().position(|t| t.category == category)
    }

    /// `1 - tokens / words`; `None` when there are no words
    ///
    /// Negative when the token form is longer than the original.
    pub fn efficiency(&self, original_word_count: usize) -> Option<f64> {
        if original_word_count == 0 {
            return None;
        }
        Some(1.0 - (self.tokens.len() as f64 / original_word_count as f64))
    }

    /// Strictly parse a bracket string against `catalog`
    ///
    /// Unbalanced brackets, malformed tokens and unknown categories are
    /// fatal. Unknown subtypes are collected in [`ParsedSequence::unknown`]
    /// so the rest of the string still parses.
    pub fn parse(input: &str, catalog: &TokenCatalog) -> Result<ParsedSequence, ParseError> {
        let mut parsed = ParsedSequence::default();

        for (index, raw) in TokenLexer::new(input).tokenize_all()?.into_iter().enumerate() {
            let shape = raw.shape()?;
            let category = shape.category().ok_or_else(|| ParseError::UnknownCategory {
                token: raw.text().to_string(),
                category: shape.category_text.to_string(),
            })?;
            let malformed = |e: CatalogError| ParseError::MalformedToken {
                token: raw.text().to_string(),
                reason: e.to_string(),
            };

            let subtype = canonical_subtype(shape.subtype_text).map_err(malformed)?;
            if !catalog.contains(category, &subtype) {
                tracing::debug!(token = raw.text(), "skipping unknown subtype");
                parsed.unknown.push(UnknownToken {
                    index,
                    offset: raw.offset,
                    category,
                    subtype,
                    raw: raw.text().to_string(),
                });
                continue;
            }

            let mut token = Token::new(category, subtype);
            if let Some(value) = shape.value {
                token = token.with_value(value).map_err(malformed)?;
            }
            parsed.sequence.push(token);
        }

        Ok(parsed)
    }
}

impl std::fmt::Display for TokenSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for token in &self.tokens {
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

impl FromIterator<Token> for TokenSequence {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        let mut sequence = Self::new();
        for token in iter {
            sequence.push(token);
        }
        sequence
    }
}

impl<'a> IntoIterator for &'a TokenSequence {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// A well-formed token whose subtype the catalog does not know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToken {
    /// Index among all bracket tokens in the input
    pub index: usize,
    /// Byte offset of the opening bracket
    pub offset: usize,
    pub category: Category,
    pub subtype: String,
    pub raw: String,
}

/// Result of [`TokenSequence::parse`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSequence {
    pub sequence: TokenSequence,
    pub unknown: Vec<UnknownToken>,
}
