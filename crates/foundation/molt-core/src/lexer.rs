//! Bracket lexer for MoltLang token strings
//!
//! Splits `[A:b][C:d=e]` into raw bracket tokens and checks each one's shape.
//! Bracket balance is checked before anything else so an unclosed bracket is
//! always reported as such, never as a malformed token.

use crate::catalog::Category;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Token string parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unbalanced brackets at offset {offset}")]
    UnbalancedBrackets { offset: usize },

    #[error("Malformed token {token}: {reason}")]
    MalformedToken { token: String, reason: String },

    #[error("Unknown category '{category}' in {token}")]
    UnknownCategory { token: String, category: String },
}

lazy_static! {
    static ref TOKEN_SHAPE: Regex =
        Regex::new(r"^([A-Za-z]+):([A-Za-z][A-Za-z0-9_]*)(?:=([^\[\]]+))?$").unwrap();
}

/// One `[...]` span in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken<'a> {
    /// Byte offset of `[`
    pub offset: usize,
    text: &'a str,
}

impl<'a> RawToken<'a> {
    /// Full text including brackets
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Text between the brackets
    pub fn body(&self) -> &'a str {
        &self.text[1..self.text.len() - 1]
    }

    /// Split into category, subtype and value
    pub fn shape(&self) -> Result<RawShape<'a>, ParseError> {
        let caps = TOKEN_SHAPE
            .captures(self.body())
            .ok_or_else(|| ParseError::MalformedToken {
                token: self.text.to_string(),
                reason: "expected CATEGORY:subtype or CATEGORY:subtype=value".to_string(),
            })?;

        // Groups 1 and 2 are mandatory in the pattern
        let (Some(category), Some(subtype)) = (caps.get(1), caps.get(2)) else {
            return Err(ParseError::MalformedToken {
                token: self.text.to_string(),
                reason: "missing category or subtype".to_string(),
            });
        };

        Ok(RawShape {
            category_text: category.as_str(),
            subtype_text: subtype.as_str(),
            value: caps.get(3).map(|m| m.as_str()),
        })
    }
}

/// Shape-checked pieces of a raw token, case as written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawShape<'a> {
    pub category_text: &'a str,
    pub subtype_text: &'a str,
    pub value: Option<&'a str>,
}

impl RawShape<'_> {
    pub fn category(&self) -> Option<Category> {
        Category::from_prefix(self.category_text)
    }

    /// Uppercase category and lowercase subtype
    pub fn is_canonical_case(&self) -> bool {
        let upper = self.category_text.chars().all(|c| c.is_ascii_uppercase());
        let lower = !self.subtype_text.chars().any(|c| c.is_ascii_uppercase());
        upper && lower
    }
}

/// The token string lexer
pub struct TokenLexer<'a> {
    input: &'a str,
}

impl<'a> TokenLexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Check that every `[` closes before the next one opens
    pub fn check_balance(&self) -> Result<(), ParseError> {
        let mut open: Option<usize> = None;
        for (offset, c) in self.input.char_indices() {
            match (c, open) {
                ('[', Some(_)) | (']', None) => {
                    return Err(ParseError::UnbalancedBrackets { offset });
                }
                ('[', None) => open = Some(offset),
                (']', Some(_)) => open = None,
                _ => {}
            }
        }
        match open {
            Some(offset) => Err(ParseError::UnbalancedBrackets { offset }),
            None => Ok(()),
        }
    }

    /// Split the input into raw bracket tokens
    ///
    /// Whitespace between tokens is allowed; any other text outside brackets
    /// is a malformed token.
    pub fn tokenize_all(&self) -> Result<Vec<RawToken<'a>>, ParseError> {
        self.check_balance()?;

        let mut tokens = Vec::new();
        let mut rest = self.input;
        let mut base = 0;

        loop {
            let trimmed = rest.trim_start();
            base += rest.len() - trimmed.len();
            rest = trimmed;
            if rest.is_empty() {
                break;
            }

            if !rest.starts_with('[') {
                let stray = rest.split('[').next().unwrap_or(rest).trim_end();
                return Err(ParseError::MalformedToken {
                    token: stray.to_string(),
                    reason: "text outside brackets".to_string(),
                });
            }

            // Balanced, so a closing bracket exists
            let Some(close) = rest.find(']') else {
                return Err(ParseError::UnbalancedBrackets { offset: base });
            };
            tokens.push(RawToken {
                offset: base,
                text: &rest[..=close],
            });
            base += close + 1;
            rest = &rest[close + 1..];
        }

        Ok(tokens)
    }
}
