//! # molt-config
//!
//! Configuration for MoltLang translation and validation.
//!
//! Resolution order, later wins:
//!
//! 1. Built-in defaults
//! 2. YAML file (`--config <path>`, else `<config_dir>/moltlang/config.yaml`)
//! 3. Environment: `MOLT_MAX_INPUT`, `MOLT_MIN_EFFICIENCY`,
//!    `MOLT_CONFIDENCE_THRESHOLD`
//!
//! ```yaml
//! max_input_chars: 20000
//! min_token_efficiency: 0.4
//! custom_tokens:
//!   - category: OP
//!     subtype: summarize_thread
//! ```

use molt_core::{CatalogError, CatalogRegistry, Category, TokenCatalog};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on `return_lookahead`, in characters
pub const MAX_RETURN_LOOKAHEAD: usize = 1024;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{field} must be between 0.0 and 1.0, got {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("max_input_chars must be greater than zero")]
    ZeroInputLimit,

    #[error("return_lookahead must be at most {limit}, got {value}")]
    LookaheadTooLarge { value: usize, limit: usize },

    #[error("Invalid value '{value}' for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Custom token rejected: {0}")]
    Catalog(#[from] CatalogError),
}

/// A subtype to register in the catalog at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomToken {
    pub category: Category,
    pub subtype: String,
}

/// MoltLang configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoltConfig {
    /// Longest accepted forward input, in characters
    pub max_input_chars: usize,
    /// Efficiency below this is flagged by the validator
    pub min_token_efficiency: f64,
    /// Confidence below this is flagged by the validator
    pub confidence_threshold: f64,
    /// Round-trip similarity below this is a warning rather than info
    pub roundtrip_warn_below: f64,
    /// Characters scanned after "<op> to" for a return cue
    pub return_lookahead: usize,
    /// Extra catalog subtypes
    pub custom_tokens: Vec<CustomToken>,
}

impl Default for MoltConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 10_000,
            min_token_efficiency: 0.5,
            confidence_threshold: 0.7,
            roundtrip_warn_below: 0.3,
            return_lookahead: 24,
            custom_tokens: Vec::new(),
        }
    }
}

impl MoltConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("moltlang").join("config.yaml"))
    }

    /// Load from `path`, or the default location if it exists, then apply
    /// environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML file; missing fields take defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&raw)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply `MOLT_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MOLT_MAX_INPUT") {
            self.max_input_chars = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "MOLT_MAX_INPUT",
                value,
            })?;
        }
        if let Some(value) = lookup("MOLT_MIN_EFFICIENCY") {
            self.min_token_efficiency = parse_ratio("MOLT_MIN_EFFICIENCY", value)?;
        }
        if let Some(value) = lookup("MOLT_CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = parse_ratio("MOLT_CONFIDENCE_THRESHOLD", value)?;
        }
        Ok(())
    }

    /// Check ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_chars == 0 {
            return Err(ConfigError::ZeroInputLimit);
        }
        if self.return_lookahead > MAX_RETURN_LOOKAHEAD {
            return Err(ConfigError::LookaheadTooLarge {
                value: self.return_lookahead,
                limit: MAX_RETURN_LOOKAHEAD,
            });
        }
        let ratios = [
            ("min_token_efficiency", self.min_token_efficiency),
            ("confidence_threshold", self.confidence_threshold),
            ("roundtrip_warn_below", self.roundtrip_warn_below),
        ];
        for (field, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Catalog registry seeded with built-ins plus `custom_tokens`
    pub fn catalog_registry(&self) -> Result<CatalogRegistry, ConfigError> {
        let registry = CatalogRegistry::new(TokenCatalog::builtin());
        for custom in &self.custom_tokens {
            registry.register_custom(custom.category, &custom.subtype)?;
        }
        Ok(registry)
    }
}

fn parse_ratio(var: &'static str, value: String) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
