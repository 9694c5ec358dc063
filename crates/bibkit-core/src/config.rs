//! Configuration for bibkit-core
//!
//! Aggregates parser, serializer, key generation and matching settings so
//! they can be loaded from one TOML or JSON document.

use bibkit_bibtex::{Parser, ParserSettings, Serializer, SerializerSettings};
use bibkit_domain::Registry;
use bibkit_identifiers::{KeyFormat, KeyGenerator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::deduplication::{EntryMatcher, MatcherSettings};

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BibkitConfig {
    pub parser: ParserSettings,
    pub serializer: SerializerSettings,
    pub keys: KeyConfig,
    pub matcher: MatcherSettings,
}

/// Citation key settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub format: KeyFormat,
    /// Entries that already have a key keep it
    pub preserve_existing: bool,
}

/// Configuration loading or validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

impl BibkitConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a `.toml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = match extension(path).as_deref() {
            Some("toml") => Self::from_toml(&text)?,
            Some("json") => Self::from_json(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        config.validate()?;
        Ok(config)
    }

    /// Write to a `.toml` or `.json` file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = match extension(path).as_deref() {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("matcher.title_threshold", self.matcher.title_threshold),
            ("matcher.author_overlap", self.matcher.author_overlap),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange(format!(
                    "{} must be between 0.0 and 1.0",
                    name
                )));
            }
        }

        if self.serializer.max_line_length == Some(0) {
            return Err(ConfigError::OutOfRange(
                "serializer.max_line_length must be positive when set".to_string(),
            ));
        }

        Ok(())
    }

    pub fn parser(&self) -> Parser {
        Parser::new(self.parser.clone())
    }

    pub fn parser_with_registry(&self, registry: Arc<Registry>) -> Parser {
        Parser::with_registry(self.parser.clone(), registry)
    }

    pub fn serializer(&self) -> Serializer {
        Serializer::new(self.serializer.clone())
    }

    pub fn serializer_with_registry(&self, registry: Arc<Registry>) -> Serializer {
        Serializer::with_registry(self.serializer.clone(), registry)
    }

    pub fn key_generator(&self) -> KeyGenerator {
        KeyGenerator::new(self.keys.format)
    }

    pub fn matcher(&self) -> EntryMatcher {
        EntryMatcher::new(self.matcher.clone())
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
