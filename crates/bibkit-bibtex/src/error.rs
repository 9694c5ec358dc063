//! Parse and serialization errors

use bibkit_domain::ValidationResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest source fragment kept in a `ParseError`
pub const MAX_FRAGMENT_CHARS: usize = 40;

/// What went wrong while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseErrorKind {
    UnterminatedBrace,
    UnterminatedQuote,
    UnterminatedEntry,
    UnexpectedToken,
    UndefinedMacro,
    UnknownEntryType,
    NonNumericField,
    NoEntries,
    MultipleEntries,
}

impl ParseErrorKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnterminatedBrace => "unterminated brace",
            Self::UnterminatedQuote => "unterminated quote",
            Self::UnterminatedEntry => "missing closing delimiter for entry",
            Self::UnexpectedToken => "unexpected token",
            Self::UndefinedMacro => "undefined macro",
            Self::UnknownEntryType => "unknown entry type",
            Self::NonNumericField => "numeric field has a non-numeric value",
            Self::NoEntries => "no entries found",
            Self::MultipleEntries => "expected exactly one entry",
        }
    }
}

/// A parse error with the 1-based position and text where it occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: u32,
    pub column: u32,
    pub fragment: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: u32, column: u32, fragment: &str) -> Self {
        Self {
            kind,
            line,
            column,
            fragment: truncate_fragment(fragment),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.kind.description(),
            self.line,
            self.column
        )?;
        if !self.fragment.is_empty() {
            write!(f, ": {:?}", self.fragment)?;
        }
        Ok(())
    }
}

fn truncate_fragment(fragment: &str) -> String {
    let fragment = fragment.trim();
    match fragment.char_indices().nth(MAX_FRAGMENT_CHARS) {
        Some((end, _)) => fragment[..end].to_string(),
        None => fragment.to_string(),
    }
}

/// Error type for parsing and serialization
#[derive(Debug, thiserror::Error)]
pub enum BibTeXError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("entry '{key}' failed validation: {}", .result.errors.join("; "))]
    Validation {
        key: String,
        result: ValidationResult,
    },
}

impl BibTeXError {
    /// The parse error, if this is one
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_is_truncated() {
        let long = "x".repeat(100);
        let err = ParseError::new(ParseErrorKind::UnexpectedToken, 3, 7, &long);
        assert_eq!(err.fragment.chars().count(), MAX_FRAGMENT_CHARS);
    }

    #[test]
    fn test_display_includes_position() {
        let err = ParseError::new(ParseErrorKind::UnterminatedBrace, 2, 11, "{oops");
        assert_eq!(
            err.to_string(),
            "unterminated brace at line 2, column 11: \"{oops\""
        );
    }

    #[test]
    fn test_validation_error_message() {
        let mut result = ValidationResult::new();
        result.add_error("Citation key is required");
        let err = BibTeXError::Validation {
            key: String::new(),
            result,
        };
        assert_eq!(
            err.to_string(),
            "entry '' failed validation: Citation key is required"
        );
    }
}
