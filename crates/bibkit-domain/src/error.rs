//! Error types for the entry model

use thiserror::Error;

/// Failure to construct a value type from invalid input.
///
/// Construction errors are always fatal at the point of construction; values are
/// never silently coerced into range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("page number must be non-negative, got {0}")]
    NegativePage(i64),

    #[error("end page {end} precedes start page {start}")]
    EndBeforeStart { start: u32, end: u32 },

    #[error("invalid page range: {0:?}")]
    InvalidPageRange(String),

    #[error("{0} must not be empty")]
    EmptyName(&'static str),

    #[error("invalid DOI: {0:?}")]
    InvalidDoi(String),
}

/// Failure to register a custom entry type or field alias
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("entry type {0:?} conflicts with a standard entry type")]
    StandardTypeConflict(String),

    #[error("alias {0:?} cannot map to itself")]
    SelfAlias(String),

    #[error("name must not be empty")]
    EmptyName,
}
