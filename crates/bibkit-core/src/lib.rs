//! bibkit-core: bibliography core library
//!
//! This library ties the bibkit crates together and provides:
//! - BibTeX parsing and serialization (re-exported from `bibkit_bibtex`)
//! - Entry model and author names (re-exported from `bibkit_domain`)
//! - Citation key generation (re-exported from `bibkit_identifiers`)
//! - Entry matching and duplicate grouping
//! - Configuration loaded from TOML or JSON
//! - Traits for metadata resolvers and citation formatters

pub mod collaborators;
pub mod config;
pub mod deduplication;

pub use bibkit_bibtex as bibtex;
pub use bibkit_domain as domain;
pub use bibkit_identifiers as identifiers;

// Re-export main types for convenience
pub use bibkit_bibtex::{
    BibTeXError, Document, Parser, ParseError, ParseErrorKind, ParserSettings, Serializer,
    SerializerSettings,
};
pub use bibkit_domain::{Author, Entry, EntryType, Registry, ValidationResult};
pub use bibkit_identifiers::{KeyFormat, KeyGenerator};
pub use collaborators::{
    import_resolved, CitationFormatter, FormatterSet, ImportOutcome, MetadataResolver,
};
pub use config::{BibkitConfig, ConfigError, KeyConfig};
pub use deduplication::{
    DeduplicationReport, DuplicateGroup, EntryMatcher, MatchReason, MatcherSettings,
};
