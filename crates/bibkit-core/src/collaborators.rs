//! Seams for external collaborators
//!
//! Metadata lookup and citation formatting live outside the core. The core
//! only defines the traits they implement and how their results enter a
//! collection.

use bibkit_domain::Entry;
use bibkit_identifiers::{unique_key, KeyGenerator};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::deduplication::{EntryMatcher, MatchReason};

/// Looks up an entry by identifier (DOI, arXiv id, ...).
///
/// Retries and rate limiting are the implementation's concern.
pub trait MetadataResolver {
    fn resolve(&self, identifier: &str) -> Option<Entry>;
}

/// Renders an entry in one citation style
pub trait CitationFormatter {
    /// Style name used for selection, e.g. `apa`
    fn style(&self) -> &str;
    fn format(&self, entry: &Entry) -> String;
}

/// Formatters selected by style name
#[derive(Default)]
pub struct FormatterSet {
    formatters: Vec<Box<dyn CitationFormatter + Send + Sync>>,
}

impl FormatterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a formatter, replacing any with the same style name
    pub fn register(&mut self, formatter: Box<dyn CitationFormatter + Send + Sync>) {
        let style = formatter.style().to_lowercase();
        self.formatters
            .retain(|f| f.style().to_lowercase() != style);
        self.formatters.push(formatter);
    }

    pub fn with(mut self, formatter: Box<dyn CitationFormatter + Send + Sync>) -> Self {
        self.register(formatter);
        self
    }

    /// Formatter for a style name (case-insensitive)
    pub fn get(&self, style: &str) -> Option<&(dyn CitationFormatter + Send + Sync)> {
        self.formatters
            .iter()
            .find(|f| f.style().eq_ignore_ascii_case(style))
            .map(|f| f.as_ref())
    }

    pub fn format(&self, style: &str, entry: &Entry) -> Option<String> {
        self.get(style).map(|f| f.format(entry))
    }

    pub fn styles(&self) -> Vec<&str> {
        self.formatters.iter().map(|f| f.style()).collect()
    }
}

/// What happened to a resolved entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Added at `index` under `key`
    Imported { index: usize, key: String },
    /// Already present at `index`
    Duplicate { index: usize, reason: MatchReason },
    /// The resolver had nothing for the identifier
    NotFound,
}

/// Resolve `identifier` and add the result to `library`.
///
/// An entry matching one already in the library is reported instead of
/// added. New entries keep their key when it is free, otherwise they get a
/// generated one, made unique against the library.
pub fn import_resolved(
    resolver: &dyn MetadataResolver,
    identifier: &str,
    library: &mut Vec<Entry>,
    matcher: &EntryMatcher,
    keys: &KeyGenerator,
) -> ImportOutcome {
    let Some(mut entry) = resolver.resolve(identifier) else {
        debug!(%identifier, "Resolver returned nothing");
        return ImportOutcome::NotFound;
    };

    if let Some((index, reason)) = matcher.find_match(&entry, library) {
        info!(%identifier, index, ?reason, "Skipping duplicate import");
        return ImportOutcome::Duplicate { index, reason };
    }

    let used: HashSet<String> = library.iter().map(|e| e.key().to_lowercase()).collect();
    let base = if entry.key().trim().is_empty() {
        keys.generate(&entry)
    } else {
        entry.key().to_string()
    };
    let key = unique_key(&base, &used);
    entry.set_key(key.clone());

    library.push(entry);
    info!(%identifier, %key, "Imported entry");
    ImportOutcome::Imported {
        index: library.len() - 1,
        key,
    }
}
