//! Validation for entries

use serde::{Deserialize, Serialize};

use crate::doi::Doi;
use crate::entry::Entry;
use crate::page_range::PageRange;
use crate::registry::Registry;

/// Errors and warnings found while validating.
///
/// Only errors affect validity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Concatenate errors and warnings, `self` first
    pub fn merge(mut self, other: ValidationResult) -> ValidationResult {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self
    }
}

/// Validate an entry against the schema known to `registry`
pub fn validate_entry(entry: &Entry, registry: &Registry) -> ValidationResult {
    let mut result = ValidationResult::new();

    if entry.key().trim().is_empty() {
        result.add_error("Citation key is required");
    }

    // Required fields
    match registry.schema(entry.entry_type()) {
        Some(schema) => {
            let has = |name: &str| {
                entry
                    .get_raw(name)
                    .map(|v| !v.trim().is_empty())
                    .unwrap_or(false)
            };
            for slot in schema.missing_required(has) {
                let names = slot.replace('/', "' or '");
                result.add_error(format!(
                    "Missing required field '{}' for {} entries",
                    names,
                    entry.entry_type()
                ));
            }
        }
        None => result.add_warning(format!(
            "Unknown entry type '{}'; required fields not checked",
            entry.entry_type()
        )),
    }

    // Typed fields must parse
    if let Some(year) = entry.get_raw("year") {
        if entry.year().is_none() {
            result.add_error(format!("Year must be numeric, got '{}'", year));
        }
    }

    if let Some(pages) = entry.get_raw("pages") {
        if let Err(e) = pages.parse::<PageRange>() {
            result.add_error(format!("Invalid pages: {}", e));
        }
    }

    if let Some(doi) = entry.get_raw("doi") {
        match Doi::parse(doi) {
            Ok(doi) if !doi.has_standard_prefix() => {
                result.add_warning("DOI should start with '10.'");
            }
            Ok(_) => {}
            Err(e) => result.add_error(e.to_string()),
        }
    }

    if entry.authors().is_empty() && entry.editors().is_empty() {
        result.add_warning("Authors are recommended");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_type::{EntryType, FieldSchema};

    fn complete_article() -> Entry {
        Entry::new(EntryType::Article, "smith2024")
            .with_field("author", "John Smith")
            .with_field("title", "A Paper")
            .with_field("journal", "Nature")
            .with_field("year", "2024")
    }

    #[test]
    fn test_complete_article_is_valid() {
        let result = validate_entry(&complete_article(), &Registry::new());
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_missing_required_fields() {
        let entry = Entry::new(EntryType::Article, "k").with_field("title", "T");
        let result = validate_entry(&entry, &Registry::new());
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors[0].contains("'author'"));
    }

    #[test]
    fn test_alternative_required_field() {
        let entry = Entry::new(EntryType::Book, "b")
            .with_field("editor", "Ed Itor")
            .with_field("title", "T")
            .with_field("publisher", "P")
            .with_field("year", "2000");
        assert!(validate_entry(&entry, &Registry::new()).is_valid());

        let entry = Entry::new(EntryType::Book, "b").with_field("title", "T");
        let result = validate_entry(&entry, &Registry::new());
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("'author' or 'editor'")));
    }

    #[test]
    fn test_empty_key_and_bad_typed_fields() {
        let mut entry = complete_article()
            .with_field("year", "soon")
            .with_field("pages", "20--10")
            .with_field("doi", "https://doi.org/");
        entry.set_key("");
        let result = validate_entry(&entry, &Registry::new());
        assert_eq!(result.errors.len(), 4);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_warnings_do_not_affect_validity() {
        let entry = complete_article().with_field("doi", "11.5/abc");
        let result = validate_entry(&entry, &Registry::new());
        assert!(result.is_valid());
        assert_eq!(result.warnings, vec!["DOI should start with '10.'"]);
    }

    #[test]
    fn test_custom_type_schema() {
        let registry = Registry::new();
        let ty = registry
            .register_type("software", FieldSchema::new(["title", "version"], Vec::<String>::new()))
            .unwrap();
        let entry = Entry::new(ty, "tool").with_field("title", "Tool");
        let result = validate_entry(&entry, &registry);
        assert_eq!(result.errors.len(), 1);

        let unknown = Entry::new(EntryType::from_name("dataset"), "d");
        let result = validate_entry(&unknown, &registry);
        assert!(result.is_valid());
        assert!(result.warnings[0].contains("Unknown entry type"));
    }

    #[test]
    fn test_merge_concatenates() {
        let mut a = ValidationResult::new();
        a.add_error("e1");
        a.add_warning("w1");
        let mut b = ValidationResult::new();
        b.add_error("e2");
        let merged = a.merge(b);
        assert_eq!(merged.errors, vec!["e1", "e2"]);
        assert_eq!(merged.warnings, vec!["w1"]);
        assert_eq!(merged.clone(), merged);
    }
}
