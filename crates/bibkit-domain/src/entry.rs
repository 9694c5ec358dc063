//! The mutable bibliography entry
//!
//! An `Entry` stores its fields as an ordered list of raw name/value pairs.
//! That list is the only store: authors, editors, year, pages and DOI are
//! typed views that parse from and write back to the raw fields.

use serde::{Deserialize, Serialize};

use crate::author::{join_names, parse_names, Author, NameOrder};
use crate::doi::Doi;
use crate::entry_type::EntryType;
use crate::page_range::PageRange;
use crate::registry::Registry;
use crate::validation::{validate_entry, ValidationResult};

/// Fields whose values hold `and`-separated personal names
pub const NAME_FIELDS: &[&str] = &["author", "editor"];

/// A single raw field; names are stored lower-cased
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_lowercase(),
            value: value.into(),
        }
    }

    pub fn is_name_list(&self) -> bool {
        NAME_FIELDS.contains(&self.name.as_str())
    }
}

/// A bibliography entry: type, citation key and ordered fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    entry_type: EntryType,
    key: String,
    fields: Vec<Field>,
}

impl Entry {
    pub fn new(entry_type: EntryType, key: impl Into<String>) -> Self {
        Self {
            entry_type,
            key: key.into(),
            fields: Vec::new(),
        }
    }

    // ===== Identity =====

    pub fn entry_type(&self) -> &EntryType {
        &self.entry_type
    }

    pub fn set_entry_type(&mut self, entry_type: EntryType) {
        self.entry_type = entry_type;
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    // ===== Raw fields =====

    /// Fields in model order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Get a field value by name (case-insensitive, aliases resolved through
    /// the process-wide registry)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_with(&Registry::global(), name)
    }

    /// Like [`Entry::get`], resolving aliases through `registry`
    pub fn get_with(&self, registry: &Registry, name: &str) -> Option<&str> {
        let name = registry.canonical_field(name);
        self.get_raw(&name)
    }

    /// Get a field by its already canonical, lower-cased name
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a field (case-insensitive, aliases resolved).
    ///
    /// An existing field keeps its position; a new one is appended.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.set_with(&Registry::global(), name, value);
    }

    /// Like [`Entry::set`], resolving aliases through `registry`
    pub fn set_with(&mut self, registry: &Registry, name: &str, value: impl Into<String>) {
        let name = registry.canonical_field(name);
        self.set_raw(&name, value);
    }

    /// Set a field without alias resolution; the name is only lower-cased
    pub fn set_raw(&mut self, name: &str, value: impl Into<String>) {
        let name = name.trim().to_lowercase();
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = value,
            None => self.fields.push(Field { name, value }),
        }
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.remove_with(&Registry::global(), name)
    }

    /// Like [`Entry::remove`], resolving aliases through `registry`
    pub fn remove_with(&mut self, registry: &Registry, name: &str) -> Option<String> {
        let name = registry.canonical_field(name);
        let index = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(index).value)
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    // ===== Names =====

    /// Authors parsed from the `author` field
    pub fn authors(&self) -> Vec<Author> {
        self.get_raw("author").map(parse_names).unwrap_or_default()
    }

    /// Editors parsed from the `editor` field
    pub fn editors(&self) -> Vec<Author> {
        self.get_raw("editor").map(parse_names).unwrap_or_default()
    }

    /// Replace the authors; an empty list removes the field
    pub fn set_authors(&mut self, authors: &[Author]) {
        self.set_names("author", authors);
    }

    pub fn set_editors(&mut self, editors: &[Author]) {
        self.set_names("editor", editors);
    }

    pub fn add_author(&mut self, author: Author) {
        let mut authors = self.authors();
        authors.push(author);
        self.set_authors(&authors);
    }

    pub fn add_editor(&mut self, editor: Author) {
        let mut editors = self.editors();
        editors.push(editor);
        self.set_editors(&editors);
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.add_author(author);
        self
    }

    pub fn with_editor(mut self, editor: Author) -> Self {
        self.add_editor(editor);
        self
    }

    fn set_names(&mut self, field: &str, names: &[Author]) {
        if names.is_empty() {
            self.fields.retain(|f| f.name != field);
        } else {
            self.set_raw(field, join_names(names, NameOrder::LastFirst));
        }
    }

    // ===== Typed views =====

    /// Year as an integer; `None` when absent or not numeric
    pub fn year(&self) -> Option<i32> {
        self.get_raw("year")?.trim().parse().ok()
    }

    pub fn set_year(&mut self, year: i32) {
        self.set_raw("year", year.to_string());
    }

    /// Pages as a range; `None` when absent or unparseable
    pub fn pages(&self) -> Option<PageRange> {
        self.get_raw("pages")?.parse().ok()
    }

    pub fn set_pages(&mut self, pages: PageRange) {
        self.set_raw("pages", pages.to_canonical_string());
    }

    /// Normalized DOI; `None` when absent or invalid
    pub fn doi(&self) -> Option<Doi> {
        self.get_raw("doi").and_then(|doi| Doi::parse(doi).ok())
    }

    pub fn set_doi(&mut self, doi: Doi) {
        self.set_raw("doi", String::from(doi));
    }

    pub fn title(&self) -> Option<&str> {
        self.get_raw("title")
    }

    pub fn journal(&self) -> Option<&str> {
        self.get_raw("journal")
    }

    pub fn booktitle(&self) -> Option<&str> {
        self.get_raw("booktitle")
    }

    pub fn publisher(&self) -> Option<&str> {
        self.get_raw("publisher")
    }

    pub fn volume(&self) -> Option<&str> {
        self.get_raw("volume")
    }

    pub fn number(&self) -> Option<&str> {
        self.get_raw("number")
    }

    pub fn url(&self) -> Option<&str> {
        self.get_raw("url")
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.get_raw("abstract")
    }

    pub fn note(&self) -> Option<&str> {
        self.get_raw("note")
    }

    // ===== Validation =====

    /// Validate against the process-wide registry
    pub fn validate(&self) -> ValidationResult {
        validate_entry(self, &Registry::global())
    }
}

/// Semantic equality: same type and key, same set of field names, name lists
/// compared as parsed authors and every other field by exact value. Field
/// order is ignored.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        if self.entry_type != other.entry_type
            || self.key != other.key
            || self.fields.len() != other.fields.len()
        {
            return false;
        }
        self.fields.iter().all(|field| match other.get_raw(&field.name) {
            None => false,
            Some(value) if field.is_name_list() => {
                parse_names(&field.value) == parse_names(value)
            }
            Some(value) => field.value == value,
        })
    }
}

impl Eq for Entry {}
