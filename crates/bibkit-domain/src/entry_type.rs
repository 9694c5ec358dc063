//! Entry types and their field schemas

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Entry type tag.
///
/// The fourteen classic kinds are variants; anything else is either a
/// registered `Custom` type or an `Unknown` one the parser passed through.
/// Two types are equal when their names are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryType {
    Article,
    Book,
    Booklet,
    Conference,
    InBook,
    InCollection,
    InProceedings,
    Manual,
    MastersThesis,
    Misc,
    PhdThesis,
    Proceedings,
    TechReport,
    Unpublished,
    Custom(String),
    Unknown(String),
}

impl EntryType {
    pub const STANDARD: [EntryType; 14] = [
        EntryType::Article,
        EntryType::Book,
        EntryType::Booklet,
        EntryType::Conference,
        EntryType::InBook,
        EntryType::InCollection,
        EntryType::InProceedings,
        EntryType::Manual,
        EntryType::MastersThesis,
        EntryType::Misc,
        EntryType::PhdThesis,
        EntryType::Proceedings,
        EntryType::TechReport,
        EntryType::Unpublished,
    ];

    /// Look up a standard type by name (case-insensitive)
    pub fn standard(name: &str) -> Option<Self> {
        let ty = match name.trim().to_lowercase().as_str() {
            "article" => Self::Article,
            "book" => Self::Book,
            "booklet" => Self::Booklet,
            "conference" => Self::Conference,
            "inbook" => Self::InBook,
            "incollection" => Self::InCollection,
            "inproceedings" => Self::InProceedings,
            "manual" => Self::Manual,
            "mastersthesis" => Self::MastersThesis,
            "misc" => Self::Misc,
            "phdthesis" => Self::PhdThesis,
            "proceedings" => Self::Proceedings,
            "techreport" => Self::TechReport,
            "unpublished" => Self::Unpublished,
            _ => return None,
        };
        Some(ty)
    }

    /// Standard type for `name`, or `Unknown` carrying the lower-cased name.
    ///
    /// Does not consult the registry; use `Registry::resolve_type` for that.
    pub fn from_name(name: &str) -> Self {
        Self::standard(name).unwrap_or_else(|| Self::Unknown(name.trim().to_lowercase()))
    }

    /// Canonical lower-case name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Article => "article",
            Self::Book => "book",
            Self::Booklet => "booklet",
            Self::Conference => "conference",
            Self::InBook => "inbook",
            Self::InCollection => "incollection",
            Self::InProceedings => "inproceedings",
            Self::Manual => "manual",
            Self::MastersThesis => "mastersthesis",
            Self::Misc => "misc",
            Self::PhdThesis => "phdthesis",
            Self::Proceedings => "proceedings",
            Self::TechReport => "techreport",
            Self::Unpublished => "unpublished",
            Self::Custom(name) | Self::Unknown(name) => name,
        }
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, Self::Custom(_) | Self::Unknown(_))
    }

    /// Conference-like types whose venue lives in `booktitle`
    pub fn is_conference(&self) -> bool {
        matches!(
            self,
            Self::Conference | Self::InProceedings | Self::Proceedings
        )
    }

    /// Field schema of a standard type; `None` for custom and unknown types
    pub fn standard_schema(&self) -> Option<FieldSchema> {
        let (required, optional): (&[&str], &[&str]) = match self {
            Self::Article => (
                &["author", "title", "journal", "year"],
                &["volume", "number", "pages", "month", "note"],
            ),
            Self::Book => (
                &["author/editor", "title", "publisher", "year"],
                &[
                    "volume", "number", "series", "address", "edition", "month", "note",
                ],
            ),
            Self::Booklet => (
                &["title"],
                &["author", "howpublished", "address", "month", "year", "note"],
            ),
            Self::Conference | Self::InProceedings => (
                &["author", "title", "booktitle", "year"],
                &[
                    "editor",
                    "volume",
                    "number",
                    "series",
                    "pages",
                    "address",
                    "month",
                    "organization",
                    "publisher",
                    "note",
                ],
            ),
            Self::InBook => (
                &["author/editor", "title", "chapter/pages", "publisher", "year"],
                &[
                    "volume", "number", "series", "type", "address", "edition", "month", "note",
                ],
            ),
            Self::InCollection => (
                &["author", "title", "booktitle", "publisher", "year"],
                &[
                    "editor", "volume", "number", "series", "type", "chapter", "pages",
                    "address", "edition", "month", "note",
                ],
            ),
            Self::Manual => (
                &["title"],
                &[
                    "author",
                    "organization",
                    "address",
                    "edition",
                    "month",
                    "year",
                    "note",
                ],
            ),
            Self::MastersThesis | Self::PhdThesis => (
                &["author", "title", "school", "year"],
                &["type", "address", "month", "note"],
            ),
            Self::Misc => (
                &[],
                &["author", "title", "howpublished", "month", "year", "note"],
            ),
            Self::Proceedings => (
                &["title", "year"],
                &[
                    "editor",
                    "volume",
                    "number",
                    "series",
                    "address",
                    "month",
                    "publisher",
                    "organization",
                    "note",
                ],
            ),
            Self::TechReport => (
                &["author", "title", "institution", "year"],
                &["type", "number", "address", "month", "note"],
            ),
            Self::Unpublished => (&["author", "title", "note"], &["month", "year"]),
            Self::Custom(_) | Self::Unknown(_) => return None,
        };
        Some(FieldSchema::new(
            required.iter().copied(),
            optional.iter().copied(),
        ))
    }
}

impl PartialEq for EntryType {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for EntryType {}

impl Hash for EntryType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EntryType {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl From<EntryType> for String {
    fn from(value: EntryType) -> Self {
        value.as_str().to_string()
    }
}

/// Required and optional field names of an entry type.
///
/// A required slot may list alternatives separated by `/`
/// (`author/editor`); any one of them satisfies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

impl FieldSchema {
    pub fn new<R, O>(required: R, optional: O) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            required: required
                .into_iter()
                .map(|f| f.into().to_lowercase())
                .collect(),
            optional: optional
                .into_iter()
                .map(|f| f.into().to_lowercase())
                .collect(),
        }
    }

    /// Required slots not satisfied by any field for which `has` returns true
    pub fn missing_required(&self, has: impl Fn(&str) -> bool) -> Vec<&str> {
        self.required
            .iter()
            .filter(|slot| !slot.split('/').any(|name| has(name)))
            .map(String::as_str)
            .collect()
    }

    /// Whether `field` is named anywhere in the schema
    pub fn mentions(&self, field: &str) -> bool {
        let field = field.to_lowercase();
        self.required
            .iter()
            .chain(self.optional.iter())
            .any(|slot| slot.split('/').any(|name| name == field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_lookup_is_case_insensitive() {
        assert_eq!(EntryType::standard("ARTICLE"), Some(EntryType::Article));
        assert_eq!(EntryType::standard("PhdThesis"), Some(EntryType::PhdThesis));
        assert_eq!(EntryType::standard("online"), None);
    }

    #[test]
    fn test_every_standard_type_round_trips_by_name() {
        for ty in EntryType::STANDARD.iter() {
            assert_eq!(EntryType::from_name(ty.as_str()), *ty);
            assert!(ty.standard_schema().is_some());
        }
    }

    #[test]
    fn test_unknown_type_keeps_name() {
        let ty = EntryType::from_name("Dataset");
        assert_eq!(ty, EntryType::Unknown("dataset".to_string()));
        assert_eq!(ty.as_str(), "dataset");
        assert!(!ty.is_standard());
        assert!(ty.standard_schema().is_none());
    }

    #[test]
    fn test_custom_and_unknown_compare_by_name() {
        assert_eq!(
            EntryType::Custom("software".into()),
            EntryType::Unknown("software".into())
        );
    }

    #[test]
    fn test_alternative_slots() {
        let schema = EntryType::Book.standard_schema().unwrap();
        let missing = schema.missing_required(|f| matches!(f, "editor" | "title" | "year"));
        assert_eq!(missing, vec!["publisher"]);
        assert!(schema.mentions("Editor"));
        assert!(!schema.mentions("journal"));
    }
}
