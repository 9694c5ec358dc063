//! Cite key generation
//!
//! Builds citation keys from entry metadata in one of four formats, and
//! resolves collisions within a batch by appending letter and then number
//! suffixes.

use bibkit_domain::Entry;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Placeholder for an entry without authors
pub const NO_AUTHOR: &str = "noauthor";
/// Placeholder for an entry without a year
pub const NO_DATE: &str = "nodate";
/// Placeholder for an entry without a usable title word
pub const NO_TITLE: &str = "notitle";
/// Key used when cleaning leaves nothing
pub const UNKNOWN_KEY: &str = "unknownkey";

lazy_static! {
    static ref STOPWORDS: HashSet<&'static str> = [
        "a", "an", "the", "on", "in", "of", "for", "to", "and", "with", "by", "from", "as", "at",
        "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
        "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can", "or",
        "into", "via",
    ]
    .into_iter()
    .collect();
}

/// Which parts make up a generated key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFormat {
    /// `smith2020`
    #[default]
    AuthorYear,
    /// `smithdeep2020`
    AuthorTitleYear,
    /// `smidee2020`
    ShortAuthorTitleYear,
    /// `smithprl2020`
    AuthorVenueYear,
}

/// Generates cite keys in one format
#[derive(Debug, Clone, Default)]
pub struct KeyGenerator {
    format: KeyFormat,
}

impl KeyGenerator {
    pub fn new(format: KeyFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> KeyFormat {
        self.format
    }

    /// Cleaned key for one entry, ignoring collisions
    pub fn generate(&self, entry: &Entry) -> String {
        let author = author_part(entry);
        let year = year_part(entry);
        let raw = match self.format {
            KeyFormat::AuthorYear => format!("{}{}", author, year),
            KeyFormat::AuthorTitleYear => format!("{}{}{}", author, title_part(entry), year),
            KeyFormat::ShortAuthorTitleYear => format!(
                "{}{}{}",
                truncate_chars(&author, 3),
                truncate_chars(&title_part(entry), 3),
                year
            ),
            KeyFormat::AuthorVenueYear => format!("{}{}{}", author, venue_part(entry), year),
        };
        clean_key(&raw)
    }

    /// Keys for a batch, unique case-insensitively in first-seen order.
    ///
    /// With `preserve_existing`, entries that already have a key keep it and
    /// every such key is reserved before any key is generated.
    pub fn generate_keys(&self, entries: &[Entry], preserve_existing: bool) -> Vec<String> {
        let keeps = |entry: &Entry| preserve_existing && !entry.key().trim().is_empty();

        let mut used: HashSet<String> = entries
            .iter()
            .filter(|e| keeps(*e))
            .map(|e| e.key().to_lowercase())
            .collect();

        entries
            .iter()
            .map(|entry| {
                if keeps(entry) {
                    return entry.key().to_string();
                }
                let key = unique_key(&self.generate(entry), &used);
                used.insert(key.to_lowercase());
                key
            })
            .collect()
    }

    /// Generate keys for a batch and store them on the entries
    pub fn assign_keys(&self, entries: &mut [Entry], preserve_existing: bool) {
        let keys = self.generate_keys(entries, preserve_existing);
        for (entry, key) in entries.iter_mut().zip(keys) {
            entry.set_key(key);
        }
    }
}

/// Make `base` unique against `used` (lower-cased keys).
///
/// Tries `base`, then `base` + `a`..`z`, then `base` + `1`, `2`, ...
pub fn unique_key(base: &str, used: &HashSet<String>) -> String {
    let taken = |candidate: &str| used.contains(&candidate.to_lowercase());
    if !taken(base) {
        return base.to_string();
    }

    for suffix in 'a'..='z' {
        let candidate = format!("{}{}", base, suffix);
        if !taken(&candidate) {
            trace!(%base, %candidate, "Resolved key collision with letter suffix");
            return candidate;
        }
    }

    let mut counter = 1u64;
    loop {
        let candidate = format!("{}{}", base, counter);
        if !taken(&candidate) {
            trace!(%base, %candidate, "Resolved key collision with number suffix");
            return candidate;
        }
        counter += 1;
    }
}

// ===== Extractors =====

/// Lower-cased last name of the first author, or `noauthor`
pub fn author_part(entry: &Entry) -> String {
    entry
        .authors()
        .first()
        .map(|a| strip_braces(a.last()).to_lowercase())
        .filter(|last| !last.trim().is_empty())
        .unwrap_or_else(|| NO_AUTHOR.to_string())
}

/// Publication year, or `nodate`
pub fn year_part(entry: &Entry) -> String {
    match entry.year() {
        Some(year) => year.to_string(),
        None => entry
            .get("year")
            .map(str::trim)
            .filter(|y| !y.is_empty())
            .map_or_else(|| NO_DATE.to_string(), str::to_string),
    }
}

/// First non-stop-word of the title, lower-cased, or `notitle`
pub fn title_part(entry: &Entry) -> String {
    entry
        .title()
        .and_then(|title| significant_words(title).next())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

/// Initials of the journal (book title for conference entries), falling
/// back to the entry type name
pub fn venue_part(entry: &Entry) -> String {
    let venue = if entry.entry_type().is_conference() {
        entry.booktitle().or_else(|| entry.journal())
    } else {
        entry.journal().or_else(|| entry.booktitle())
    };

    let initials: Option<String> = venue
        .map(|v| {
            significant_words(v)
                .filter_map(|word| word.chars().next())
                .collect::<String>()
        })
        .filter(|initials| !initials.is_empty());
    initials.unwrap_or_else(|| entry.entry_type().as_str().to_string())
}

/// Lower-cased words with punctuation removed, stop words skipped
fn significant_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| !word.is_empty() && !STOPWORDS.contains(word.as_str()))
}

fn strip_braces(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '{' | '}')).collect()
}

fn truncate_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

// ===== Cleaning =====

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.')
}

/// Fold to ASCII and reduce to key-safe characters.
///
/// Other characters become `-`, runs of `-` collapse and leading or trailing
/// ones are trimmed. An empty result becomes `unknownkey`.
pub fn clean_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for c in raw.nfkd().filter(|c| !is_combining_mark(*c)) {
        let c = if is_key_char(c) { c } else { '-' };
        if c == '-' && key.ends_with('-') {
            continue;
        }
        key.push(c);
    }

    let key = key.trim_matches('-');
    if key.is_empty() {
        UNKNOWN_KEY.to_string()
    } else {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibkit_domain::{Author, EntryType};
    use proptest::prelude::*;
    use rstest::rstest;

    fn article(last: &str, year: i32, title: &str) -> Entry {
        let mut entry = Entry::new(EntryType::Article, "")
            .with_author(Author::new(last).unwrap().with_first("A."))
            .with_field("title", title);
        entry.set_year(year);
        entry
    }

    #[rstest]
    #[case(KeyFormat::AuthorYear, "smith2020")]
    #[case(KeyFormat::AuthorTitleYear, "smithdeep2020")]
    #[case(KeyFormat::ShortAuthorTitleYear, "smidee2020")]
    #[case(KeyFormat::AuthorVenueYear, "smithprl2020")]
    fn test_formats(#[case] format: KeyFormat, #[case] expected: &str) {
        let entry = article("Smith", 2020, "The Deep Structure of Things")
            .with_field("journal", "Physical Review Letters");
        assert_eq!(KeyGenerator::new(format).generate(&entry), expected);
    }

    #[test]
    fn test_placeholders() {
        let entry = Entry::new(EntryType::Misc, "");
        assert_eq!(
            KeyGenerator::new(KeyFormat::AuthorTitleYear).generate(&entry),
            "noauthornotitlenodate"
        );
        assert_eq!(
            KeyGenerator::new(KeyFormat::AuthorVenueYear).generate(&entry),
            "noauthormiscnodate"
        );
    }

    #[test]
    fn test_particle_last_name_without_given_name() {
        let mut entry = Entry::new(EntryType::Book, "").with_author(Author::new("de Gaulle").unwrap());
        entry.set_year(1954);
        assert_eq!(author_part(&entry), "de gaulle");
        assert_eq!(KeyGenerator::default().generate(&entry), "de-gaulle1954");
    }

    #[test]
    fn test_title_of_only_stop_words() {
        let entry = article("Smith", 2020, "Of The And");
        assert_eq!(title_part(&entry), NO_TITLE);
    }

    #[test]
    fn test_conference_venue_uses_booktitle() {
        let entry = Entry::new(EntryType::InProceedings, "")
            .with_field("booktitle", "Conference on Neural Information Processing Systems")
            .with_field("journal", "Ignored Journal");
        assert_eq!(venue_part(&entry), "cnips");
    }

    #[rstest]
    #[case("Müller2020", "Muller2020")]
    #[case("van der Berg2020", "van-der-Berg2020")]
    #[case("O'Brien--2020", "O-Brien-2020")]
    #[case("--x--", "x")]
    #[case("日本", "unknownkey")]
    #[case("", "unknownkey")]
    fn test_clean_key(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_key(raw), expected);
    }

    #[test]
    fn test_collisions_in_first_seen_order() {
        let entries = vec![
            article("Smith", 2020, "One"),
            article("Smith", 2020, "Two"),
            article("Smith", 2020, "Three"),
        ];
        let keys = KeyGenerator::default().generate_keys(&entries, false);
        assert_eq!(keys, vec!["smith2020", "smith2020a", "smith2020b"]);
    }

    #[test]
    fn test_preserve_existing_keys() {
        let mut entries = vec![
            article("Smith", 2020, "One"),
            article("Smith", 2020, "Two"),
            article("Jones", 2021, "Three"),
        ];
        entries[1].set_key("Smith2020");

        let generator = KeyGenerator::default();
        generator.assign_keys(&mut entries, true);
        let keys: Vec<_> = entries.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["smith2020a", "Smith2020", "jones2021"]);

        generator.assign_keys(&mut entries, false);
        let keys: Vec<_> = entries.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["smith2020", "smith2020a", "jones2021"]);
    }

    #[test]
    fn test_unique_key_falls_back_to_numbers() {
        let mut used: HashSet<String> = HashSet::new();
        used.insert("doe1999".to_string());
        for c in 'a'..='z' {
            used.insert(format!("doe1999{}", c));
        }
        assert_eq!(unique_key("Doe1999", &used), "Doe19991");
        used.insert("doe19991".to_string());
        assert_eq!(unique_key("doe1999", &used), "doe19992");
        assert_eq!(unique_key("fresh", &used), "fresh");
    }

    proptest! {
        #[test]
        fn test_clean_key_is_always_safe(raw in "\\PC{0,40}") {
            let key = clean_key(&raw);
            prop_assert!(!key.is_empty());
            prop_assert!(key.chars().all(|c| is_key_char(c) || c == '-'));
            prop_assert!(!key.starts_with('-') && !key.ends_with('-'));
            prop_assert!(!key.contains("--"));
        }
    }
}
