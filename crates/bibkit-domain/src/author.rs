//! Author representation and free-text name parsing

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ConstructionError;

/// Represents an author or editor of an entry.
///
/// Equality and hashing ignore case and compare the given names as one word
/// sequence, so `first = "Anne Marie"` equals `first = "Anne"` plus
/// `middle = "Marie"`. The two display forms ("last-first" and
/// "first-last") are computed on demand.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Author {
    last: String,
    first: Option<String>,
    middle: Option<String>,
    suffix: Option<String>,
}

/// Which of the two canonical renderings to produce
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOrder {
    /// "Last, First Middle Suffix"
    #[default]
    LastFirst,
    /// "First Middle Last Suffix"
    FirstLast,
}

impl Author {
    /// Create a new author with just a last name
    pub fn new(last: impl Into<String>) -> Result<Self, ConstructionError> {
        let last: String = last.into();
        let last = collapse_whitespace(last.trim());
        if last.is_empty() {
            return Err(ConstructionError::EmptyName("last name"));
        }
        Ok(Self {
            last,
            first: None,
            middle: None,
            suffix: None,
        })
    }

    /// Builder method to add a first name
    pub fn with_first(mut self, first: impl Into<String>) -> Self {
        self.first = non_empty(first.into());
        self
    }

    /// Builder method to add a (possibly multi-word) middle name.
    ///
    /// Without a first name the middle name is the only given name, and it
    /// reads back from either rendering as the first name; the two forms
    /// compare equal.
    pub fn with_middle(mut self, middle: impl Into<String>) -> Self {
        self.middle = non_empty(middle.into());
        self
    }

    /// Builder method to add a suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = non_empty(suffix.into());
        self
    }

    pub fn last(&self) -> &str {
        &self.last
    }

    pub fn first(&self) -> Option<&str> {
        self.first.as_deref()
    }

    pub fn middle(&self) -> Option<&str> {
        self.middle.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Parse one free-text name in either "Last, First Middle [Suffix]" or
    /// "First Middle Last [Suffix]" notation.
    pub fn from_text(text: &str) -> Result<Self, ConstructionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ConstructionError::EmptyName("author name"));
        }

        match find_top_level_comma(trimmed) {
            Some(comma) => parse_comma_form(&trimmed[..comma], &trimmed[comma + 1..]),
            None => parse_plain_form(tokenize(trimmed), None),
        }
    }

    /// Format as "Last, First Middle Suffix".
    ///
    /// A multi-word last name with no given name keeps its comma
    /// (`"de Gaulle,"` or `"de Gaulle, Jr.,"`) so it does not read back as
    /// first name plus last name.
    pub fn last_first(&self) -> String {
        let given = self.given_parts();
        if given.is_empty() {
            return match (&self.suffix, self.has_compound_last()) {
                (Some(suffix), true) => format!("{}, {},", self.last, suffix),
                (None, true) => format!("{},", self.last),
                (Some(suffix), false) => format!("{} {}", self.last, suffix),
                (None, false) => self.last.clone(),
            };
        }
        let mut name = format!("{}, {}", self.last, given.join(" "));
        if let Some(suffix) = &self.suffix {
            name.push(' ');
            name.push_str(suffix);
        }
        name
    }

    /// Format as "First Middle Last Suffix".
    ///
    /// The plain form cannot mark where a multi-word last name starts, so
    /// those authors fall back to [`Author::last_first`].
    pub fn first_last(&self) -> String {
        if self.has_compound_last() {
            return self.last_first();
        }
        let mut parts = self.given_parts();
        parts.push(&self.last);
        if let Some(suffix) = &self.suffix {
            parts.push(suffix);
        }
        parts.join(" ")
    }

    /// Render in the requested order
    pub fn render(&self, order: NameOrder) -> String {
        match order {
            NameOrder::LastFirst => self.last_first(),
            NameOrder::FirstLast => self.first_last(),
        }
    }

    fn given_parts(&self) -> Vec<&str> {
        [self.first.as_deref(), self.middle.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }

    fn has_compound_last(&self) -> bool {
        tokenize(&self.last).len() > 1
    }

    fn folded(&self) -> [String; 3] {
        [
            self.last.to_lowercase(),
            self.given_parts().join(" ").to_lowercase(),
            self.suffix.as_deref().unwrap_or_default().to_lowercase(),
        ]
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.folded() == other.folded()
    }
}

impl Eq for Author {}

impl Hash for Author {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded().hash(state);
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.first_last())
    }
}

// ===== Suffix table =====

lazy_static! {
    /// Folded spelling (lower-case, periods removed) to canonical spelling
    static ref SUFFIXES: HashMap<String, &'static str> = {
        let mut m = HashMap::new();
        let canonical = [
            "Jr.", "Sr.", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X",
            "2nd", "3rd", "4th", "5th", "6th", "7th", "8th", "9th", "10th",
            "Esq.", "Ph.D.", "M.D.", "D.D.S.", "D.V.M.", "J.D.", "M.B.A.", "R.N.",
            "D.Phil.", "Ed.D.", "Psy.D.",
        ];
        for spelling in canonical {
            m.insert(fold_suffix(spelling), spelling);
        }
        m.insert("junior".to_string(), "Jr.");
        m.insert("senior".to_string(), "Sr.");
        m
    };
}

fn fold_suffix(token: &str) -> String {
    token
        .chars()
        .filter(|c| *c != '.' && *c != ',')
        .collect::<String>()
        .to_lowercase()
}

/// Return the canonical spelling if `token` is a known generational or
/// professional suffix (case-insensitive, periods optional).
pub fn canonical_suffix(token: &str) -> Option<&'static str> {
    // "V." is an initial, not a numeral
    let mut chars = token.chars();
    if let (Some(c), Some('.'), None) = (chars.next(), chars.next(), chars.next()) {
        if c.is_alphabetic() {
            return None;
        }
    }
    SUFFIXES.get(&fold_suffix(token)).copied()
}

// ===== Name parsing =====

fn parse_comma_form(before: &str, after: &str) -> Result<Author, ConstructionError> {
    let head = before.trim();
    let rest = after.trim();

    // "Smith, Jr., John": BibTeX's three-part form
    if let Some(second) = find_top_level_comma(rest) {
        let middle_part = rest[..second].trim();
        if let Some(suffix) = canonical_suffix(middle_part) {
            let author = parse_given(head, tokenize(&rest[second + 1..]))?;
            return Ok(author.with_suffix(suffix));
        }
    }

    let mut tokens = tokenize(rest);

    // "John Smith, Jr.": the part after the comma is only a suffix
    if tokens.len() == 1 {
        if let Some(suffix) = canonical_suffix(&tokens[0]) {
            return parse_plain_form(tokenize(head), Some(suffix));
        }
    }

    let mut suffix = None;
    if tokens.len() > 1 {
        if let Some(found) = tokens.last().and_then(|t| canonical_suffix(t)) {
            suffix = Some(found);
            tokens.pop();
        }
    }

    let author = parse_given(head, tokens)?;
    Ok(match suffix {
        Some(s) => author.with_suffix(s),
        None => author,
    })
}

fn parse_given(last: &str, tokens: Vec<String>) -> Result<Author, ConstructionError> {
    let mut author = Author::new(last)?;
    let mut iter = tokens.into_iter();
    if let Some(first) = iter.next() {
        author.first = Some(first);
    }
    let middle: Vec<String> = iter.collect();
    if !middle.is_empty() {
        author.middle = Some(middle.join(" "));
    }
    Ok(author)
}

fn parse_plain_form(
    mut tokens: Vec<String>,
    mut suffix: Option<&'static str>,
) -> Result<Author, ConstructionError> {
    if suffix.is_none() && tokens.len() > 1 {
        if let Some(found) = tokens.last().and_then(|t| canonical_suffix(t)) {
            suffix = Some(found);
            tokens.pop();
        }
    }

    let Some(last) = tokens.pop() else {
        return Err(ConstructionError::EmptyName("last name"));
    };
    let mut author = Author::new(last)?;
    if !tokens.is_empty() {
        author.first = Some(tokens.remove(0));
    }
    if !tokens.is_empty() {
        author.middle = Some(tokens.join(" "));
    }
    if let Some(s) = suffix {
        author.suffix = Some(s.to_string());
    }
    Ok(author)
}

/// Whitespace-split at brace depth 0, dropping separator commas
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in text.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                push_token(&mut tokens, &mut current);
            }
            _ => current.push(c),
        }
    }
    push_token(&mut tokens, &mut current);
    tokens
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    let token = current.trim_matches(',');
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
    current.clear();
}

fn find_top_level_comma(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

// ===== Name lists =====

/// Split an author/editor field into individual names.
///
/// Names are separated by the word `and` (any case) at brace depth 0, so
/// `{Barnes and Noble}` stays a single name.
pub fn split_names(field: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut word = String::new();
    let mut depth = 0usize;

    let flush_word = |word: &mut String, current: &mut Vec<String>, names: &mut Vec<String>| {
        if word.eq_ignore_ascii_case("and") {
            if !current.is_empty() {
                names.push(current.join(" "));
                current.clear();
            }
        } else if !word.is_empty() {
            current.push(word.clone());
        }
        word.clear();
    };

    for c in field.chars() {
        match c {
            '{' => {
                depth += 1;
                word.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                word.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                flush_word(&mut word, &mut current, &mut names);
            }
            _ => word.push(c),
        }
    }
    flush_word(&mut word, &mut current, &mut names);
    if !current.is_empty() {
        names.push(current.join(" "));
    }
    names
}

/// Parse every name in an author/editor field, skipping names that cannot
/// form an author (for example a dangling `,`).
pub fn parse_names(field: &str) -> Vec<Author> {
    split_names(field)
        .iter()
        .filter_map(|name| Author::from_text(name).ok())
        .collect()
}

/// Join authors with ` and ` in the requested order
pub fn join_names(authors: &[Author], order: NameOrder) -> String {
    authors
        .iter()
        .map(|a| a.render(order))
        .collect::<Vec<_>>()
        .join(" and ")
}

fn non_empty(value: String) -> Option<String> {
    let value = collapse_whitespace(value.trim());
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Collapse multiple whitespace characters into a single space.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn author(text: &str) -> Author {
        Author::from_text(text).unwrap()
    }

    #[test]
    fn test_notation_independence() {
        let a = author("Smith, John Robert Jr.");
        let b = author("John Robert Smith Jr.");
        assert_eq!(a, b);
        assert_eq!(a.last(), "Smith");
        assert_eq!(a.first(), Some("John"));
        assert_eq!(a.middle(), Some("Robert"));
        assert_eq!(a.suffix(), Some("Jr."));
    }

    #[test]
    fn test_single_token_is_last_name_only() {
        let a = author("Plato");
        assert_eq!(a.last(), "Plato");
        assert!(a.first().is_none());
        assert!(a.middle().is_none());

        let b = author("Plato,");
        assert_eq!(b, a);
    }

    #[test]
    fn test_multi_word_middle() {
        let a = author("Johann Sebastian Maria Bach");
        assert_eq!(a.first(), Some("Johann"));
        assert_eq!(a.middle(), Some("Sebastian Maria"));
        assert_eq!(a.last(), "Bach");
    }

    #[rstest]
    #[case("jr", "Jr.")]
    #[case("JR.", "Jr.")]
    #[case("iii", "III")]
    #[case("PhD", "Ph.D.")]
    #[case("ph.d.", "Ph.D.")]
    #[case("esq", "Esq.")]
    #[case("3RD", "3rd")]
    fn test_suffix_normalization(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(canonical_suffix(raw), Some(expected));
    }

    #[test]
    fn test_suffix_only_after_comma() {
        let a = author("John Smith, Jr.");
        assert_eq!(a.last(), "Smith");
        assert_eq!(a.first(), Some("John"));
        assert_eq!(a.suffix(), Some("Jr."));
    }

    #[test]
    fn test_three_part_form() {
        let a = author("King, Jr., Martin Luther");
        assert_eq!(a.last(), "King");
        assert_eq!(a.first(), Some("Martin"));
        assert_eq!(a.middle(), Some("Luther"));
        assert_eq!(a.suffix(), Some("Jr."));
    }

    #[test]
    fn test_lone_suffix_word_is_not_stripped() {
        // A single token is always the last name, even if it looks like a suffix
        assert_eq!(author("V").last(), "V");
    }

    #[test]
    fn test_initial_is_not_a_numeral() {
        let a = author("Doe, V.");
        assert_eq!(a.last(), "Doe");
        assert_eq!(a.first(), Some("V."));
        assert!(a.suffix().is_none());

        let b = author("Henry Ford II");
        assert_eq!(b.suffix(), Some("II"));
    }

    #[test]
    fn test_renderings() {
        let a = Author::new("Einstein")
            .unwrap()
            .with_first("Albert")
            .with_suffix("Ph.D.");
        assert_eq!(a.last_first(), "Einstein, Albert Ph.D.");
        assert_eq!(a.first_last(), "Albert Einstein Ph.D.");
        assert_eq!(Author::from_text(&a.last_first()).unwrap(), a);
        assert_eq!(Author::from_text(&a.first_last()).unwrap(), a);
    }

    #[rstest]
    #[case(Author::new("de Gaulle").unwrap(), "de Gaulle,")]
    #[case(Author::new("de Gaulle").unwrap().with_suffix("Jr."), "de Gaulle, Jr.,")]
    #[case(Author::new("Plato").unwrap(), "Plato")]
    #[case(Author::new("Plato").unwrap().with_suffix("III"), "Plato III")]
    #[case(Author::new("van der Berg").unwrap().with_first("Anne Marie"), "van der Berg, Anne Marie")]
    fn test_last_only_renderings_read_back(#[case] a: Author, #[case] rendered: &str) {
        assert_eq!(a.last_first(), rendered);
        let parsed = Author::from_text(&a.last_first()).unwrap();
        assert_eq!(parsed.last(), a.last());
        assert_eq!(parsed, a);
        assert_eq!(Author::from_text(&a.first_last()).unwrap(), a);
    }

    #[test]
    fn test_compound_last_name_renders_with_comma_in_both_orders() {
        let a = Author::new("van der Berg").unwrap().with_first("Jan");
        assert_eq!(a.first_last(), "van der Berg, Jan");
        assert_eq!(a.render(NameOrder::FirstLast), a.last_first());
    }

    #[test]
    fn test_middle_without_first_reads_back_equal() {
        let a = Author::new("Smith").unwrap().with_middle("Robert");
        assert_eq!(a.last_first(), "Smith, Robert");
        let parsed = Author::from_text(&a.last_first()).unwrap();
        assert_eq!(parsed.first(), Some("Robert"));
        assert_eq!(parsed, a);
    }

    #[test]
    fn test_given_names_compare_as_one_sequence() {
        let joined = Author::new("Smith").unwrap().with_first("Anne Marie");
        let split = author("Smith, Anne Marie");
        assert_eq!(split.middle(), Some("Marie"));
        assert_eq!(joined, split);

        let mut hashes = std::collections::HashSet::new();
        hashes.insert(joined);
        assert!(hashes.contains(&split));
    }

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(author("smith, JOHN"), author("Smith, John"));
        assert_ne!(author("Smith, John"), author("Smith, Jane"));
    }

    #[test]
    fn test_empty_name_fails() {
        assert_eq!(
            Author::from_text("   "),
            Err(ConstructionError::EmptyName("author name"))
        );
        assert!(Author::new("").is_err());
    }

    #[test]
    fn test_split_names() {
        assert_eq!(
            split_names("Smith, John and Doe, Jane AND {Barnes and Noble}"),
            vec!["Smith, John", "Doe, Jane", "{Barnes and Noble}"]
        );
        assert_eq!(split_names("Alexander Anderson"), vec!["Alexander Anderson"]);
    }

    #[test]
    fn test_braced_group_is_one_token() {
        let a = author("{World Health Organization}");
        assert_eq!(a.last(), "{World Health Organization}");
        assert!(a.first().is_none());
    }

    #[test]
    fn test_join_names() {
        let names = parse_names("John Smith and Doe, Jane");
        assert_eq!(
            join_names(&names, NameOrder::LastFirst),
            "Smith, John and Doe, Jane"
        );
        assert_eq!(
            join_names(&names, NameOrder::FirstLast),
            "John Smith and Jane Doe"
        );
    }
}
