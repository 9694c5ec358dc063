//! Text normalization for entry comparison

use bibkit_domain::normalize_doi;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a title for comparison
///
/// - Removes diacritics
/// - Converts to lowercase
/// - Removes punctuation and braces
/// - Collapses whitespace
pub fn normalize_title(title: &str) -> String {
    let folded: String = title
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a last name: lower-cased, diacritics, spaces, hyphens and
/// braces removed
pub fn normalize_last_name(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '{' | '}'))
        .collect::<String>()
        .to_lowercase()
}

/// Lower-cased DOI without resolver prefix, or `None` when empty
pub fn normalize_identifier(doi: &str) -> Option<String> {
    let normalized = normalize_doi(doi).to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Lower-cased URL without trailing slashes, or `None` when empty
pub fn normalize_url(url: &str) -> Option<String> {
    let normalized = url.trim().trim_end_matches('/').to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("The Quick Brown Fox"), "the quick brown fox");
        assert_eq!(normalize_title("Machine   Learning"), "machine learning");
        assert_eq!(normalize_title("Hello, World!"), "hello world");
        assert_eq!(normalize_title("Test: A {Study}"), "test a study");
    }

    #[test]
    fn test_normalize_title_with_diacritics() {
        assert_eq!(normalize_title("Études Françaises"), "etudes francaises");
        assert_eq!(normalize_title("Naïve Bayes"), "naive bayes");
    }

    #[test]
    fn test_normalize_last_name() {
        assert_eq!(normalize_last_name("van der Berg"), "vanderberg");
        assert_eq!(normalize_last_name("Garcia-Lopez"), "garcialopez");
        assert_eq!(normalize_last_name("Müller"), "muller");
    }

    #[test]
    fn test_normalize_identifier_and_url() {
        assert_eq!(
            normalize_identifier("https://doi.org/10.1038/ABC"),
            Some("10.1038/abc".to_string())
        );
        assert_eq!(normalize_identifier("  "), None);
        assert_eq!(
            normalize_url("HTTPS://Example.org/paper//"),
            Some("https://example.org/paper".to_string())
        );
        assert_eq!(normalize_url("/"), None);
    }
}
