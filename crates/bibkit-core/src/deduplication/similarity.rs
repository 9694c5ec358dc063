//! Similarity measures for entry comparison

use bibkit_domain::Entry;
use std::collections::HashSet;
use strsim::{jaro_winkler, normalized_levenshtein};

use super::normalization::{normalize_identifier, normalize_last_name, normalize_title};

/// Word-overlap similarity of two titles in [0, 1].
///
/// Shared words over the size of the larger word set, raised to 0.9 when one
/// normalized title contains the other, plus 0.1 (capped at 1.0) when both
/// titles have more than three words and the overlap already exceeds 0.5.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize_title(a);
    let norm_b = normalize_title(b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }

    let words_a: HashSet<&str> = norm_a.split(' ').collect();
    let words_b: HashSet<&str> = norm_b.split(' ').collect();
    let shared = words_a.intersection(&words_b).count();
    let raw = shared as f64 / words_a.len().max(words_b.len()) as f64;

    let mut score = raw;
    if norm_a.contains(&norm_b) || norm_b.contains(&norm_a) {
        score = score.max(0.9);
    }
    let long = |s: &str| s.split(' ').count() > 3;
    if long(&norm_a) && long(&norm_b) && raw > 0.5 {
        score = (score + 0.1).min(1.0);
    }
    score
}

/// Fraction of the smaller list's last names found in the other list
pub fn author_overlap(a: &[String], b: &[String]) -> f64 {
    let (smaller, larger) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if smaller.is_empty() {
        return 0.0;
    }
    let larger: HashSet<String> = larger.iter().map(|n| normalize_last_name(n)).collect();
    let found = smaller
        .iter()
        .filter(|n| larger.contains(&normalize_last_name(n)))
        .count();
    found as f64 / smaller.len() as f64
}

/// Graded similarity in [0, 1] for ranking candidates.
///
/// Matching DOIs score 1.0. Otherwise the score combines fuzzy title
/// similarity, author overlap and year proximity. It does not decide
/// whether two entries match.
pub fn similarity_score(a: &Entry, b: &Entry) -> f64 {
    let doi_a = a.get("doi").and_then(normalize_identifier);
    let doi_b = b.get("doi").and_then(normalize_identifier);
    if doi_a.is_some() && doi_a == doi_b {
        return 1.0;
    }

    let title = match (a.title(), b.title()) {
        (Some(ta), Some(tb)) => fuzzy_title_similarity(ta, tb),
        _ => 0.0,
    };

    let last_names = |e: &Entry| -> Vec<String> {
        e.authors().iter().map(|au| au.last().to_string()).collect()
    };
    let authors = author_overlap(&last_names(a), &last_names(b));

    let year = match (a.year(), b.year()) {
        (Some(ya), Some(yb)) if ya == yb => 1.0,
        (Some(ya), Some(yb)) if (ya - yb).abs() <= 1 => 0.5,
        _ => 0.0,
    };

    (title * 0.6 + authors * 0.25 + year * 0.15).min(1.0)
}

/// Character-level similarity of normalized titles
fn fuzzy_title_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize_title(a);
    let norm_b = normalize_title(b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    jaro_winkler(&norm_a, &norm_b) * 0.6 + normalized_levenshtein(&norm_a, &norm_b) * 0.4
}
