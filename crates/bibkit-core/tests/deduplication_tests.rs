//! Deduplication integration tests

mod common;

use bibkit_core::bibtex::Parser;
use bibkit_core::deduplication::{similarity_score, title_similarity};
use bibkit_core::domain::{Entry, EntryType};
use bibkit_core::{BibkitConfig, DuplicateGroup, EntryMatcher, MatchReason};
use common::fixtures::load_bibtex_fixture;
use proptest::prelude::*;

fn paper(key: &str, author: &str, title: &str, year: i32) -> Entry {
    let mut entry = Entry::new(EntryType::Article, key)
        .with_field("author", author)
        .with_field("title", title);
    entry.set_year(year);
    entry
}

#[test]
fn test_duplicates_across_notations() {
    let mut input = load_bibtex_fixture("simple.bib");
    input.push_str(
        r#"
@misc{einstein-copy,
  author = {Einstein, A.},
  title = {On the electrodynamics of moving bodies},
  year = 1905
}

@article{attention,
  title = {Transformers},
  doi = {https://doi.org/10.48550/ARXIV.1706.03762}
}
"#,
    );
    let entries = Parser::default().parse_all(&input).unwrap();
    let report = EntryMatcher::default().find_duplicates(&entries);

    assert_eq!(
        report.duplicates,
        vec![
            DuplicateGroup {
                members: vec![0, 3],
                reasons: vec![MatchReason::AuthorTitleYear],
            },
            DuplicateGroup {
                members: vec![2, 4],
                reasons: vec![MatchReason::Identifier],
            },
        ]
    );
    assert_eq!(report.unique, vec![1]);
}

#[test]
fn test_grouping_compares_with_representative() {
    let a = Entry::new(EntryType::Misc, "a").with_field("doi", "10.1/shared");
    let b = Entry::new(EntryType::Misc, "b")
        .with_field("doi", "10.1/SHARED")
        .with_field("url", "https://example.org/b");
    let c = Entry::new(EntryType::Misc, "c").with_field("url", "https://example.org/b/");

    let matcher = EntryMatcher::default();
    assert_eq!(matcher.matches(&b, &c), Some(MatchReason::Url));

    let report = matcher.find_duplicates(&[a, b, c]);
    assert_eq!(report.duplicates.len(), 1);
    assert_eq!(report.duplicates[0].members, vec![0, 1]);
    assert_eq!(report.unique, vec![2]);
}

#[test]
fn test_configured_threshold() {
    let config = BibkitConfig::from_toml(
        r#"
[matcher]
title_threshold = 0.95
"#,
    )
    .unwrap();
    // 3 of 4 words shared
    let a = paper("a1", "Smith, John", "Graph Neural Network Models", 2020);
    let b = paper("b1", "Smith, John", "Graph Neural Network Methods", 2020);
    assert!(title_similarity(a.title().unwrap(), b.title().unwrap()) > 0.6);

    assert_eq!(
        EntryMatcher::default().matches(&a, &b),
        Some(MatchReason::AuthorTitleYear)
    );
    assert_eq!(config.matcher().matches(&a, &b), None);
}

#[test]
fn test_find_match_ranks_by_stage() {
    let target = paper("t", "Doe, Jane", "Sparse Attention at Scale", 2022)
        .with_field("url", "https://example.org/sparse");
    let library = vec![
        paper("x", "Doe, Jane", "Sparse Attention at Scale", 2022),
        Entry::new(EntryType::Misc, "y").with_field("url", "https://EXAMPLE.org/sparse/"),
    ];
    assert_eq!(
        EntryMatcher::default().find_match(&target, &library),
        Some((1, MatchReason::Url))
    );
    assert!(similarity_score(&target, &library[0]) > similarity_score(&target, &library[1]));
}

fn title_words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{4,10}", 20..40)
}

proptest! {
    #[test]
    fn test_same_doi_always_matches(
        title_a in "[A-Za-z ]{0,30}",
        title_b in "[A-Za-z ]{0,30}",
        year_a in 1900i32..2100,
        year_b in 1900i32..2100,
    ) {
        let a = paper("a1", "Smith, John", &title_a, year_a).with_field("doi", "10.5555/Same");
        let b = paper("b1", "Doe, Jane", &title_b, year_b)
            .with_field("doi", "https://dx.doi.org/10.5555/same");
        prop_assert_eq!(EntryMatcher::default().matches(&a, &b), Some(MatchReason::Identifier));
    }

    #[test]
    fn test_near_identical_titles_match(words in title_words(), replaced in "[0-9]{3}") {
        let title_a = words.join(" ");
        let mut changed = words.clone();
        changed[0] = replaced;
        let title_b = changed.join(" ");

        let a = paper("a1", "Smith, John", &title_a, 2020).with_field("doi", "10.1000/first");
        let b = paper("b1", "Smith, J.", &title_b, 2020).with_field("doi", "10.1000/second");
        prop_assert_eq!(
            EntryMatcher::default().matches(&a, &b),
            Some(MatchReason::AuthorTitleYear)
        );
    }

    #[test]
    fn test_different_years_never_match_on_metadata(
        title in "[A-Za-z]{3,10}( [A-Za-z]{3,10}){0,6}",
        year in 1900i32..2100,
        offset in 1i32..5,
    ) {
        let a = paper("first", "Smith, John", &title, year);
        let b = paper("second", "Smith, John", &title, year + offset);
        prop_assert_eq!(EntryMatcher::default().matches(&a, &b), None);
    }
}
