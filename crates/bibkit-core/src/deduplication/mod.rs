//! Duplicate detection for bibliography entries
//!
//! This module provides the staged matcher that decides whether two
//! entries describe the same work, collection-wide grouping, and a graded
//! similarity score for ranking candidates.

mod matcher;
mod normalization;
mod similarity;

pub use matcher::{DeduplicationReport, DuplicateGroup, EntryMatcher, MatchReason, MatcherSettings};
pub use normalization::{normalize_identifier, normalize_last_name, normalize_title, normalize_url};
pub use similarity::{author_overlap, similarity_score, title_similarity};
