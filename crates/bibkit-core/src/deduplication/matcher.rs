//! Staged entry matching and duplicate grouping

use bibkit_domain::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::normalization::{normalize_identifier, normalize_last_name, normalize_url};
use super::similarity::{author_overlap, title_similarity};

/// Matching thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSettings {
    /// Title similarity must exceed this
    pub title_threshold: f64,
    /// Share of the smaller author list that must appear in the other one
    /// when either entry has several authors
    pub author_overlap: f64,
    /// Citation keys shorter than this never match
    pub min_key_length: usize,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            title_threshold: 0.6,
            author_overlap: 0.6,
            min_key_length: 4,
        }
    }
}

/// Which stage produced a match, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Identifier,
    Url,
    AuthorTitleYear,
    CitationKey,
}

impl MatchReason {
    pub const ALL: [MatchReason; 4] = [
        MatchReason::Identifier,
        MatchReason::Url,
        MatchReason::AuthorTitleYear,
        MatchReason::CitationKey,
    ];
}

/// A set of entries considered the same work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Indices into the input; the first one is the group's representative
    pub members: Vec<usize>,
    /// Why each later member matched the representative
    pub reasons: Vec<MatchReason>,
}

/// Outcome of grouping a collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeduplicationReport {
    /// Groups with more than one member
    pub duplicates: Vec<DuplicateGroup>,
    /// Indices of entries that matched nothing
    pub unique: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct EntryMatcher {
    settings: MatcherSettings,
}

impl EntryMatcher {
    pub fn new(settings: MatcherSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MatcherSettings {
        &self.settings
    }

    /// First stage at which `target` matches `candidate`
    pub fn matches(&self, target: &Entry, candidate: &Entry) -> Option<MatchReason> {
        MatchReason::ALL
            .into_iter()
            .find(|&reason| self.stage_matches(reason, target, candidate))
    }

    /// Best match for `target` among `candidates`.
    ///
    /// Stages are tried in priority order over the whole candidate set, so
    /// an identifier match anywhere beats a title match earlier in the list.
    pub fn find_match(&self, target: &Entry, candidates: &[Entry]) -> Option<(usize, MatchReason)> {
        for reason in MatchReason::ALL {
            if let Some(index) = candidates
                .iter()
                .position(|candidate| self.stage_matches(reason, target, candidate))
            {
                debug!(key = target.key(), index, ?reason, "Found matching entry");
                return Some((index, reason));
            }
        }
        None
    }

    /// Group entries that match each other.
    ///
    /// Each entry is compared with the first member of every existing group
    /// and joins the first group that matches, otherwise it starts a new one.
    pub fn find_duplicates(&self, entries: &[Entry]) -> DeduplicationReport {
        let mut groups: Vec<DuplicateGroup> = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            let joined = groups.iter_mut().find_map(|group| {
                let representative = &entries[group.members[0]];
                self.matches(entry, representative).map(|reason| (group, reason))
            });
            match joined {
                Some((group, reason)) => {
                    trace!(index, representative = group.members[0], ?reason, "Duplicate");
                    group.members.push(index);
                    group.reasons.push(reason);
                }
                None => groups.push(DuplicateGroup {
                    members: vec![index],
                    reasons: Vec::new(),
                }),
            }
        }

        let (duplicates, singles): (Vec<_>, Vec<_>) =
            groups.into_iter().partition(|g| g.members.len() > 1);
        DeduplicationReport {
            duplicates,
            unique: singles.into_iter().map(|g| g.members[0]).collect(),
        }
    }

    fn stage_matches(&self, reason: MatchReason, target: &Entry, candidate: &Entry) -> bool {
        match reason {
            MatchReason::Identifier => same_normalized(target, candidate, "doi", normalize_identifier),
            MatchReason::Url => same_normalized(target, candidate, "url", normalize_url),
            MatchReason::AuthorTitleYear => self.author_title_year(target, candidate),
            MatchReason::CitationKey => {
                target.key().chars().count() >= self.settings.min_key_length
                    && target.key() == candidate.key()
            }
        }
    }

    fn author_title_year(&self, target: &Entry, candidate: &Entry) -> bool {
        let (Some(year_a), Some(year_b)) = (target.year(), candidate.year()) else {
            return false;
        };
        if year_a != year_b {
            return false;
        }

        let (Some(title_a), Some(title_b)) = (target.title(), candidate.title()) else {
            return false;
        };
        if title_a.trim().is_empty() || title_b.trim().is_empty() {
            return false;
        }

        let last_names = |e: &Entry| -> Vec<String> {
            e.authors().iter().map(|a| a.last().to_string()).collect()
        };
        let authors_a = last_names(target);
        let authors_b = last_names(candidate);
        let (Some(first_a), Some(first_b)) = (authors_a.first(), authors_b.first()) else {
            return false;
        };
        if normalize_last_name(first_a) != normalize_last_name(first_b) {
            return false;
        }
        if (authors_a.len() > 1 || authors_b.len() > 1)
            && author_overlap(&authors_a, &authors_b) < self.settings.author_overlap
        {
            return false;
        }

        title_similarity(title_a, title_b) > self.settings.title_threshold
    }
}

fn same_normalized(
    target: &Entry,
    candidate: &Entry,
    field: &str,
    normalize: fn(&str) -> Option<String>,
) -> bool {
    let Some(value) = target.get(field).and_then(normalize) else {
        return false;
    };
    candidate.get(field).and_then(normalize).as_ref() == Some(&value)
}
