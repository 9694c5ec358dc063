//! Page ranges

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConstructionError;

/// A start page with an optional end page (`end >= start`).
///
/// The canonical text form uses a double dash: `100--110`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageRange {
    start: u32,
    end: Option<u32>,
}

impl PageRange {
    /// Create a page range, rejecting negative pages and reversed bounds
    pub fn new(start: i64, end: Option<i64>) -> Result<Self, ConstructionError> {
        let start = page_number(start)?;
        let end = end.map(page_number).transpose()?;
        if let Some(end) = end {
            if end < start {
                return Err(ConstructionError::EndBeforeStart { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// A single page
    pub fn single(page: u32) -> Self {
        Self {
            start: page,
            end: None,
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> Option<u32> {
        self.end
    }

    /// Number of pages covered, counting both ends; widened so the full
    /// `u32` span fits
    pub fn page_count(&self) -> u64 {
        match self.end {
            Some(end) => u64::from(end) - u64::from(self.start) + 1,
            None => 1,
        }
    }

    /// Render as `start--end` or just `start`
    pub fn to_canonical_string(&self) -> String {
        self.to_string()
    }
}

fn page_number(value: i64) -> Result<u32, ConstructionError> {
    if value < 0 {
        return Err(ConstructionError::NegativePage(value));
    }
    u32::try_from(value).map_err(|_| ConstructionError::InvalidPageRange(value.to_string()))
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '\u{2013}' | '\u{2014}')
}

impl FromStr for PageRange {
    type Err = ConstructionError;

    /// Accepts `12`, `12-15`, `12--15`, `12---15` and en/em dashes, with
    /// arbitrary whitespace around the separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConstructionError::InvalidPageRange(s.to_string());

        // Collapse every run of dashes into one separator
        let mut collapsed = String::with_capacity(s.len());
        let mut in_dash_run = false;
        for c in s.trim().chars() {
            if is_dash(c) {
                if !in_dash_run {
                    collapsed.push('-');
                }
                in_dash_run = true;
            } else {
                collapsed.push(c);
                in_dash_run = false;
            }
        }

        let mut parts = collapsed.split('-').map(str::trim);
        let start_text = parts.next().ok_or_else(invalid)?;
        let end_text = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        let start = parse_page(start_text).ok_or_else(invalid)?;
        let end = match end_text {
            Some(text) => Some(parse_page(text).ok_or_else(invalid)?),
            None => None,
        };
        PageRange::new(start, end)
    }
}

fn parse_page(text: &str) -> Option<i64> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}--{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

impl TryFrom<String> for PageRange {
    type Error = ConstructionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PageRange> for String {
    fn from(value: PageRange) -> Self {
        value.to_string()
    }
}
