//! Digital Object Identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConstructionError;

/// Resolver prefixes stripped during normalization, matched case-insensitively
const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi.org/",
    "doi:",
];

/// A normalized DOI such as `10.1000/xyz123`.
///
/// Resolver URLs and the `doi:` scheme are stripped on construction, so
/// normalizing an already normalized value is a no-op.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Doi(String);

impl Doi {
    pub fn parse(input: &str) -> Result<Self, ConstructionError> {
        let normalized = normalize_doi(input);
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(ConstructionError::InvalidDoi(input.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolvable URL for this identifier
    pub fn url(&self) -> String {
        format!("https://doi.org/{}", self.0)
    }

    /// Registrant-style DOIs start with `10.`
    pub fn has_standard_prefix(&self) -> bool {
        self.0.starts_with("10.")
    }
}

/// Strip whitespace and any resolver prefix from a DOI string.
pub fn normalize_doi(input: &str) -> String {
    let mut rest = input.trim();
    loop {
        let lower = rest.to_ascii_lowercase();
        match DOI_PREFIXES.iter().find(|prefix| lower.starts_with(*prefix)) {
            Some(prefix) => rest = rest[prefix.len()..].trim_start(),
            None => break,
        }
    }
    rest.trim().to_string()
}

impl FromStr for Doi {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Doi::parse(s)
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Doi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Doi {
    type Error = ConstructionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Doi::parse(&value)
    }
}

impl From<Doi> for String {
    fn from(value: Doi) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10.1000/xyz123")]
    #[case("  10.1000/xyz123 ")]
    #[case("https://doi.org/10.1000/xyz123")]
    #[case("HTTP://DX.DOI.ORG/10.1000/xyz123")]
    #[case("doi:10.1000/xyz123")]
    #[case("DOI: 10.1000/xyz123")]
    fn test_prefixes_are_stripped(#[case] input: &str) {
        assert_eq!(Doi::parse(input).unwrap().as_str(), "10.1000/xyz123");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = Doi::parse("https://doi.org/10.1103/PhysRevD.1.1").unwrap();
        let twice = Doi::parse(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_url() {
        let doi = Doi::parse("doi:10.1000/abc").unwrap();
        assert_eq!(doi.url(), "https://doi.org/10.1000/abc");
        assert!(doi.has_standard_prefix());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("https://doi.org/")]
    #[case("10.1000/ has space")]
    fn test_invalid(#[case] input: &str) {
        assert!(matches!(
            Doi::parse(input),
            Err(ConstructionError::InvalidDoi(_))
        ));
    }
}
