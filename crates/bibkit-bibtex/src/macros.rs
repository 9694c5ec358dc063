//! `@string` macro table

use std::collections::HashMap;

/// Month abbreviations every parse starts with when enabled
pub const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Ordered, case-insensitive name to value mapping for one parse.
///
/// Values are stored already expanded, so redefining a macro never changes
/// values that were resolved from it earlier.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding `jan` .. `dec`
    pub fn with_months() -> Self {
        let mut table = Self::new();
        for (name, value) in MONTHS {
            table.define(name, value);
        }
        table
    }

    /// Define or overwrite a macro; an overwritten macro keeps its position
    pub fn define(&mut self, name: &str, value: impl Into<String>) {
        let key = name.to_lowercase();
        let value = value.into();
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definitions in first-definition order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut table = MacroTable::new();
        table.define("ApJ", "Astrophysical Journal");
        assert_eq!(table.get("apj"), Some("Astrophysical Journal"));
        assert_eq!(table.get("APJ"), Some("Astrophysical Journal"));
        assert!(!table.contains("mnras"));
    }

    #[test]
    fn test_redefinition_overwrites_in_place() {
        let mut table = MacroTable::new();
        table.define("a", "1");
        table.define("b", "2");
        table.define("A", "3");
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_months() {
        let table = MacroTable::with_months();
        assert_eq!(table.len(), 12);
        assert_eq!(table.get("SEP"), Some("September"));
        assert!(MacroTable::new().is_empty());
    }
}
