//! Link reference definitions collected while parsing a document.

use std::collections::HashMap;

use crate::utils::normalize_label;

/// A resolved `[label]: destination "title"` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The label as written between the brackets.
    pub label: String,
    pub destination: String,
    pub title: Option<String>,
}

impl Reference {
    pub fn new(label: impl Into<String>, destination: impl Into<String>, title: Option<String>) -> Self {
        Self {
            label: label.into(),
            destination: destination.into(),
            title,
        }
    }
}

/// Definitions keyed by normalized label. When a label is defined more than
/// once the first definition in document order is kept.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: HashMap<String, Reference>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition. Returns `false` and keeps the existing entry if the
    /// label is already defined.
    pub fn add(&mut self, reference: Reference) -> bool {
        let key = normalize_label(&reference.label);
        if self.entries.contains_key(&key) {
            log::debug!("Ignoring duplicate reference definition [{}]", reference.label);
            return false;
        }
        self.entries.insert(key, reference);
        true
    }

    pub fn get(&self, label: &str) -> Option<&Reference> {
        self.entries.get(&normalize_label(label))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_definition_wins() {
        let mut table = ReferenceTable::new();
        assert!(table.add(Reference::new("Foo", "/first", None)));
        assert!(!table.add(Reference::new("foo", "/second", Some("t".into()))));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("FOO").unwrap().destination, "/first");
    }

    #[test]
    fn test_lookup_normalizes_whitespace_and_case() {
        let mut table = ReferenceTable::new();
        table.add(Reference::new("Foo  Bar", "/url", None));
        assert!(table.contains("foo bar"));
        assert!(table.contains(" FOO\nBAR "));
        assert!(!table.contains("foobar"));
    }
}
