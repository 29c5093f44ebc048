//! Automatic `id` attributes for headings.

use std::collections::HashSet;

use crate::ast::{Document, Kind};
use crate::parser::{AstTransformer, Context};

/// Hands out unique identifiers, suffixing repeats with `-1`, `-2`, ...
#[derive(Debug, Default)]
pub struct HeadingIds {
    used: HashSet<String>,
}

impl HeadingIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an identifier as taken without generating it.
    pub fn put(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    /// Builds a unique identifier from heading text.
    ///
    /// ASCII letters and digits are kept (lowercased), spaces, `-` and `_`
    /// become `-`, and everything else is dropped.
    pub fn generate(&mut self, text: &str) -> String {
        let mut slug = String::with_capacity(text.len());
        for c in text.trim().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if c.is_ascii_whitespace() || c == '-' || c == '_' {
                slug.push('-');
            }
        }
        if slug.is_empty() {
            slug.push_str("heading");
        }
        if self.used.insert(slug.clone()) {
            return slug;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}-{}", slug, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

pub struct HeadingIdTransformer;

impl AstTransformer for HeadingIdTransformer {
    fn transform(&self, doc: &mut Document, source: &str, _pc: &mut Context) {
        let headings: Vec<_> = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|&n| doc.kind(n) == Kind::HEADING)
            .collect();

        let mut ids = HeadingIds::new();
        for &heading in &headings {
            if let Some(id) = doc.attributes(heading).get("id") {
                ids.put(id);
            }
        }
        for heading in headings {
            if doc.attributes(heading).contains("id") {
                continue;
            }
            let id = ids.generate(&doc.text_content(heading, source));
            log::trace!("Heading id {}", id);
            doc.attributes_mut(heading).set("id", id);
        }
    }
}
