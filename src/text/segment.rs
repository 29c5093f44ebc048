//! Byte ranges into the source and ordered sequences of them.

use std::borrow::Cow;

use crate::utils::is_space;

/// A half-open byte range `[start, end)` into the source document.
///
/// `padding` counts virtual leading spaces that belong to the segment but are
/// not present in the source, left over when a tab straddles an indentation
/// boundary (for example the content of a list item indented with a tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub padding: usize,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "segment start {start} after end {end}");
        Self {
            start,
            end,
            padding: 0,
        }
    }

    pub fn with_padding(start: usize, end: usize, padding: usize) -> Self {
        Self {
            padding,
            ..Self::new(start, end)
        }
    }

    /// Length in bytes, counting virtual padding.
    pub fn len(&self) -> usize {
        self.end - self.start + self.padding
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end && self.padding == 0
    }

    /// The source bytes covered by this segment, without padding.
    pub fn raw<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// The segment's text with padding materialized as spaces.
    pub fn value<'a>(&self, source: &'a str) -> Cow<'a, str> {
        if self.padding == 0 {
            Cow::Borrowed(self.raw(source))
        } else {
            let mut value = " ".repeat(self.padding);
            value.push_str(self.raw(source));
            Cow::Owned(value)
        }
    }

    pub fn with_end(self, end: usize) -> Self {
        Self::with_padding(self.start, end, self.padding)
    }

    /// The range from this segment's start up to `other`'s start.
    pub fn between(self, other: Segment) -> Self {
        Self::with_padding(self.start, other.start.max(self.start), self.padding)
    }

    pub fn trim_left_space(self, source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut start = self.start;
        while start < self.end && is_space(bytes[start]) {
            start += 1;
        }
        Self::new(start, self.end)
    }

    pub fn trim_right_space(self, source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut end = self.end;
        while end > self.start && is_space(bytes[end - 1]) {
            end -= 1;
        }
        Self::with_padding(self.start, end, self.padding)
    }

    /// Whether this segment contains only whitespace.
    pub fn is_blank(&self, source: &str) -> bool {
        self.raw(source).bytes().all(is_space)
    }
}

/// An ordered sequence of segments describing a node's text, possibly with
/// discontiguous pieces (the lines of a paragraph inside a blockquote, or a
/// paragraph with reference definitions spliced out).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segments {
    values: Vec<Segment>,
}

impl Segments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn at(&self, index: usize) -> Segment {
        self.values[index]
    }

    pub fn get(&self, index: usize) -> Option<Segment> {
        self.values.get(index).copied()
    }

    pub fn first(&self) -> Option<Segment> {
        self.values.first().copied()
    }

    pub fn last(&self) -> Option<Segment> {
        self.values.last().copied()
    }

    pub fn set(&mut self, index: usize, segment: Segment) {
        self.values[index] = segment;
    }

    pub fn push(&mut self, segment: Segment) {
        self.values.push(segment);
    }

    pub fn append_all(&mut self, segments: &[Segment]) {
        self.values.extend_from_slice(segments);
    }

    /// Inserts a segment in front of all others.
    pub fn unshift(&mut self, segment: Segment) {
        self.values.insert(0, segment);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// The segments in `[lo, hi)`.
    pub fn sliced(&self, lo: usize, hi: usize) -> &[Segment] {
        &self.values[lo..hi]
    }

    /// Keeps only the segments in `[lo, hi)`.
    pub fn set_sliced(&mut self, lo: usize, hi: usize) {
        self.values.truncate(hi);
        self.values.drain(..lo);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.values.iter()
    }

    /// Concatenated text of every segment.
    pub fn value(&self, source: &str) -> String {
        let mut out = String::new();
        for segment in &self.values {
            out.push_str(&segment.value(source));
        }
        out
    }

    /// Like [`Segments::value`], with the last line newline-terminated even
    /// when the block ends the input.
    pub fn block_value(&self, source: &str) -> String {
        let mut out = self.value(source);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

impl From<Vec<Segment>> for Segments {
    fn from(values: Vec<Segment>) -> Self {
        Self { values }
    }
}

impl FromIterator<Segment> for Segments {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Segments {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Splits a source into line segments, each including its trailing newline.
pub fn split_lines(source: &str) -> Segments {
    let mut lines = Segments::new();
    let mut start = 0;
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            lines.push(Segment::new(start, i + 1));
            start = i + 1;
        }
    }
    if start < source.len() {
        lines.push(Segment::new(start, source.len()));
    }
    lines
}
