//! Emphasis (`*a*`, `_a_`) and strong emphasis (`**a**`, `__a__`).
//!
//! The parser only scans delimiter runs and classifies them by the flanking
//! rules; pairing happens later in
//! [`process_delimiters`](super::process_delimiters):
//!
//! - a run is left-flanking when not followed by whitespace, and either not
//!   followed by punctuation or preceded by whitespace or punctuation;
//! - right-flanking is the mirror image;
//! - `_` additionally refuses to open or close inside a word.

use std::sync::Arc;

use crate::ast::{Delimiter, Document, Kind, NodeData, NodeId};
use crate::parser::{Context, InlineParser};
use crate::text::{Reader, Segment};
use crate::utils::is_unicode_punct;

use super::{DelimiterProcessor, text_node};

/// Classifies the delimiter run at the reader's position, without moving the
/// reader. Returns `None` if the byte there is not a delimiter of
/// `processor`.
pub fn scan_delimiter(reader: &Reader<'_>, processor: &dyn DelimiterProcessor) -> Option<Delimiter> {
    let line = reader.peek_line()?;
    let c = *line.as_bytes().first()?;
    if !processor.is_delimiter(c) {
        return None;
    }
    let run = line.bytes().take_while(|&b| b == c).count();
    let before = reader.prev_char().unwrap_or(' ');
    let after = line[run..].chars().next().unwrap_or(' ');

    let before_space = before.is_whitespace();
    let before_punct = is_unicode_punct(before);
    let after_space = after.is_whitespace();
    let after_punct = is_unicode_punct(after);

    let left_flanking = !after_space && (!after_punct || before_space || before_punct);
    let right_flanking = !before_space && (!before_punct || after_space || after_punct);

    let (can_open, can_close) = if c == b'_' {
        (
            left_flanking && (!right_flanking || before_punct),
            right_flanking && (!left_flanking || after_punct),
        )
    } else {
        (left_flanking, right_flanking)
    };

    let start = reader.offset();
    Some(Delimiter {
        char: c,
        segment: Segment::new(start, start + run),
        original_length: run,
        can_open,
        can_close,
    })
}

/// Pairs `*` with `*` and `_` with `_`.
pub struct EmphasisDelimiterProcessor;

impl DelimiterProcessor for EmphasisDelimiterProcessor {
    fn is_delimiter(&self, b: u8) -> bool {
        b == b'*' || b == b'_'
    }

    fn can_open_closer(&self, opener: &Delimiter, closer: &Delimiter) -> bool {
        opener.char == closer.char
    }

    fn on_match(&self, doc: &mut Document, consumes: usize, marker: u8) -> NodeId {
        doc.new_node(
            Kind::EMPHASIS,
            NodeData::Emphasis {
                level: consumes as u8,
                marker,
            },
        )
    }
}

pub struct EmphasisParser {
    processor: Arc<dyn DelimiterProcessor>,
}

impl EmphasisParser {
    pub fn new() -> Self {
        Self {
            processor: Arc::new(EmphasisDelimiterProcessor),
        }
    }
}

impl Default for EmphasisParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InlineParser for EmphasisParser {
    fn trigger(&self) -> &[u8] {
        b"*_"
    }

    fn parse(&self, doc: &mut Document, _parent: NodeId, block: &mut Reader<'_>, pc: &mut Context) -> Option<NodeId> {
        let delimiter = scan_delimiter(block, self.processor.as_ref())?;
        block.advance(delimiter.original_length);
        if !delimiter.can_open && !delimiter.can_close {
            return Some(text_node(doc, delimiter.segment));
        }
        let node = doc.new_node(Kind::DELIMITER, NodeData::Delimiter(delimiter));
        pc.push_delimiter(node, Arc::clone(&self.processor));
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str, at: usize) -> Delimiter {
        let mut reader = Reader::from_source(source);
        reader.advance(at);
        scan_delimiter(&reader, &EmphasisDelimiterProcessor).unwrap()
    }

    #[test]
    fn test_left_flanking_run() {
        let d = scan("**foo", 0);
        assert_eq!(d.original_length, 2);
        assert!(d.can_open);
        assert!(!d.can_close);
    }

    #[test]
    fn test_right_flanking_run() {
        let d = scan("foo*", 3);
        assert!(!d.can_open);
        assert!(d.can_close);
    }

    #[test]
    fn test_intraword_star_opens_and_closes() {
        let d = scan("foo*bar", 3);
        assert!(d.can_open && d.can_close);
    }

    #[test]
    fn test_intraword_underscore_does_neither() {
        let d = scan("foo_bar", 3);
        assert!(!d.can_open && !d.can_close);
    }

    #[test]
    fn test_punctuation_before_underscore() {
        let d = scan("(_foo", 1);
        assert!(d.can_open);
        let d = scan("foo_)", 3);
        assert!(d.can_close);
    }

    #[test]
    fn test_surrounded_by_spaces_is_neither() {
        let d = scan("a * b", 2);
        assert!(!d.can_open && !d.can_close);
    }

    #[test]
    fn test_non_delimiter_byte() {
        let reader = Reader::from_source("~x");
        assert!(scan_delimiter(&reader, &EmphasisDelimiterProcessor).is_none());
    }

    #[test]
    fn test_unicode_punctuation_counts() {
        let d = scan("«*a", "«".len());
        assert!(d.can_open);
    }
}
