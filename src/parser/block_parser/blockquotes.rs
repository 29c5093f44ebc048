//! Blockquotes: lines prefixed with `>`.

use crate::ast::{Document, Kind, NodeData, NodeId};
use crate::parser::{BlockParser, Context, State};
use crate::text::Reader;
use crate::utils::indent_width;

/// Consumes a blockquote marker (up to 3 spaces, `>`, one optional space)
/// from the reader. A tab after `>` counts as one space of the marker; the
/// rest of its width is left as padding.
fn consume_marker(reader: &mut Reader<'_>) -> bool {
    let Some(line) = reader.peek_line() else {
        return false;
    };
    let column = reader.line_offset();
    let (width, pos) = indent_width(line, column);
    let bytes = line.as_bytes();
    if width > 3 || pos >= bytes.len() || bytes[pos] != b'>' {
        return false;
    }
    let after = pos + 1;
    match bytes.get(after) {
        Some(b' ') => reader.advance(after + 1),
        Some(b'\t') => {
            let marker_column = column + width + 1;
            let tab = 4 - marker_column % 4;
            reader.advance_and_set_padding(after + 1, tab - 1);
        }
        _ => reader.advance(after),
    }
    true
}

pub struct BlockquoteParser;

impl BlockParser for BlockquoteParser {
    fn trigger(&self) -> &[u8] {
        b">"
    }

    fn open(
        &self,
        doc: &mut Document,
        _parent: NodeId,
        reader: &mut Reader<'_>,
        _pc: &mut Context,
    ) -> Option<(NodeId, State)> {
        if !consume_marker(reader) {
            return None;
        }
        let node = doc.new_node(Kind::BLOCKQUOTE, NodeData::Blockquote);
        Some((node, State::HasChildren))
    }

    fn continue_block(&self, _doc: &mut Document, _node: NodeId, reader: &mut Reader<'_>, _pc: &mut Context) -> State {
        if consume_marker(reader) {
            State::HasChildren
        } else {
            State::Close
        }
    }

    fn can_interrupt_paragraph(&self) -> bool {
        true
    }

    fn can_accept_indented_line(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_with_space() {
        let mut reader = Reader::from_source("> foo\n");
        assert!(consume_marker(&mut reader));
        assert_eq!(reader.peek_line(), Some("foo\n"));
    }

    #[test]
    fn test_marker_without_space() {
        let mut reader = Reader::from_source("   >foo\n");
        assert!(consume_marker(&mut reader));
        assert_eq!(reader.peek_line(), Some("foo\n"));
    }

    #[test]
    fn test_marker_with_tab_leaves_padding() {
        let mut reader = Reader::from_source(">\tfoo\n");
        assert!(consume_marker(&mut reader));
        assert_eq!(reader.peek_line(), Some("foo\n"));
        assert_eq!(reader.padding(), 2);
    }

    #[test]
    fn test_too_indented() {
        let mut reader = Reader::from_source("    > foo\n");
        assert!(!consume_marker(&mut reader));
    }
}
