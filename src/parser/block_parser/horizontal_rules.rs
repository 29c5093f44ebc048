//! Thematic breaks: three or more `*`, `-` or `_`, optionally spaced.

use crate::ast::{Document, Kind, NodeData, NodeId};
use crate::parser::{BlockParser, Context, State};
use crate::text::Reader;
use crate::utils::{indent_width, is_space};

/// Whether `line`, starting at visual column `column`, is a thematic break.
pub(crate) fn is_thematic_break(line: &str, column: usize) -> bool {
    let (width, pos) = indent_width(line, column);
    if width > 3 {
        return false;
    }
    let mut mark = None;
    let mut count = 0;
    for b in line[pos..].bytes() {
        if is_space(b) {
            continue;
        }
        match mark {
            None if matches!(b, b'*' | b'-' | b'_') => mark = Some(b),
            Some(m) if m == b => {}
            _ => return false,
        }
        count += 1;
    }
    count >= 3
}

pub struct ThematicBreakParser;

impl BlockParser for ThematicBreakParser {
    fn trigger(&self) -> &[u8] {
        b"-*_"
    }

    fn open(
        &self,
        doc: &mut Document,
        _parent: NodeId,
        reader: &mut Reader<'_>,
        _pc: &mut Context,
    ) -> Option<(NodeId, State)> {
        let line = reader.peek_line()?;
        if !is_thematic_break(line, reader.line_offset()) {
            return None;
        }
        let node = doc.new_node(Kind::THEMATIC_BREAK, NodeData::ThematicBreak);
        Some((node, State::NoChildren))
    }

    fn continue_block(&self, _: &mut Document, _: NodeId, _: &mut Reader<'_>, _: &mut Context) -> State {
        State::Close
    }

    fn can_interrupt_paragraph(&self) -> bool {
        true
    }

    fn can_accept_indented_line(&self) -> bool {
        false
    }
}
