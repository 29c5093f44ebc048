//! ATX (`# Heading`) and setext (`Heading\n===`) headings.

use crate::ast::{Document, Kind, NodeData, NodeId};
use crate::parser::attributes::parse_trailing_attributes;
use crate::parser::{BlockParser, Context, State};
use crate::text::{Reader, Segment};
use crate::utils::{indent_width, is_space, trim_right_space};

use super::block_offset;

/// Moves a trailing `{...}` attribute block from the heading's last line into
/// its attribute map.
fn apply_trailing_attributes(doc: &mut Document, node: NodeId, source: &str) {
    let Some(last) = doc.lines(node).last() else {
        return;
    };
    let Some((len, attributes)) = parse_trailing_attributes(last.raw(source)) else {
        return;
    };
    let index = doc.lines(node).len() - 1;
    doc.lines_mut(node).set(index, last.with_end(last.start + len));
    for (name, value) in attributes.iter() {
        doc.attributes_mut(node).set(name, value);
    }
}

pub struct AtxHeadingParser {
    attribute: bool,
}

impl AtxHeadingParser {
    pub fn new(attribute: bool) -> Self {
        Self { attribute }
    }
}

impl BlockParser for AtxHeadingParser {
    fn trigger(&self) -> &[u8] {
        b"#"
    }

    fn open(
        &self,
        doc: &mut Document,
        _parent: NodeId,
        reader: &mut Reader<'_>,
        _pc: &mut Context,
    ) -> Option<(NodeId, State)> {
        let line = reader.peek_line()?;
        let start = reader.offset();
        let pos = block_offset(line, reader.line_offset())?;
        let bytes = line.as_bytes();

        let mut i = pos;
        while i < bytes.len() && bytes[i] == b'#' {
            i += 1;
        }
        let level = i - pos;
        if level == 0 || level > 6 {
            return None;
        }
        if i < bytes.len() && !is_space(bytes[i]) {
            return None;
        }

        let node = doc.new_node(Kind::HEADING, NodeData::Heading { level: level as u8 });
        let content = line[i..].trim_start_matches(|c: char| c.is_ascii() && is_space(c as u8));
        let content_start = line.len() - content.len();
        let content = trim_right_space(content);

        // An optional closing sequence of `#`s must be preceded by a space.
        let without_hashes = content.trim_end_matches('#');
        let text = if without_hashes.len() == content.len() {
            content
        } else if without_hashes.is_empty() {
            ""
        } else if without_hashes.ends_with([' ', '\t']) {
            trim_right_space(without_hashes)
        } else {
            content
        };

        if !text.is_empty() {
            let seg_start = start + content_start;
            doc.lines_mut(node)
                .push(Segment::new(seg_start, seg_start + text.len()));
        }
        Some((node, State::NoChildren))
    }

    fn continue_block(&self, _: &mut Document, _: NodeId, _: &mut Reader<'_>, _: &mut Context) -> State {
        State::Close
    }

    fn close(&self, doc: &mut Document, node: NodeId, reader: &mut Reader<'_>, _pc: &mut Context) {
        if self.attribute {
            apply_trailing_attributes(doc, node, reader.source());
        }
    }

    fn can_interrupt_paragraph(&self) -> bool {
        true
    }

    fn can_accept_indented_line(&self) -> bool {
        false
    }
}

/// The underline character if `line` is a setext heading underline.
pub(crate) fn setext_underline(line: &str) -> Option<u8> {
    let (width, pos) = indent_width(line, 0);
    if width > 3 {
        return None;
    }
    let rest = trim_right_space(&line[pos..]);
    let c = *rest.as_bytes().first()?;
    if (c == b'=' || c == b'-') && rest.bytes().all(|b| b == c) {
        Some(c)
    } else {
        None
    }
}

pub struct SetextHeadingParser {
    attribute: bool,
}

impl SetextHeadingParser {
    pub fn new(attribute: bool) -> Self {
        Self { attribute }
    }
}

impl BlockParser for SetextHeadingParser {
    fn trigger(&self) -> &[u8] {
        b"-="
    }

    fn open(
        &self,
        doc: &mut Document,
        parent: NodeId,
        reader: &mut Reader<'_>,
        pc: &mut Context,
    ) -> Option<(NodeId, State)> {
        let last = pc.last_opened_block()?;
        if doc.kind(last) != Kind::PARAGRAPH || doc.parent(last) != Some(parent) {
            return None;
        }
        let line = reader.peek_line()?;
        let underline = setext_underline(line)?;
        let level = if underline == b'=' { 1 } else { 2 };
        let node = doc.new_node(Kind::HEADING, NodeData::Heading { level });
        let segment = reader.peek_line_segment()?;
        doc.lines_mut(node).push(segment);
        pc.temporary_paragraph = Some(last);
        Some((node, State::RequireParagraph))
    }

    fn continue_block(&self, _: &mut Document, _: NodeId, _: &mut Reader<'_>, _: &mut Context) -> State {
        State::Close
    }

    /// Takes over the lines of the paragraph above the underline. If that
    /// paragraph is gone the underline is only text and becomes a paragraph.
    fn close(&self, doc: &mut Document, node: NodeId, reader: &mut Reader<'_>, pc: &mut Context) {
        let source = reader.source();
        let paragraph = pc.temporary_paragraph.take();
        let Some(parent) = doc.parent(node) else {
            return;
        };
        match paragraph {
            Some(paragraph) if doc.parent(paragraph).is_some() && !doc.lines(paragraph).is_empty() => {
                let lines = doc.lines(paragraph).clone();
                doc.set_lines(node, lines);
                let blank = doc.blank_previous_lines(paragraph);
                doc.set_blank_previous_lines(node, blank);
                if let Some(paragraph_parent) = doc.parent(paragraph) {
                    doc.remove_child(paragraph_parent, paragraph);
                }
                if self.attribute {
                    apply_trailing_attributes(doc, node, source);
                }
            }
            _ => {
                let replacement = doc.new_node(Kind::PARAGRAPH, NodeData::Paragraph);
                if let Some(underline) = doc.lines(node).first() {
                    let underline = underline.trim_left_space(source).trim_right_space(source);
                    doc.lines_mut(replacement).push(underline);
                }
                let blank = doc.blank_previous_lines(node);
                doc.set_blank_previous_lines(replacement, blank);
                doc.replace_child(parent, node, replacement);
            }
        }
    }

    fn can_interrupt_paragraph(&self) -> bool {
        true
    }

    fn can_accept_indented_line(&self) -> bool {
        false
    }
}
