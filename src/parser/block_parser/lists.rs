//! Bullet and ordered lists.
//!
//! A [`ListParser`] opens the list container and decides, line by line,
//! whether the list goes on; a [`ListItemParser`] opens each item and strips
//! the item's content indentation from continuation lines. Tightness is
//! decided when the list closes.

use crate::ast::{Document, Kind, NodeData, NodeId};
use crate::parser::{BlockParser, Context, State};
use crate::text::Reader;
use crate::utils::{indent_position, indent_width, is_blank};

use super::headings::setext_underline;
use super::horizontal_rules::is_thematic_break;
use super::indent_position_padded;

/// A list item marker found at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListMarker {
    /// Spaces before the marker.
    pub(crate) indent: usize,
    /// Byte position just past the marker.
    pub(crate) end: usize,
    /// `-`, `+`, `*`, `.` or `)`.
    pub(crate) marker: u8,
    pub(crate) start: Option<u32>,
    /// Whether anything but whitespace follows the marker.
    pub(crate) has_content: bool,
}

/// Recognizes a list marker. In strict mode the marker may be indented by at
/// most three spaces.
pub(crate) fn match_list_marker(line: &str, strict: bool) -> Option<ListMarker> {
    let bytes = line.as_bytes();
    let indent = bytes.iter().take_while(|&&b| b == b' ').count();
    if strict && indent > 3 {
        return None;
    }
    let mut i = indent;
    let (marker, start) = match bytes.get(i) {
        Some(&b @ (b'-' | b'+' | b'*')) => {
            i += 1;
            (b, None)
        }
        Some(b) if b.is_ascii_digit() => {
            let digits = bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > 9 {
                return None;
            }
            let number: u32 = line[i..i + digits].parse().ok()?;
            i += digits;
            match bytes.get(i) {
                Some(&b @ (b'.' | b')')) => {
                    i += 1;
                    (b, Some(number))
                }
                _ => return None,
            }
        }
        _ => return None,
    };
    let rest = &line[i..];
    if let Some(&next) = rest.as_bytes().first()
        && next != b'\n'
        && next != b'\r'
        && indent_width(rest, 0).0 == 0
    {
        return None;
    }
    Some(ListMarker {
        indent,
        end: i,
        marker,
        start,
        has_content: !is_blank(rest),
    })
}

/// Columns between the marker and the item's content. An item that starts
/// blank, or whose content is indented code, gets one column.
fn content_offset(line: &str, column: usize, marker: &ListMarker) -> usize {
    if !marker.has_content {
        return 1;
    }
    let (width, _) = indent_width(&line[marker.end..], column + marker.end);
    if width > 4 { 1 } else { width }
}

/// Content offset of the list's last item, or zero for an empty list.
fn last_offset(doc: &Document, list: NodeId) -> usize {
    match doc.last_child(list).map(|item| doc.data(item)) {
        Some(NodeData::ListItem { offset }) => *offset,
        _ => 0,
    }
}

pub struct ListParser;

impl BlockParser for ListParser {
    fn trigger(&self) -> &[u8] {
        b"-+*0123456789"
    }

    fn open(
        &self,
        doc: &mut Document,
        parent: NodeId,
        reader: &mut Reader<'_>,
        pc: &mut Context,
    ) -> Option<(NodeId, State)> {
        let last = pc.last_opened_block();
        if pc.skip_list_parser || last.is_some_and(|last| doc.kind(last) == Kind::LIST) {
            pc.skip_list_parser = false;
            return None;
        }
        let line = reader.peek_line()?;
        let marker = match_list_marker(line, true)?;

        if let Some(last) = last
            && doc.kind(last) == Kind::PARAGRAPH
            && doc.parent(last) == Some(parent)
        {
            // Only a non-empty item, numbered 1 if ordered, interrupts a
            // paragraph.
            if marker.start.is_some_and(|start| start != 1) || !marker.has_content {
                return None;
            }
        }

        log::trace!("List open: marker={:?} start={:?}", marker.marker as char, marker.start);
        let node = doc.new_node(
            Kind::LIST,
            NodeData::List {
                marker: marker.marker,
                start: marker.start,
                tight: true,
            },
        );
        pc.empty_list_item_with_blank_lines = false;
        Some((node, State::HasChildren))
    }

    fn continue_block(&self, doc: &mut Document, node: NodeId, reader: &mut Reader<'_>, pc: &mut Context) -> State {
        let NodeData::List { marker: list_marker, .. } = *doc.data(node) else {
            return State::Close;
        };
        let Some(line) = reader.peek_line() else {
            return State::Close;
        };
        let last_item = doc.last_child(node);
        let last_is_empty = last_item.is_some_and(|item| !doc.has_children(item));
        if is_blank(line) {
            if last_is_empty {
                pc.empty_list_item_with_blank_lines = true;
            }
            return State::HasChildren;
        }

        // A line indented less than the last item's content, or following an
        // empty item, may start a sibling item.
        let offset = last_offset(doc, node);
        let (indent, _) = indent_width(line, reader.line_offset());
        if indent < offset || last_is_empty {
            if indent < 4
                && let Some(marker) = match_list_marker(line, false)
                && marker.indent.saturating_sub(offset) < 4
            {
                if marker.marker != list_marker {
                    return State::Close;
                }
                let from_marker = &line[marker.end - 1..];
                if is_thematic_break(from_marker, 0) {
                    let setext = pc
                        .last_opened_block()
                        .is_some_and(|last| doc.kind(last) == Kind::PARAGRAPH)
                        && setext_underline(from_marker) == Some(b'-');
                    if !setext {
                        return State::Close;
                    }
                }
                return State::HasChildren;
            }
            if !last_is_empty {
                return State::Close;
            }
        }

        if last_is_empty && indent < offset {
            return State::Close;
        }
        // Content cannot follow an empty item separated by blank lines.
        if pc.empty_list_item_with_blank_lines {
            return State::Close;
        }
        State::HasChildren
    }

    /// A list is loose if any item is preceded by a blank line, or holds
    /// blocks separated by one. Paragraphs of tight lists become text blocks.
    fn close(&self, doc: &mut Document, node: NodeId, _reader: &mut Reader<'_>, _pc: &mut Context) {
        let items: Vec<NodeId> = doc.children(node).collect();
        let loose = items.iter().enumerate().any(|(i, &item)| {
            (i > 0 && doc.blank_previous_lines(item))
                || doc
                    .children(item)
                    .skip(1)
                    .any(|child| doc.blank_previous_lines(child))
        });
        if let NodeData::List { tight, .. } = doc.data_mut(node) {
            *tight = !loose;
        }
        if loose {
            return;
        }
        for item in items {
            let paragraphs: Vec<NodeId> = doc
                .children(item)
                .filter(|&child| doc.kind(child) == Kind::PARAGRAPH)
                .collect();
            for paragraph in paragraphs {
                let block = doc.new_node(Kind::TEXT_BLOCK, NodeData::TextBlock);
                doc.set_lines(block, doc.lines(paragraph).clone());
                doc.set_blank_previous_lines(block, doc.blank_previous_lines(paragraph));
                doc.replace_child(item, paragraph, block);
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

pub struct ListItemParser;

impl BlockParser for ListItemParser {
    fn open(
        &self,
        doc: &mut Document,
        parent: NodeId,
        reader: &mut Reader<'_>,
        pc: &mut Context,
    ) -> Option<(NodeId, State)> {
        if doc.kind(parent) != Kind::LIST {
            return None;
        }
        let offset = last_offset(doc, parent);
        let line = reader.peek_line()?;
        let marker = match_list_marker(line, false)?;
        if marker.indent.saturating_sub(offset) > 3 {
            return None;
        }
        pc.empty_list_item_with_blank_lines = false;
        pc.skip_list_parser = false;

        let column = reader.line_offset();
        let item_offset = content_offset(line, column, &marker);
        let node = doc.new_node(
            Kind::LIST_ITEM,
            NodeData::ListItem {
                offset: marker.end + item_offset,
            },
        );
        if !marker.has_content {
            return Some((node, State::NoChildren));
        }
        let (pos, padding) =
            indent_position(&line[marker.end..], column + marker.end, item_offset).unwrap_or((0, 0));
        reader.advance_and_set_padding(marker.end + pos, padding);
        Some((node, State::HasChildren))
    }

    fn continue_block(&self, doc: &mut Document, node: NodeId, reader: &mut Reader<'_>, pc: &mut Context) -> State {
        let Some(line) = reader.peek_line() else {
            return State::Close;
        };
        if is_blank(line) {
            let newline = usize::from(line.ends_with('\n'));
            reader.advance(line.len() - newline);
            return State::HasChildren;
        }

        let NodeData::ListItem { offset } = *doc.data(node) else {
            return State::Close;
        };
        let column = reader.line_offset();
        let is_empty = !doc.has_children(node) && pc.empty_list_item_with_blank_lines;
        let (indent, indent_bytes) = indent_width(line, column);
        if (is_empty || indent < offset) && indent < 4 {
            if match_list_marker(line, true).is_some() {
                pc.skip_list_parser = true;
                return State::Close;
            }
            if !is_empty {
                return State::Close;
            }
        }
        let (pos, padding) =
            indent_position_padded(line, column, reader.padding(), offset).unwrap_or((indent_bytes, 0));
        reader.advance_and_set_padding(pos, padding);
        State::HasChildren
    }

    fn can_interrupt_paragraph(&self) -> bool {
        true
    }

    fn can_accept_indented_line(&self) -> bool {
        false
    }
}
