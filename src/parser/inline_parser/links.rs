//! Links and images: `[text](dest "title")`, `[text][label]`, `[label][]`
//! and `[label]`, each optionally prefixed with `!`.
//!
//! `[` and `![` push a [`LinkOpener`]. At `]` the innermost opener is
//! popped and the forms are tried in order: inline, full or collapsed
//! reference, shortcut reference. A successful link adopts every node that
//! followed its opener.

use crate::ast::{Delimiter, Document, Kind, LinkData, NodeData, NodeId, ReferenceType};
use crate::parser::reference_definitions::MAX_LABEL_LENGTH;
use crate::parser::{Context, InlineParser, LinkOpener};
use crate::text::{FindClosureOptions, Position, Reader, Segment, Segments};
use crate::utils::{is_blank, is_punct, is_space};

use super::{merge_or_replace_text, process_delimiters};

const LABEL_OPTIONS: FindClosureOptions = FindClosureOptions {
    nesting: false,
    newline: true,
};

/// Parses a link destination at the reader's position, either `<...>` or a
/// run of non-space bytes with balanced parentheses. Returns the destination
/// as written, escapes intact.
pub(crate) fn parse_link_destination(reader: &mut Reader<'_>) -> Option<String> {
    let line = reader.peek_line()?;
    let bytes = line.as_bytes();

    if bytes.first() == Some(&b'<') {
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if i + 1 < bytes.len() && is_punct(bytes[i + 1]) => {
                    i += 2;
                    continue;
                }
                b'>' => {
                    let destination = line[1..i].to_string();
                    reader.advance(i + 1);
                    return Some(destination);
                }
                b'\n' | b'\r' | b'<' => return None,
                _ => {}
            }
            i += 1;
        }
        return None;
    }

    let mut depth: isize = 0;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\\' && i + 1 < bytes.len() && is_punct(bytes[i + 1]) {
            i += 2;
            continue;
        }
        if c == b'(' {
            depth += 1;
        } else if c == b')' {
            depth -= 1;
            if depth < 0 {
                break;
            }
        } else if is_space(c) || c.is_ascii_control() {
            break;
        }
        i += 1;
    }
    if i == 0 || depth > 0 {
        return None;
    }
    let destination = line[..i].to_string();
    reader.advance(i);
    Some(destination)
}

/// Parses a `"..."`, `'...'` or `(...)` title, which may span lines.
pub(crate) fn parse_link_title(reader: &mut Reader<'_>) -> Option<String> {
    let (open, close) = match reader.peek_byte()? {
        b'"' => (b'"', b'"'),
        b'\'' => (b'\'', b'\''),
        b'(' => (b'(', b')'),
        _ => return None,
    };
    let saved = reader.position();
    reader.advance(1);
    match reader.find_closure(open, close, LABEL_OPTIONS) {
        Some(segments) => Some(segments_text(reader, &segments)),
        None => {
            reader.set_position(saved);
            None
        }
    }
}

fn segments_text(reader: &Reader<'_>, segments: &Segments) -> String {
    segments.iter().map(|s| reader.value(*s)).collect()
}

/// Turns an opener that will not become a link back into text.
fn opener_to_text(doc: &mut Document, opener: &LinkOpener) {
    if let NodeData::Delimiter(delimiter) = doc.data(opener.node) {
        let segment = delimiter.segment;
        merge_or_replace_text(doc, opener.node, segment);
    }
}

pub struct LinkParser;

impl LinkParser {
    fn open(&self, doc: &mut Document, block: &mut Reader<'_>, pc: &mut Context, image: bool) -> NodeId {
        let start = block.offset();
        let width = if image { 2 } else { 1 };
        block.advance(width);
        let node = doc.new_node(
            Kind::DELIMITER,
            NodeData::Delimiter(Delimiter {
                char: if image { b'!' } else { b'[' },
                segment: Segment::new(start, start + width),
                original_length: width,
                can_open: false,
                can_close: false,
            }),
        );
        pc.link_openers.push(LinkOpener {
            node,
            image,
            delimiter_bottom: pc.delimiters.len(),
            active: true,
            position: block.position(),
        });
        node
    }

    /// `(dest "title")` after the closing bracket.
    fn parse_inline(&self, block: &mut Reader<'_>) -> Option<LinkData> {
        block.advance(1);
        block.skip_spaces();
        let link = |destination: String, title: Option<String>| LinkData {
            destination,
            title,
            reference_type: ReferenceType::Inline,
            label: None,
        };
        if block.peek_byte() == Some(b')') {
            block.advance(1);
            return Some(link(String::new(), None));
        }
        let destination = parse_link_destination(block)?;
        let (_, spaces) = block.skip_spaces();
        if block.peek_byte() == Some(b')') {
            block.advance(1);
            return Some(link(destination, None));
        }
        if spaces == 0 {
            return None;
        }
        let title = parse_link_title(block)?;
        block.skip_spaces();
        if block.peek_byte() != Some(b')') {
            return None;
        }
        block.advance(1);
        Some(link(destination, Some(title)))
    }

    /// `[label]` or `[]` after the closing bracket. The error case means the
    /// brackets formed a label that does not resolve, which rules out the
    /// shortcut form too.
    fn parse_reference(&self, block: &mut Reader<'_>, text_label: &str, pc: &Context) -> Result<Option<LinkData>, ()> {
        block.advance(1);
        let Some(segments) = block.find_closure(b'[', b']', LABEL_OPTIONS) else {
            return Ok(None);
        };
        let written = segments_text(block, &segments);
        let (label, reference_type) = if is_blank(&written) {
            (text_label.to_string(), ReferenceType::Collapsed)
        } else {
            (written, ReferenceType::Full)
        };
        if label.chars().count() > MAX_LABEL_LENGTH {
            return Err(());
        }
        let reference = pc.reference(&label).ok_or(())?;
        Ok(Some(LinkData {
            destination: reference.destination.clone(),
            title: reference.title.clone(),
            reference_type,
            label: Some(label),
        }))
    }

    fn close(&self, doc: &mut Document, block: &mut Reader<'_>, pc: &mut Context) -> Option<NodeId> {
        let opener = pc.link_openers.pop()?;
        if !opener.active {
            opener_to_text(doc, &opener);
            return None;
        }
        let text_end: Position = block.position();
        let text_label = segments_text(block, &block.between(opener.position, text_end));
        block.advance(1);
        let after_bracket = block.position();

        let mut data = None;
        match block.peek_byte() {
            Some(b'(') => data = self.parse_inline(block),
            Some(b'[') => match self.parse_reference(block, &text_label, pc) {
                Ok(found) => data = found,
                Err(()) => {
                    opener_to_text(doc, &opener);
                    return None;
                }
            },
            _ => {}
        }

        let data = match data {
            Some(data) => data,
            None => {
                block.set_position(after_bracket);
                let reference = (text_label.chars().count() <= MAX_LABEL_LENGTH)
                    .then(|| pc.reference(&text_label))
                    .flatten();
                let Some(reference) = reference else {
                    opener_to_text(doc, &opener);
                    return None;
                };
                LinkData {
                    destination: reference.destination.clone(),
                    title: reference.title.clone(),
                    reference_type: ReferenceType::Shortcut,
                    label: Some(text_label),
                }
            }
        };

        log::trace!(
            "{} to {:?} ({:?})",
            if opener.image { "Image" } else { "Link" },
            data.destination,
            data.reference_type
        );
        process_delimiters(doc, pc, opener.delimiter_bottom);
        let node = if opener.image {
            doc.new_node(Kind::IMAGE, NodeData::Image(data))
        } else {
            doc.new_node(Kind::LINK, NodeData::Link(data))
        };
        let mut child = doc.next_sibling(opener.node);
        while let Some(current) = child {
            child = doc.next_sibling(current);
            doc.append_child(node, current);
        }
        if let Some(parent) = doc.parent(opener.node) {
            doc.remove_child(parent, opener.node);
        }
        if !opener.image {
            for earlier in pc.link_openers.iter_mut().filter(|o| !o.image) {
                earlier.active = false;
            }
        }
        Some(node)
    }
}

impl InlineParser for LinkParser {
    fn trigger(&self) -> &[u8] {
        b"[!]"
    }

    fn parse(&self, doc: &mut Document, _parent: NodeId, block: &mut Reader<'_>, pc: &mut Context) -> Option<NodeId> {
        match block.peek_byte()? {
            b'[' => Some(self.open(doc, block, pc, false)),
            b'!' => {
                let line = block.peek_line()?;
                if line.as_bytes().get(1) != Some(&b'[') {
                    return None;
                }
                Some(self.open(doc, block, pc, true))
            }
            b']' => self.close(doc, block, pc),
            _ => None,
        }
    }

    fn close_block(&self, doc: &mut Document, _parent: NodeId, pc: &mut Context) {
        for opener in std::mem::take(&mut pc.link_openers) {
            opener_to_text(doc, &opener);
        }
    }
}
