//! Extraction of link reference definitions from the start of paragraphs.
//!
//! Definitions are only recognized at paragraph level, so extraction runs as a
//! paragraph transformer when each paragraph closes. Every definition found
//! becomes a [`Kind::LINK_REFERENCE_DEFINITION`] node placed before the
//! paragraph, and its lines are spliced out of the paragraph. A paragraph
//! left with no lines is removed.

use crate::ast::{Document, Kind, NodeData, NodeId};
use crate::parser::inline_parser::links::parse_link_destination;
use crate::parser::{Context, ParagraphTransformer, Reference};
use crate::text::{FindClosureOptions, Reader, Segments};
use crate::utils::{indent_width, is_blank};

/// Labels longer than this many characters are rejected.
pub const MAX_LABEL_LENGTH: usize = 999;

const CLOSURE_OPTIONS: FindClosureOptions = FindClosureOptions {
    nesting: false,
    newline: true,
};

pub struct LinkReferenceTransformer;

impl ParagraphTransformer for LinkReferenceTransformer {
    fn transform(&self, doc: &mut Document, paragraph: NodeId, source: &str, pc: &mut Context) {
        let Some(parent) = doc.parent(paragraph) else {
            return;
        };
        let mut lines = doc.lines(paragraph).clone();
        let mut reader = Reader::new(source, lines.clone());
        let mut removes: Vec<(usize, usize)> = Vec::new();

        while let Some((reference, start, end)) = parse_link_reference_definition(&mut reader) {
            let end = if start == end { end + 1 } else { end }.min(lines.len());
            removes.push((start, end));
            log::debug!(
                "Reference definition [{}] -> {:?} (lines {}..{})",
                reference.label,
                reference.destination,
                start,
                end
            );

            let node = doc.new_node(
                Kind::LINK_REFERENCE_DEFINITION,
                NodeData::LinkReferenceDefinition {
                    label: reference.label.clone(),
                    destination: reference.destination.clone(),
                    title: reference.title.clone(),
                },
            );
            doc.set_lines(node, Segments::from(lines.sliced(start, end).to_vec()));
            doc.insert_before(parent, Some(paragraph), node);
            if doc.blank_previous_lines(paragraph) {
                doc.set_blank_previous_lines(node, true);
                doc.set_blank_previous_lines(paragraph, false);
            }
            pc.add_reference(reference);

            // The next candidate starts on the first line not consumed.
            reader.seek_line(end);
        }

        let mut removed = 0;
        for (start, end) in removes {
            if lines.is_empty() {
                break;
            }
            let tail = lines.sliced(end - removed, lines.len()).to_vec();
            lines.set_sliced(0, start - removed);
            lines.append_all(&tail);
            removed += end - start;
        }

        if lines.is_empty() {
            log::trace!("Paragraph consisted of reference definitions only");
            doc.remove_child(parent, paragraph);
            return;
        }
        doc.set_lines(paragraph, lines);
    }
}

/// Concatenates the text of a closure scan.
fn closure_text(reader: &Reader<'_>, segments: &Segments) -> String {
    segments.iter().map(|s| reader.value(*s)).collect()
}

/// Parses one definition at the reader's position.
///
/// Returns the reference and the half-open range of reader lines it spans.
/// The range may be empty when the definition ends partway into its first
/// line; callers widen it to one line.
pub fn parse_link_reference_definition(reader: &mut Reader<'_>) -> Option<(Reference, usize, usize)> {
    let line = reader.peek_line()?;
    let start = reader.position().line;
    let (width, pos) = indent_width(line, reader.line_offset());
    if width + reader.padding() > 3 {
        return None;
    }
    if line.as_bytes().get(pos) != Some(&b'[') {
        return None;
    }
    reader.advance(pos + 1);

    let segments = reader.find_closure(b'[', b']', CLOSURE_OPTIONS)?;
    let label = closure_text(reader, &segments);
    if is_blank(&label) || label.chars().count() > MAX_LABEL_LENGTH {
        return None;
    }
    if reader.peek_byte() != Some(b':') {
        return None;
    }
    reader.advance(1);
    reader.skip_spaces();
    let destination = parse_link_destination(reader)?;

    let is_new_line = reader.peek_line().is_none_or(is_blank);
    let end_line = reader.position().line;
    let (_, spaces) = reader.skip_spaces();
    let (opener, closer) = match reader.peek_byte() {
        Some(b'"') => (b'"', b'"'),
        Some(b'\'') => (b'\'', b'\''),
        Some(b'(') => (b'(', b')'),
        _ => {
            if !is_new_line {
                return None;
            }
            return Some((Reference::new(label, destination, None), start, end_line + 1));
        }
    };
    if spaces == 0 {
        return None;
    }
    reader.advance(1);
    let Some(segments) = reader.find_closure(opener, closer, CLOSURE_OPTIONS) else {
        if !is_new_line {
            return None;
        }
        log::trace!("Unterminated title after [{}], keeping the destination", label);
        return Some((Reference::new(label, destination, None), start, end_line + 1));
    };
    let title = closure_text(reader, &segments);

    if reader.peek_line().is_some_and(|rest| !is_blank(rest)) {
        if !is_new_line {
            return None;
        }
        log::trace!("Title of [{}] followed by text, dropping it", label);
        return Some((Reference::new(label, destination, None), start, end_line));
    }
    let title_line = reader.position().line;
    Some((Reference::new(label, destination, Some(title)), start, title_line + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::parser::ParserBuilder;

    fn parse(source: &str) -> (Document, Context) {
        ParserBuilder::with_defaults(&ParserConfig::default())
            .build()
            .parse_with_context(source)
    }

    fn kinds(doc: &Document) -> Vec<&'static str> {
        doc.children(doc.root()).map(|c| doc.kind_name(c)).collect()
    }

    #[test]
    fn test_definition_with_title() {
        let mut reader = Reader::from_source("[Foo]: /url \"the title\"\n");
        let (reference, start, end) = parse_link_reference_definition(&mut reader).unwrap();
        assert_eq!(reference, Reference::new("Foo", "/url", Some("the title".to_string())));
        assert_eq!((start, end), (0, 1));
    }

    #[test]
    fn test_angle_destination_and_paren_title() {
        let mut reader = Reader::from_source("[a]: <my url> (t)\n");
        let (reference, _, _) = parse_link_reference_definition(&mut reader).unwrap();
        assert_eq!(reference.destination, "my url");
        assert_eq!(reference.title.as_deref(), Some("t"));
    }

    #[test]
    fn test_title_on_next_line() {
        let mut reader = Reader::from_source("[a]:\n/u\n'multi\nline'\n");
        let (reference, start, end) = parse_link_reference_definition(&mut reader).unwrap();
        assert_eq!(reference.destination, "/u");
        assert_eq!(reference.title.as_deref(), Some("multi\nline"));
        assert_eq!((start, end), (0, 4));
    }

    #[test]
    fn test_title_needs_preceding_space() {
        let mut reader = Reader::from_source("[a]: <u>\"t\"\n");
        assert!(parse_link_reference_definition(&mut reader).is_none());
    }

    #[test]
    fn test_trailing_text_after_destination_fails() {
        let mut reader = Reader::from_source("[a]: /u foo\n");
        assert!(parse_link_reference_definition(&mut reader).is_none());
    }

    #[test]
    fn test_blank_and_oversized_labels_fail() {
        let mut reader = Reader::from_source("[  ]: /u\n");
        assert!(parse_link_reference_definition(&mut reader).is_none());
        let source = format!("[{}]: /u\n", "x".repeat(MAX_LABEL_LENGTH + 1));
        let mut reader = Reader::from_source(&source);
        assert!(parse_link_reference_definition(&mut reader).is_none());
        let source = format!("[{}]: /u\n", "x".repeat(MAX_LABEL_LENGTH));
        let mut reader = Reader::from_source(&source);
        assert!(parse_link_reference_definition(&mut reader).is_some());
    }

    #[test]
    fn test_label_with_unescaped_bracket_fails() {
        let mut reader = Reader::from_source("[a[b]: /u\n");
        assert!(parse_link_reference_definition(&mut reader).is_none());
        let mut reader = Reader::from_source("[a\\[b]: /u\n");
        assert_eq!(parse_link_reference_definition(&mut reader).unwrap().0.label, "a\\[b");
    }

    #[test]
    fn test_paragraph_text_after_definition_is_kept() {
        let source = "[x]: /y\npara text\n";
        let (doc, pc) = parse(source);
        assert_eq!(kinds(&doc), vec!["LinkReferenceDefinition", "Paragraph"]);
        let para = doc.last_child(doc.root()).unwrap();
        assert_eq!(doc.lines(para).value(source), "para text");
        assert_eq!(pc.reference("X").unwrap().destination, "/y");
    }

    #[test]
    fn test_definitions_only_paragraph_is_removed() {
        let (doc, pc) = parse("[a]: /1\n[b]: /2 'two'\n");
        assert_eq!(
            kinds(&doc),
            vec!["LinkReferenceDefinition", "LinkReferenceDefinition"]
        );
        assert_eq!(pc.references().len(), 2);
        assert_eq!(pc.reference("b").unwrap().title.as_deref(), Some("two"));
    }

    #[test]
    fn test_title_followed_by_text_is_dropped() {
        let source = "[foo]: /url\n\"title\" ok\n";
        let (doc, pc) = parse(source);
        assert_eq!(kinds(&doc), vec!["LinkReferenceDefinition", "Paragraph"]);
        assert_eq!(pc.reference("foo").unwrap().title, None);
        let para = doc.last_child(doc.root()).unwrap();
        assert_eq!(doc.lines(para).value(source), "\"title\" ok");
    }

    #[test]
    fn test_blank_previous_lines_moves_to_definition() {
        let (doc, _) = parse("a\n\n[x]: /y\nb\n");
        let children: Vec<_> = doc.children(doc.root()).collect();
        assert_eq!(children.len(), 3);
        assert!(doc.blank_previous_lines(children[1]));
        assert!(!doc.blank_previous_lines(children[2]));
    }

    #[test]
    fn test_indented_continuation_is_not_a_definition() {
        let source = "[a]: /u\n    [b]: /v\n";
        let (doc, pc) = parse(source);
        assert!(pc.reference("a").is_some());
        assert!(pc.reference("b").is_none());
        assert_eq!(kinds(&doc), vec!["LinkReferenceDefinition", "Paragraph"]);
    }
}
