//! Link reference definitions: extraction from paragraphs and resolution.

use markweave::ast::{LinkData, NodeData, ReferenceType};
use markweave::parser::Context;
use markweave::{Config, Document, Kind, Markdown, Parser, ParserBuilder};

fn parser() -> Parser {
    ParserBuilder::with_defaults(&Config::default().parser).build()
}

fn parse(source: &str) -> (Document, Context) {
    parser().parse_with_context(source)
}

fn top_level_kinds(doc: &Document) -> Vec<&'static str> {
    doc.children(doc.root()).map(|c| doc.kind_name(c)).collect()
}

fn first_link(doc: &Document) -> Option<&LinkData> {
    doc.descendants(doc.root())
        .into_iter()
        .find_map(|n| match doc.data(n) {
            NodeData::Link(link) => Some(link),
            _ => None,
        })
}

fn html(source: &str) -> String {
    let markdown = Markdown::new(&Config::default()).unwrap();
    let mut out = Vec::new();
    markdown.convert(source, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_forward_reference_resolves() {
    let source = "[a]\n\n[a]: /u \"t\"";
    let (doc, pc) = parse(source);

    let link = first_link(&doc).expect("link");
    assert_eq!(link.destination, "/u");
    assert_eq!(link.title.as_deref(), Some("t"));
    assert_eq!(link.reference_type, ReferenceType::Shortcut);
    assert_eq!(pc.references().len(), 1);
}

#[test]
fn test_first_definition_wins() {
    let source = "[x]: /first\n[x]: /second \"ignored\"\n\n[x]";
    let (doc, pc) = parse(source);

    assert_eq!(pc.references().len(), 1);
    assert_eq!(pc.reference("x").unwrap().destination, "/first");
    assert_eq!(first_link(&doc).unwrap().destination, "/first");
    // Both definitions are still nodes of the tree.
    assert_eq!(
        top_level_kinds(&doc),
        vec!["LinkReferenceDefinition", "LinkReferenceDefinition", "Paragraph"]
    );
}

#[test]
fn test_first_definition_wins_across_containers() {
    similar_asserts::assert_eq!(
        html("> [a]: /quoted\n\n[a]: /top\n\n[a]\n"),
        "<blockquote>\n</blockquote>\n<p><a href=\"/quoted\">a</a></p>\n"
    );
}

#[test]
fn test_definition_is_spliced_out_of_paragraph() {
    let source = "[x]: /y\npara text\n";
    let (doc, pc) = parse(source);

    assert_eq!(top_level_kinds(&doc), vec!["LinkReferenceDefinition", "Paragraph"]);
    let para = doc.last_child(doc.root()).unwrap();
    assert_eq!(doc.lines(para).value(source), "para text");
    assert!(pc.reference("x").is_some());
}

#[test]
fn test_definition_cannot_interrupt_paragraph() {
    let (doc, pc) = parse("para text\n[x]: /y\n");
    assert_eq!(top_level_kinds(&doc), vec!["Paragraph"]);
    assert!(pc.references().is_empty());
}

#[test]
fn test_lone_definition_leaves_no_paragraph() {
    let (doc, pc) = parse("[x]: /y\n");
    assert_eq!(top_level_kinds(&doc), vec!["LinkReferenceDefinition"]);
    let node = doc.first_child(doc.root()).unwrap();
    assert_eq!(doc.kind(node), Kind::LINK_REFERENCE_DEFINITION);
    assert_eq!(pc.reference("x").unwrap().destination, "/y");
}

#[test]
fn test_unterminated_title_keeps_destination() {
    let source = "[a]: /u\n\"untitled\n\nafter\n";
    let (doc, pc) = parse(source);

    let reference = pc.reference("a").unwrap();
    assert_eq!(reference.destination, "/u");
    assert_eq!(reference.title, None);

    // Only the destination line is consumed; the rest stays paragraph text.
    assert_eq!(
        top_level_kinds(&doc),
        vec!["LinkReferenceDefinition", "Paragraph", "Paragraph"]
    );
    let para = doc.children(doc.root()).nth(1).unwrap();
    assert_eq!(doc.lines(para).value(source), "\"untitled");
}

#[test]
fn test_unterminated_title_on_destination_line_fails() {
    let (doc, pc) = parse("[a]: /u \"untitled\n\nafter\n");
    assert!(pc.references().is_empty());
    assert_eq!(top_level_kinds(&doc), vec!["Paragraph", "Paragraph"]);
}

#[test]
fn test_indentation_boundary() {
    let (_, pc) = parse("   [a]: /three\n");
    assert!(pc.reference("a").is_some());

    let (doc, pc) = parse("    [b]: /four\n");
    assert!(pc.references().is_empty());
    assert_eq!(top_level_kinds(&doc), vec!["CodeBlock"]);

    let (_, pc) = parse("\t[c]: /tab\n");
    assert!(pc.references().is_empty());
}

#[test]
fn test_labels_are_normalized() {
    let source = "[Foo Bar]: /u\n\n[foo  bar] [FOO\nBAR]";
    let (doc, pc) = parse(source);

    assert!(pc.reference("foo bar").is_some());
    let links: Vec<_> = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|&n| doc.kind(n) == Kind::LINK)
        .collect();
    assert_eq!(links.len(), 2);
}

#[test]
fn test_unknown_label_stays_text() {
    similar_asserts::assert_eq!(html("[nope]\n\n[yes]: /y\n"), "<p>[nope]</p>\n");
}

#[test]
fn test_definition_title_spans_lines() {
    let (_, pc) = parse("[a]: /u\n'one\ntwo'\n");
    assert_eq!(pc.reference("a").unwrap().title.as_deref(), Some("one\ntwo"));
}
