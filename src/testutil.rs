//! Helpers for fixture-driven tests and for comparing document trees.
//!
//! A fixture file is a sequence of cases:
//!
//! ```text
//! 3: optional description
//! //- - - - - - - - -//
//! *markdown*
//! //- - - - - - - - -//
//! <p><em>markdown</em></p>
//! //= = = = = = = = = = = = = = = = = = = = = = = =//
//! ```
//!
//! The helpers panic on failure, like the `assert!` family.

use std::collections::HashMap;

use similar::TextDiff;

use crate::ast::{Document, Kind, KindRegistry, NodeData, NodeId};
use crate::error::ConfigError;
use crate::Markdown;

pub const ATTRIBUTE_SEPARATOR: &str = "//- - - - - - - - -//";
pub const CASE_SEPARATOR: &str = "//= = = = = = = = = = = = = = = = = = = = = = = =//";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownTestCase {
    pub no: usize,
    pub description: String,
    pub markdown: String,
    pub expected: String,
}

/// Reads the cases of a fixture file. `name` is only used in error messages.
pub fn parse_cases(name: &str, input: &str) -> Result<Vec<MarkdownTestCase>, String> {
    let mut lines = input.lines().enumerate().map(|(i, line)| (i + 1, line));
    let mut cases = Vec::new();

    while let Some((number, header)) = lines.next() {
        if header.trim().is_empty() {
            continue;
        }
        let (no, description) = match header.split_once(':') {
            Some((no, description)) => (no, description.to_string()),
            None => (header, String::new()),
        };
        let no = no
            .trim()
            .parse()
            .map_err(|_| format!("{}: invalid case number at line {}", name, number))?;

        match lines.next() {
            Some((_, ATTRIBUTE_SEPARATOR)) => {}
            Some((number, other)) => {
                return Err(format!("{}: invalid separator '{}' at line {}", name, other, number));
            }
            None => return Err(format!("{}: invalid case at line {}", name, number)),
        }

        let markdown: Vec<_> = lines
            .by_ref()
            .map(|(_, line)| line)
            .take_while(|&line| line != ATTRIBUTE_SEPARATOR)
            .collect();
        let expected: Vec<_> = lines
            .by_ref()
            .map(|(_, line)| line)
            .take_while(|&line| line != CASE_SEPARATOR)
            .collect();

        cases.push(MarkdownTestCase {
            no,
            description,
            markdown: markdown.join("\n"),
            expected: expected.join("\n"),
        });
    }
    Ok(cases)
}

fn report(case: &MarkdownTestCase, actual: &str) -> String {
    let description = if case.description.is_empty() {
        String::new()
    } else {
        format!(": {}", case.description)
    };
    let diff = TextDiff::from_lines(case.expected.trim(), actual.trim())
        .unified_diff()
        .header("expected", "actual")
        .to_string();
    format!(
        "============= case {}{} ================\n\
         Markdown:\n-----------\n{}\n\n\
         Expected:\n----------\n{}\n\n\
         Actual\n---------\n{}\n\n\
         Diff\n---------\n{}",
        case.no, description, case.markdown, case.expected, actual, diff
    )
}

/// Converts the case's Markdown and compares the output to the expected
/// text, ignoring surrounding whitespace.
pub fn do_test_case(markdown: &Markdown, case: &MarkdownTestCase) {
    let mut out = Vec::new();
    let actual = match markdown.convert(&case.markdown, &mut out) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(e) => format!("error: {}", e),
    };
    if actual.trim() != case.expected.trim() {
        panic!("{}", report(case, &actual));
    }
}

pub fn do_test_cases(markdown: &Markdown, cases: &[MarkdownTestCase]) {
    for case in cases {
        do_test_case(markdown, case);
    }
}

/// One side of a structural comparison.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    pub doc: &'a Document,
    pub source: &'a str,
    pub node: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn new(doc: &'a Document, source: &'a str, node: NodeId) -> Self {
        Self { doc, source, node }
    }

    pub fn root(doc: &'a Document, source: &'a str) -> Self {
        Self::new(doc, source, doc.root())
    }

    pub fn data(&self) -> &'a NodeData {
        self.doc.data(self.node)
    }

    fn kind_name(&self) -> &'static str {
        self.doc.kind_name(self.node)
    }

    fn child(&self, node: NodeId) -> Self {
        Self::new(self.doc, self.source, node)
    }
}

/// Compares the kind-specific fields of two nodes of the same kind.
pub type AssertNode = fn(NodeRef<'_>, NodeRef<'_>) -> Result<(), String>;

fn noop(_: NodeRef<'_>, _: NodeRef<'_>) -> Result<(), String> {
    Ok(())
}

fn check<T: PartialEq + std::fmt::Debug>(field: &str, a: T, b: T) -> Result<(), String> {
    if a == b {
        Ok(())
    } else {
        Err(format!("{} differs: {:?} != {:?}", field, a, b))
    }
}

fn lines_text(n: NodeRef<'_>) -> String {
    n.doc.lines(n.node).block_value(n.source)
}

fn assert_auto_link(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    match (a.data(), b.data()) {
        (
            NodeData::AutoLink {
                link_type: ta,
                value: va,
            },
            NodeData::AutoLink {
                link_type: tb,
                value: vb,
            },
        ) => {
            check("auto link type", ta, tb)?;
            check("auto link label", va.raw(a.source), vb.raw(b.source))
        }
        _ => Err("not an auto link".to_string()),
    }
}

fn assert_emphasis(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    match (a.data(), b.data()) {
        (NodeData::Emphasis { level: la, .. }, NodeData::Emphasis { level: lb, .. }) => check("emphasis level", la, lb),
        _ => Err("not an emphasis".to_string()),
    }
}

fn language(n: NodeRef<'_>) -> Option<String> {
    match n.data() {
        NodeData::FencedCodeBlock { info: Some(info), .. } => {
            info.raw(n.source).split_whitespace().next().map(str::to_string)
        }
        _ => None,
    }
}

fn assert_fenced_code_block(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    check("language", language(a), language(b))
}

fn assert_lines(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    check("text", lines_text(a), lines_text(b))
}

fn assert_heading(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    match (a.data(), b.data()) {
        (NodeData::Heading { level: la }, NodeData::Heading { level: lb }) => check("heading level", la, lb),
        _ => Err("not a heading".to_string()),
    }
}

fn assert_link(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    match (a.data(), b.data()) {
        (NodeData::Link(la), NodeData::Link(lb)) | (NodeData::Image(la), NodeData::Image(lb)) => {
            check("reference type", la.reference_type, lb.reference_type)?;
            check("label", &la.label, &lb.label)?;
            check("destination", &la.destination, &lb.destination)?;
            check("title", &la.title, &lb.title)
        }
        _ => Err("not a link".to_string()),
    }
}

fn assert_link_reference_definition(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    match (a.data(), b.data()) {
        (
            NodeData::LinkReferenceDefinition {
                label: la,
                destination: da,
                title: ta,
            },
            NodeData::LinkReferenceDefinition {
                label: lb,
                destination: db,
                title: tb,
            },
        ) => {
            check("label", la, lb)?;
            check("destination", da, db)?;
            check("title", ta, tb)
        }
        _ => Err("not a link reference definition".to_string()),
    }
}

fn assert_list(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    match (a.data(), b.data()) {
        (
            NodeData::List {
                marker: ma,
                start: sa,
                tight: ta,
            },
            NodeData::List {
                marker: mb,
                start: sb,
                tight: tb,
            },
        ) => {
            check("marker", ma, mb)?;
            check("start", sa, sb)?;
            check("tight", ta, tb)
        }
        _ => Err("not a list".to_string()),
    }
}

fn assert_raw_html(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    match (a.data(), b.data()) {
        (NodeData::RawHtml { segments: sa }, NodeData::RawHtml { segments: sb }) => {
            check("raw HTML", sa.value(a.source), sb.value(b.source))
        }
        _ => Err("not raw HTML".to_string()),
    }
}

fn assert_string(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    match (a.data(), b.data()) {
        (NodeData::String { value: va, raw: ra }, NodeData::String { value: vb, raw: rb }) => {
            check("value", va, vb)?;
            check("raw", ra, rb)
        }
        _ => Err("not a string".to_string()),
    }
}

fn assert_text(a: NodeRef<'_>, b: NodeRef<'_>) -> Result<(), String> {
    match (a.data(), b.data()) {
        (
            NodeData::Text {
                segment: sa,
                soft_break: soft_a,
                hard_break: hard_a,
                raw: raw_a,
            },
            NodeData::Text {
                segment: sb,
                soft_break: soft_b,
                hard_break: hard_b,
                raw: raw_b,
            },
        ) => {
            check("text", sa.value(a.source), sb.value(b.source))?;
            check("soft line break", soft_a, soft_b)?;
            check("hard line break", hard_a, hard_b)?;
            check("raw", raw_a, raw_b)
        }
        _ => Err("not a text".to_string()),
    }
}

/// Field comparisons keyed by node kind.
#[derive(Clone, Default)]
pub struct NodeAssertions {
    table: HashMap<Kind, AssertNode>,
}

impl NodeAssertions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: Kind, assert: AssertNode) -> &mut Self {
        self.table.insert(kind, assert);
        self
    }

    /// Registers an assertion for a kind looked up by name, such as one an
    /// extension added.
    pub fn register_named(&mut self, kinds: &KindRegistry, name: &str, assert: AssertNode) -> Result<&mut Self, ConfigError> {
        let kind = kinds.require(name)?;
        Ok(self.register(kind, assert))
    }

    /// The entries of both tables; `other` wins where both have one.
    pub fn union(&self, other: &NodeAssertions) -> NodeAssertions {
        let mut table = self.table.clone();
        table.extend(other.table.iter().map(|(k, v)| (*k, *v)));
        NodeAssertions { table }
    }

    pub fn get(&self, kind: Kind) -> Option<AssertNode> {
        self.table.get(&kind).copied()
    }
}

/// Assertions for every built-in kind.
pub fn default_node_assertions() -> NodeAssertions {
    let mut assertions = NodeAssertions::new();
    assertions
        .register(Kind::AUTO_LINK, assert_auto_link)
        .register(Kind::EMPHASIS, assert_emphasis)
        .register(Kind::FENCED_CODE_BLOCK, assert_fenced_code_block)
        .register(Kind::HTML_BLOCK, assert_lines)
        .register(Kind::HEADING, assert_heading)
        .register(Kind::IMAGE, assert_link)
        .register(Kind::LINK, assert_link)
        .register(Kind::LINK_REFERENCE_DEFINITION, assert_link_reference_definition)
        .register(Kind::LIST, assert_list)
        .register(Kind::RAW_HTML, assert_raw_html)
        .register(Kind::STRING, assert_string)
        .register(Kind::TEXT, assert_text);
    for kind in [
        Kind::BLOCKQUOTE,
        Kind::CODE_BLOCK,
        Kind::CODE_SPAN,
        Kind::DOCUMENT,
        Kind::LIST_ITEM,
        Kind::PARAGRAPH,
        Kind::TEXT_BLOCK,
        Kind::THEMATIC_BREAK,
    ] {
        assertions.register(kind, noop);
    }
    assertions
}

/// Walks both trees in lockstep. Returns a description of the first
/// difference, prefixed with the path of kind names leading to it.
pub fn compare_structure(a: NodeRef<'_>, b: NodeRef<'_>, assertions: &NodeAssertions) -> Result<(), String> {
    compare_node(a, b, assertions).map_err(|(path, message)| format!("{}: {}", path.join(" > "), message))
}

fn compare_node(a: NodeRef<'_>, b: NodeRef<'_>, assertions: &NodeAssertions) -> Result<(), (Vec<String>, String)> {
    let here = || vec![a.kind_name().to_string()];
    check("kind", a.kind_name(), b.kind_name()).map_err(|m| (here(), m))?;

    match assertions.get(a.doc.kind(a.node)) {
        Some(assert) => assert(a, b).map_err(|m| (here(), m))?,
        None => log::warn!("No structural assertion for node kind {}", a.kind_name()),
    }

    check("child count", a.doc.child_count(a.node), b.doc.child_count(b.node)).map_err(|m| (here(), m))?;

    for (index, (ca, cb)) in a.doc.children(a.node).zip(b.doc.children(b.node)).enumerate() {
        compare_node(a.child(ca), b.child(cb), assertions).map_err(|(mut path, message)| {
            path.insert(0, format!("{}[{}]", a.kind_name(), index));
            (path, message)
        })?;
    }
    Ok(())
}

/// Panics with both tree dumps unless the trees are structurally equal.
pub fn assert_same_structure(a: NodeRef<'_>, b: NodeRef<'_>, assertions: &NodeAssertions) {
    if let Err(message) = compare_structure(a, b, assertions) {
        panic!(
            "trees differ at {}\n\nleft:\n{}\nright:\n{}",
            message,
            a.doc.dump(a.source),
            b.doc.dump(b.source)
        );
    }
}
