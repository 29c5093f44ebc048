//! Inline raw HTML: tags, comments, processing instructions, declarations
//! and CDATA sections. A match may span lines; it is kept as segments so
//! renderers can emit the source verbatim.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Document, Kind, NodeData, NodeId};
use crate::parser::{Context, InlineParser};
use crate::text::Reader;

static RAW_HTML: LazyLock<Regex> = LazyLock::new(|| {
    let attribute = r#"(?:\s+[A-Za-z_:][A-Za-z0-9_.:-]*(?:\s*=\s*(?:[^\s"'=<>`]+|'[^']*'|"[^"]*"))?)"#;
    let open_tag = format!(r"<[A-Za-z][A-Za-z0-9-]*{attribute}*\s*/?>");
    let close_tag = r"</[A-Za-z][A-Za-z0-9-]*\s*>";
    let comment = r"<!-->|<!--->|<!--(?s:.*?)-->";
    let processing_instruction = r"<\?(?s:.*?)\?>";
    let declaration = r"<![A-Za-z][^>]*>";
    let cdata = r"<!\[CDATA\[(?s:.*?)\]\]>";
    Regex::new(&format!(
        "^(?:{open_tag}|{close_tag}|{comment}|{processing_instruction}|{declaration}|{cdata})"
    ))
    .unwrap()
});

pub struct RawHtmlParser;

impl InlineParser for RawHtmlParser {
    fn trigger(&self) -> &[u8] {
        b"<"
    }

    fn parse(&self, doc: &mut Document, _parent: NodeId, block: &mut Reader<'_>, _pc: &mut Context) -> Option<NodeId> {
        let rest = block.rest();
        let matched = RAW_HTML.find(&rest)?;
        let start = block.position();
        block.advance(matched.end());
        let segments = block.between(start, block.position());
        log::trace!("Raw HTML {:?}", matched.as_str());
        Some(doc.new_node(Kind::RAW_HTML, NodeData::RawHtml { segments }))
    }
}
