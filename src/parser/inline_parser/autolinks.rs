//! Autolinks: `<scheme:target>` and `<user@host>`.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{AutoLinkType, Document, Kind, NodeData, NodeId};
use crate::parser::{Context, InlineParser};
use crate::text::{Reader, Segment};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^<([a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*)>",
    )
    .unwrap()
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([A-Za-z][A-Za-z0-9.+-]{1,31}:[^<>\x00-\x20]*)>").unwrap());

pub struct AutoLinkParser;

impl InlineParser for AutoLinkParser {
    fn trigger(&self) -> &[u8] {
        b"<"
    }

    fn parse(&self, doc: &mut Document, _parent: NodeId, block: &mut Reader<'_>, _pc: &mut Context) -> Option<NodeId> {
        let line = block.peek_line()?;
        let (link_type, captures) = if let Some(captures) = URL.captures(line) {
            (AutoLinkType::Url, captures)
        } else {
            (AutoLinkType::Email, EMAIL.captures(line)?)
        };
        let whole = captures.get(0)?.end();
        let inner = captures.get(1)?;
        let start = block.offset();
        let value = Segment::new(start + inner.start(), start + inner.end());
        block.advance(whole);
        Some(doc.new_node(Kind::AUTO_LINK, NodeData::AutoLink { link_type, value }))
    }
}
