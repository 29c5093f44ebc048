//! Rendering a document tree to an output format.
//!
//! A [`RendererBuilder`] collects [`NodeRenderer`]s with priorities.
//! [`RendererBuilder::build`] resolves the kinds each one handles against
//! the parser's [`KindRegistry`] and fills a dispatch table indexed by
//! kind; for each kind the renderer with the lowest priority wins. The
//! resulting [`Renderer`] walks the tree depth first, calling the owning
//! node renderer on entry and exit of every node.

pub mod html;
pub mod markdown;

use std::io::{self, Write};
use std::sync::Arc;

use crate::ast::{Document, Kind, KindRegistry, NodeId};
use crate::config::{OutputFormat, RendererConfig};
use crate::error::ConfigError;
use crate::parser::{Prioritized, sort_prioritized};

pub use html::{HtmlOptions, HtmlRenderer};
pub use markdown::MarkdownRenderer;

#[derive(Debug)]
pub enum RenderError {
    /// No node renderer is registered for a kind found in the tree.
    MissingRenderer { kind: String },
    /// The document was parsed with kinds the renderer was not built for.
    KindMismatch,
    Io(io::Error),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRenderer { kind } => write!(f, "no renderer registered for node kind {}", kind),
            Self::KindMismatch => write!(f, "document kinds differ from the renderer's kind registry"),
            Self::Io(e) => write!(f, "failed to write output: {}", e),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingRenderer { .. } | Self::KindMismatch => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// What the walk does after a node renderer returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    Continue,
    /// Do not visit the children; the exit call still happens.
    SkipChildren,
    Stop,
}

/// Renders the nodes of some set of kinds.
pub trait NodeRenderer: Send + Sync {
    /// The kinds this renderer handles. Extension kinds are resolved by name,
    /// so an unknown name is a [`ConfigError::UnknownKind`].
    fn kinds(&self, registry: &KindRegistry) -> Result<Vec<Kind>, ConfigError>;

    fn render(&self, ctx: &mut RenderContext<'_>, node: NodeId, entering: bool) -> Result<WalkStatus, RenderError>;
}

/// Output sink that re-applies container prefixes (such as `> `) at the start
/// of every line.
pub struct Writer<'w> {
    sink: &'w mut dyn Write,
    prefixes: Vec<String>,
    at_line_start: bool,
    last_byte: Option<u8>,
}

impl<'w> Writer<'w> {
    pub fn new(sink: &'w mut dyn Write) -> Self {
        Self {
            sink,
            prefixes: Vec::new(),
            at_line_start: true,
            last_byte: None,
        }
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        for piece in s.split_inclusive('\n') {
            let (body, newline) = match piece.strip_suffix('\n') {
                Some(body) => (body, true),
                None => (piece, false),
            };
            if self.at_line_start {
                if !body.is_empty() {
                    self.write_prefixes(false)?;
                } else if newline {
                    self.write_prefixes(true)?;
                }
            }
            if !body.is_empty() {
                self.sink.write_all(body.as_bytes())?;
                self.at_line_start = false;
                self.last_byte = body.as_bytes().last().copied();
            }
            if newline {
                self.sink.write_all(b"\n")?;
                self.at_line_start = true;
                self.last_byte = Some(b'\n');
            }
        }
        Ok(())
    }

    fn write_prefixes(&mut self, blank_line: bool) -> io::Result<()> {
        let prefix: String = self.prefixes.concat();
        let prefix = if blank_line { prefix.trim_end() } else { prefix.as_str() };
        self.sink.write_all(prefix.as_bytes())
    }

    /// Starts a new line unless the output already ends with one.
    pub fn ensure_newline(&mut self) -> io::Result<()> {
        if self.last_byte.is_some_and(|b| b != b'\n') {
            self.write_str("\n")?;
        }
        Ok(())
    }

    /// Pushes a prefix for the following lines. When the current line has
    /// already started, the prefix is written at once for it.
    pub fn push_prefix(&mut self, prefix: impl Into<String>) -> io::Result<()> {
        let prefix = prefix.into();
        if !self.at_line_start {
            self.sink.write_all(prefix.as_bytes())?;
            self.last_byte = prefix.as_bytes().last().copied().or(self.last_byte);
        }
        self.prefixes.push(prefix);
        Ok(())
    }

    /// Pushes a prefix that applies from the next line on, such as the
    /// indentation under a list marker.
    pub fn push_hanging_prefix(&mut self, prefix: impl Into<String>) {
        self.prefixes.push(prefix.into());
    }

    pub fn pop_prefix(&mut self) {
        self.prefixes.pop();
    }

    pub fn last_byte(&self) -> Option<u8> {
        self.last_byte
    }
}

/// What a node renderer sees: the tree, its source and the output.
pub struct RenderContext<'a> {
    pub source: &'a str,
    pub doc: &'a Document,
    pub writer: Writer<'a>,
}

impl<'a> RenderContext<'a> {
    pub fn write(&mut self, s: &str) -> io::Result<()> {
        self.writer.write_str(s)
    }
}

/// Collects node renderers before freezing them into a [`Renderer`].
///
/// The builder records the output format and HTML options it was created
/// for, so extensions can pick matching node renderers.
#[derive(Default)]
pub struct RendererBuilder {
    format: OutputFormat,
    html_options: HtmlOptions,
    renderers: Vec<Prioritized<Arc<dyn NodeRenderer>>>,
}

impl RendererBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with the HTML renderer for every built-in kind.
    pub fn html(options: HtmlOptions) -> Self {
        let mut builder = Self {
            format: OutputFormat::Html,
            html_options: options,
            ..Self::default()
        };
        builder.add_node_renderer(HtmlRenderer::new(options), 1000);
        builder
    }

    /// A builder with the round-trip Markdown renderer for every built-in
    /// kind.
    pub fn markdown() -> Self {
        let mut builder = Self {
            format: OutputFormat::Markdown,
            ..Self::default()
        };
        builder.add_node_renderer(MarkdownRenderer, 1000);
        builder
    }

    /// A builder for the format and options `config` selects.
    pub fn from_config(config: &RendererConfig) -> Self {
        match config.format {
            OutputFormat::Html => Self::html(HtmlOptions::from(config)),
            OutputFormat::Markdown => Self::markdown(),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn html_options(&self) -> HtmlOptions {
        self.html_options
    }

    pub fn add_node_renderer(&mut self, renderer: impl NodeRenderer + 'static, priority: i32) -> &mut Self {
        self.renderers.push(Prioritized::new(Arc::new(renderer), priority));
        self
    }

    pub fn build(mut self, kinds: Arc<KindRegistry>) -> Result<Renderer, ConfigError> {
        sort_prioritized(&mut self.renderers);
        let renderers: Vec<_> = self.renderers.into_iter().map(|r| r.value).collect();
        let mut dispatch = vec![None; kinds.len()];
        for (index, renderer) in renderers.iter().enumerate() {
            for kind in renderer.kinds(&kinds)? {
                if let Some(slot) = dispatch.get_mut(kind.index())
                    && slot.is_none()
                {
                    *slot = Some(index);
                }
            }
        }
        log::debug!(
            "Built renderer: {} node renderers covering {} of {} kinds",
            renderers.len(),
            dispatch.iter().filter(|d| d.is_some()).count(),
            kinds.len()
        );
        Ok(Renderer {
            kinds,
            renderers,
            dispatch,
        })
    }
}

/// A frozen, shareable kind-to-renderer dispatch table.
pub struct Renderer {
    kinds: Arc<KindRegistry>,
    renderers: Vec<Arc<dyn NodeRenderer>>,
    dispatch: Vec<Option<usize>>,
}

impl Renderer {
    pub fn kinds(&self) -> &Arc<KindRegistry> {
        &self.kinds
    }

    pub fn has_renderer(&self, kind: Kind) -> bool {
        self.dispatch.get(kind.index()).is_some_and(Option::is_some)
    }

    pub fn render(&self, sink: &mut dyn Write, source: &str, doc: &Document) -> Result<(), RenderError> {
        if !std::ptr::eq(&*self.kinds, doc.kinds()) && *self.kinds != *doc.kinds() {
            return Err(RenderError::KindMismatch);
        }
        let mut ctx = RenderContext {
            source,
            doc,
            writer: Writer::new(sink),
        };
        self.walk(&mut ctx, doc.root())?;
        Ok(())
    }

    fn walk(&self, ctx: &mut RenderContext<'_>, node: NodeId) -> Result<WalkStatus, RenderError> {
        let kind = ctx.doc.kind(node);
        let renderer = self
            .dispatch
            .get(kind.index())
            .copied()
            .flatten()
            .map(|index| &self.renderers[index])
            .ok_or_else(|| RenderError::MissingRenderer {
                kind: ctx.doc.kind_name(node).to_string(),
            })?;

        match renderer.render(ctx, node, true)? {
            WalkStatus::Stop => return Ok(WalkStatus::Stop),
            WalkStatus::SkipChildren => {}
            WalkStatus::Continue => {
                let mut child = ctx.doc.first_child(node);
                while let Some(current) = child {
                    if self.walk(ctx, current)? == WalkStatus::Stop {
                        return Ok(WalkStatus::Stop);
                    }
                    child = ctx.doc.next_sibling(current);
                }
            }
        }
        renderer.render(ctx, node, false)
    }
}
