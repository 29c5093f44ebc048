//! Errors surfaced to callers.
//!
//! Malformed Markdown never produces an error: parsing is total and falls back
//! to plain text. What can fail is building a configuration (duplicate
//! registrations) and rendering (missing renderers, sink failures).

use std::io;

use crate::renderer::RenderError;

/// Rejected while building parser or renderer registries, before any document
/// is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A node kind name was registered twice.
    DuplicateKind(String),
    /// The same extension was added twice.
    DuplicateExtension(String),
    /// A renderer or assertion refers to a kind nobody registered.
    UnknownKind(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKind(name) => write!(f, "node kind registered twice: {}", name),
            Self::DuplicateExtension(name) => write!(f, "extension added twice: {}", name),
            Self::UnknownKind(name) => write!(f, "unknown node kind: {}", name),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Any failure of [`crate::convert`].
#[derive(Debug)]
pub enum Error {
    Config(ConfigError),
    Render(RenderError),
    Io(io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {}", e),
            Self::Render(e) => write!(f, "render error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Render(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RenderError> for Error {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => e,
            other => io::Error::other(other.to_string()),
        }
    }
}
