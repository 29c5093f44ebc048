//! Zero-copy text addressing.
//!
//! Every node in a parsed document refers back to the original input through
//! [`Segment`] byte ranges. A [`Reader`] walks a [`Segments`] view of the
//! source one line at a time; block parsers use it over the whole document and
//! inline parsers over the lines of a single block.

pub mod reader;
pub mod segment;

pub use reader::{FindClosureOptions, Position, Reader};
pub use segment::{Segment, Segments};
