//! CLI integration tests for markweave.
//!
//! These tests execute the compiled binary and verify:
//! - Subcommand behavior (convert, parse, roundtrip)
//! - Stdin/stdout handling
//! - Config discovery
//! - Exit codes

mod common;
mod convert;
mod parse;
mod roundtrip;
