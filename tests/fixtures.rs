//! Fixture-driven conversion tests.
//!
//! Each file under `tests/fixtures/` holds cases in the format read by
//! [`markweave::testutil::parse_cases`]; every file is converted with its own
//! configuration.

use std::fs;
use std::path::Path;

use markweave::testutil::{do_test_cases, parse_cases};
use markweave::{Config, ConfigBuilder, Markdown};

fn run_fixture(name: &str, config: &Config) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e));
    let cases = parse_cases(name, &input).unwrap();
    assert!(!cases.is_empty(), "{} has no cases", name);

    let markdown = Markdown::new(config).unwrap();
    do_test_cases(&markdown, &cases);
}

#[test]
fn test_commonmark_fixtures() {
    run_fixture("commonmark.txt", &Config::default());
}

#[test]
fn test_extension_fixtures() {
    let config = ConfigBuilder::default().strikethrough(true).task_list(true).build();
    run_fixture("extensions.txt", &config);
}

#[test]
fn test_unsafe_fixtures() {
    let config = ConfigBuilder::default().unsafe_html(true).xhtml(true).build();
    run_fixture("unsafe.txt", &config);
}

#[test]
fn test_heading_fixtures() {
    let config = ConfigBuilder::default().auto_heading_id(true).attribute(true).build();
    run_fixture("headings.txt", &config);
}

#[test]
fn test_case_numbers_are_unique() {
    for name in ["commonmark.txt", "extensions.txt", "unsafe.txt", "headings.txt"] {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
        let cases = parse_cases(name, &fs::read_to_string(path).unwrap()).unwrap();
        let mut numbers: Vec<_> = cases.iter().map(|c| c.no).collect();
        numbers.dedup();
        assert_eq!(numbers.len(), cases.len(), "{} repeats a case number", name);
    }
}
