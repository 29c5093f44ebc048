//! Convert subcommand tests

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_convert_stdin_to_html() {
    cargo_bin_cmd!("markweave")
        .arg("convert")
        .write_stdin("# Heading\n\nSome *emphasis*.\n")
        .assert()
        .success()
        .stdout("<h1>Heading</h1>\n<p>Some <em>emphasis</em>.</p>\n");
}

#[test]
fn test_convert_file_to_markdown() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test.md");
    fs::write(&test_file, "Heading\n=======\n\n* a\n* b\n").unwrap();

    cargo_bin_cmd!("markweave")
        .args(["convert", "--to", "markdown", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Heading\n"));
}

#[test]
fn test_convert_rejects_unknown_format() {
    cargo_bin_cmd!("markweave")
        .args(["convert", "--to", "pdf"])
        .write_stdin("a")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown output format"));
}

#[test]
fn test_convert_discovers_config_next_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test.md");
    fs::write(&test_file, "~~gone~~ <b>kept</b>\n").unwrap();
    fs::write(
        temp_dir.path().join(".markweave.toml"),
        "[renderer]\nunsafe_html = true\n\n[extensions]\nstrikethrough = true\n",
    )
    .unwrap();

    cargo_bin_cmd!("markweave")
        .args(["convert", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout("<p><del>gone</del> <b>kept</b></p>\n");
}

#[test]
fn test_convert_with_explicit_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("custom.toml");
    fs::write(&config_file, "[parser]\nauto_heading_id = true\n").unwrap();

    cargo_bin_cmd!("markweave")
        .args(["convert", "--config", config_file.to_str().unwrap()])
        .write_stdin("# Hello World\n")
        .assert()
        .success()
        .stdout("<h1 id=\"hello-world\">Hello World</h1>\n");
}
