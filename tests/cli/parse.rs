//! Parse subcommand tests

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_parse_stdin() {
    cargo_bin_cmd!("markweave")
        .arg("parse")
        .write_stdin("# Heading\n\nParagraph.")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Document\n"))
        .stdout(predicate::str::contains("  Heading level=1"))
        .stdout(predicate::str::contains("    Text \"Paragraph.\""));
}

#[test]
fn test_parse_simple_file() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test.md");
    fs::write(&test_file, "- [a](/u 't')\n\n[r]: /v\n").unwrap();

    cargo_bin_cmd!("markweave")
        .args(["parse", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("List marker='-' start=None tight=true"))
        .stdout(predicate::str::contains(
            "Link destination=\"/u\" title=Some(\"t\") reference=Inline",
        ))
        .stdout(predicate::str::contains(
            "LinkReferenceDefinition label=\"r\" destination=\"/v\" title=None",
        ));
}

#[test]
fn test_parse_with_extension_config() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test.md");
    let config_file = temp_dir.path().join("markweave.toml");
    fs::write(&test_file, "- [x] done\n").unwrap();
    fs::write(&config_file, "[extensions]\ntask_list = true\n").unwrap();

    cargo_bin_cmd!("markweave")
        .args(["parse", "--config", config_file.to_str().unwrap(), test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("TaskCheckBox {checked=\"true\"}"));
}

#[test]
fn test_parse_never_fails_on_malformed_input() {
    cargo_bin_cmd!("markweave")
        .arg("parse")
        .write_stdin("[unclosed *emph `code\n> <div\n```\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Document"));
}
