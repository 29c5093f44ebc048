//! Roundtrip subcommand tests

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_roundtrip_prints_markdown() {
    cargo_bin_cmd!("markweave")
        .arg("roundtrip")
        .write_stdin("Title\n---\n\n+ one\n+ two\n")
        .assert()
        .success()
        .stdout("## Title\n\n+ one\n+ two\n");
}

#[test]
fn test_roundtrip_check_stable_file() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test.md");
    fs::write(
        &test_file,
        "# Title\n\n> quote\n> - item\n\n```rust\nfn main() {}\n```\n\n[a][r]\n\n[r]: </x y> 'T'\n",
    )
    .unwrap();

    cargo_bin_cmd!("markweave")
        .args(["roundtrip", "--check", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Round trip is stable"));
}

#[test]
fn test_roundtrip_check_stdin_is_quiet() {
    cargo_bin_cmd!("markweave")
        .args(["roundtrip", "--check"])
        .write_stdin("*a* **b** `c`\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_roundtrip_ignores_configured_format() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("config.toml");
    fs::write(&config_file, "[renderer]\nformat = \"html\"\n").unwrap();

    cargo_bin_cmd!("markweave")
        .args(["roundtrip", "--config", config_file.to_str().unwrap()])
        .write_stdin("*a*\n")
        .assert()
        .success()
        .stdout("*a*\n");
}
