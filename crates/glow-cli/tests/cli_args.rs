//! CLI argument validation tests.
//!
//! Tests command-line argument parsing, validation, and error handling.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

mod common;

use common::Workspace;
use predicates::prelude::*;

// === Help and Version ===

#[test]
fn test_help_lists_subcommands() {
    Workspace::new()
        .command()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("analyze")
                .and(predicate::str::contains("validate"))
                .and(predicate::str::contains("--left")),
        );
}

#[test]
fn test_version() {
    Workspace::new()
        .command()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("glow-score"));
}

// === Missing/Invalid Photo Tests ===

#[test]
fn test_missing_front_shows_error() {
    Workspace::new()
        .command()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No front photo specified"));
}

#[test]
fn test_validate_requires_front() {
    Workspace::new()
        .command()
        .arg("validate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No front photo specified"));
}

#[test]
fn test_nonexistent_front_exits_2() {
    let ws = Workspace::new();
    ws.command()
        .arg("analyze")
        .arg(ws.path().join("missing.jpg"))
        .assert()
        .code(2)
        .stderr(
            predicate::str::contains("could not read the front photo")
                .and(predicate::str::contains("Failed to open image")),
        );
}

#[test]
fn test_unsupported_front_exits_2() {
    let ws = Workspace::new();
    let notes = ws.path().join("notes.txt");
    std::fs::write(&notes, "not a photo").unwrap();

    ws.command()
        .arg(&notes)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unsupported file type"));
}

// === Value Validation Tests ===

#[test]
fn test_min_confidence_rejects_out_of_range() {
    let ws = Workspace::new();
    let front = ws.photo("front.jpg");

    ws.command()
        .arg("--min-confidence")
        .arg("2.0")
        .arg(&front)
        .assert()
        .failure()
        .stderr(predicate::str::contains("2 is not in 0.0..=1.0"));
}

#[test]
fn test_min_confidence_rejects_text() {
    let ws = Workspace::new();
    let front = ws.photo("front.jpg");

    ws.command()
        .args(["analyze", "--min-confidence", "high"])
        .arg(&front)
        .assert()
        .failure()
        .stderr(predicate::str::contains("'high' is not a valid number"));
}

#[test]
fn test_unknown_flag_rejected() {
    Workspace::new()
        .command()
        .arg("--no-such-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}
