//! Integration tests for the mdbook CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a file, creating its directory
fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).expect("Failed to write test file");
}

/// Library with one book `dawn` of two texts, and an empty book `dusk`
fn create_test_library() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let library = temp_dir.path().join("library");
    let book = library.join("dawn");
    write(
        &book.join("index.md"),
        "---\ntitle: Dawn\nauthors:\n- Ada Lovelace\nitems:\n- name: morning\n- name: night\n---\nAbout dawn.\n",
    );
    write(
        &book.join("morning.md"),
        "---\ntitle: Morning\n---\nThe [#Sun] rises.\n",
    );
    write(
        &book.join("night.md"),
        "---\ntitle: Night\n---\nDark.\n\n[^1]: Very.\n",
    );
    write(&library.join("dusk").join("index.md"), "---\ntitle: Dusk\n---\n");
    (temp_dir, library)
}

fn mdbook() -> Command {
    Command::cargo_bin("mdbook-cli").unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_help() {
    mdbook()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("index"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("archive"))
        .stdout(predicate::str::contains("batch"));
}

#[test]
fn test_version() {
    mdbook()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mdbook"));
}

#[test]
fn test_export_help() {
    mdbook()
        .args(["export", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Export a book"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--item"));
}

#[test]
fn test_export_missing_output() {
    let (_temp_dir, library) = create_test_library();

    mdbook()
        .args(["export", path_str(&library.join("dawn"))])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn test_export_nonexistent_book() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("output.docx");

    mdbook()
        .args(["export", "/nonexistent/book", "--output", path_str(&output)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read book"));
}

#[test]
fn test_export_docx() {
    let (temp_dir, library) = create_test_library();
    let output = temp_dir.path().join("dawn.docx");

    mdbook()
        .args(["export", path_str(&library.join("dawn")), "-o", path_str(&output)])
        .assert()
        .success();

    let data = fs::read(&output).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
    let mut document = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut document)
        .unwrap();
    assert!(document.contains("Ada Lovelace"));
    assert!(document.contains("2. Night"));
}

#[test]
fn test_export_item_as_pdf() {
    let (temp_dir, library) = create_test_library();
    let output = temp_dir.path().join("morning.typ");

    mdbook()
        .args([
            "export",
            path_str(&library.join("dawn")),
            "-o",
            path_str(&output),
            "-f",
            "pdf",
            "--item",
            "morning",
        ])
        .assert()
        .success();

    let typst = fs::read_to_string(&output).unwrap();
    assert!(typst.contains("= 1. Morning"));
    assert!(!typst.contains("Night"));
}

#[test]
fn test_export_unknown_format() {
    let (temp_dir, library) = create_test_library();
    let output = temp_dir.path().join("dawn.epub");

    mdbook()
        .args([
            "export",
            path_str(&library.join("dawn")),
            "-o",
            path_str(&output),
            "-f",
            "epub",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No encoder available"));
}

#[test]
fn test_info_json() {
    let (_temp_dir, library) = create_test_library();

    let output = mdbook()
        .args(["info", path_str(&library.join("dawn")), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["title"], "Dawn");
    assert_eq!(info["texts"], 2);
    assert_eq!(info["sections"], 0);
    assert_eq!(info["indexed_terms"], 1);
    assert_eq!(info["status"], "started");
}

#[test]
fn test_validate() {
    let (_temp_dir, library) = create_test_library();
    let book = library.join("dawn");

    mdbook()
        .args(["validate", path_str(&book)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid book 'Dawn'"));

    mdbook()
        .args(["validate", path_str(&book), "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Footnote [^1] in 'night' is never referenced"));
}

#[test]
fn test_validate_nonexistent_book() {
    mdbook()
        .args(["validate", "/nonexistent/book"])
        .assert()
        .failure();
}

#[test]
fn test_index_and_search() {
    let (_temp_dir, library) = create_test_library();
    let book = library.join("dawn");

    mdbook()
        .args(["index", path_str(&book)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sun: 1. Morning"));

    mdbook()
        .args(["search", path_str(&book), "dark"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2. Night  night"));

    mdbook()
        .args(["search", path_str(&book), "dark", "--case-sensitive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches"));
}

#[test]
fn test_archive() {
    let (temp_dir, library) = create_test_library();
    let output = temp_dir.path().join("dawn.zip");

    mdbook()
        .args(["archive", path_str(&library.join("dawn")), "-o", path_str(&output)])
        .assert()
        .success();

    let archive = zip::ZipArchive::new(fs::File::open(&output).unwrap()).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"index.md"));
    assert!(names.contains(&"morning.md"));
}

#[test]
fn test_batch_help() {
    mdbook()
        .args(["batch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Batch export"))
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--jobs"));
}

#[test]
fn test_batch_missing_output_dir() {
    mdbook()
        .args(["batch", "/some/library"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output-dir"));
}

#[test]
fn test_batch_invalid_jobs() {
    mdbook()
        .args(["batch", "/some/library", "-o", "/tmp/out", "-j", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("jobs must be at least 1"));
}

#[test]
fn test_batch_export() {
    let (temp_dir, library) = create_test_library();
    write(&library.join("references").join("index.md"), "---\ntitle: References\n---\n");
    let output_dir = temp_dir.path().join("out");

    mdbook()
        .args([
            "batch",
            path_str(&library),
            "-o",
            path_str(&output_dir),
            "-f",
            "pdf",
            "-j",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Success: 2"));

    assert!(output_dir.join("dawn.typ").is_file());
    assert!(output_dir.join("dusk.typ").is_file());
    assert!(!output_dir.join("references.typ").exists());
}
