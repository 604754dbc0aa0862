//! CLI integration tests for `vs-config`
//!
//! Runs the built binary against config fixtures in temporary directories and
//! checks output streams and exit codes.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run vs-config in `cwd` with the given arguments and return (stdout, stderr, exit code).
fn run_cli(cwd: &Path, args: &[&str]) -> (String, String, Option<i32>) {
    let output = Command::new(env!("CARGO_BIN_EXE_vs-config"))
        .args(args)
        .arg("--color")
        .arg("never")
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute vs-config");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code())
}

fn write_config(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).expect("should write config");
}

#[test]
fn test_locate_prints_default_config() {
    let temp = TempDir::new().expect("should create temp dir");
    write_config(&temp, "vivliostyle.config.json", "{}");

    let (stdout, _, code) = run_cli(temp.path(), &["locate"]);
    assert_eq!(code, Some(0));
    assert!(stdout.trim().ends_with("vivliostyle.config.json"));
}

#[test]
fn test_locate_without_config_fails() {
    let temp = TempDir::new().expect("should create temp dir");

    let (stdout, stderr, code) = run_cli(temp.path(), &["locate"]);
    assert_eq!(code, Some(1));
    assert!(stdout.is_empty());
    assert!(stderr.contains("No Vivliostyle config file found"));
}

#[test]
fn test_check_valid_config() {
    let temp = TempDir::new().expect("should create temp dir");
    write_config(&temp, "vivliostyle.config.json", "// book\n{\"title\": \"Book\", \"entry\": \"index.md\",}");

    let (stdout, _, code) = run_cli(temp.path(), &["check"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("1 task(s) OK"));
}

#[test]
fn test_check_invalid_config_shows_code_frame() {
    let temp = TempDir::new().expect("should create temp dir");
    write_config(&temp, "vivliostyle.config.json", "{\n  \"title\": \"Book\",\n  \"size\": 5\n}\n");

    let (_, stderr, code) = run_cli(temp.path(), &["check"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("Error: Validation of vivliostyle config failed. Please check the schema: "));
    assert!(stderr.contains("5 is not of type \"string\""), "{}", stderr);
    assert!(stderr.contains("> 3 |   \"size\": 5"));
    assert!(stderr.contains("^"));
    assert!(!stderr.contains("\x1b["));
}

#[test]
fn test_check_unparseable_config() {
    let temp = TempDir::new().expect("should create temp dir");
    write_config(&temp, "vivliostyle.config.json", "{\"title\": \"Book\"");

    let (_, stderr, code) = run_cli(temp.path(), &["check"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("Error: An error occurred on loading a config file: "));
}

#[test]
fn test_show_prints_parsed_config() {
    let temp = TempDir::new().expect("should create temp dir");
    write_config(&temp, "book.json", "[{\"title\": \"A\", \"readingProgression\": \"rtl\"}, {\"title\": \"B\"}]");

    let (stdout, _, code) = run_cli(temp.path(), &["show", "--config", "book.json"]);
    assert_eq!(code, Some(0));
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("show should print JSON");
    assert_eq!(value["tasks"][0]["readingProgression"], "rtl");
    assert_eq!(value["tasks"][1]["title"], "B");
    assert!(value["inlineOptions"]["config"].as_str().unwrap_or_default().ends_with("book.json"));
}

#[test]
fn test_deprecation_warning_goes_to_stderr() {
    let temp = TempDir::new().expect("should create temp dir");
    write_config(&temp, "vivliostyle.config.json", "{\"tocTitle\": \"Contents\"}");

    let (stdout, stderr, code) = run_cli(temp.path(), &["check"]);
    assert_eq!(code, Some(0));
    assert!(!stdout.contains("tocTitle"));
    assert!(stderr.contains("'tocTitle' property of Vivliostyle config was deprecated"));

    let (_, stderr, code) = run_cli(temp.path(), &["check", "--log-level", "silent"]);
    assert_eq!(code, Some(0));
    assert!(!stderr.contains("tocTitle"));
}

#[test]
fn test_cwd_flag() {
    let temp = TempDir::new().expect("should create temp dir");
    fs::create_dir_all(temp.path().join("book")).expect("should create dir");
    fs::write(temp.path().join("book/vivliostyle.config.json"), "{\"title\": \"Nested\"}").expect("should write config");

    let (stdout, _, code) = run_cli(temp.path(), &["show", "--cwd", "book"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("\"Nested\""));
}

#[test]
fn test_invalid_arguments_exit_code() {
    let temp = TempDir::new().expect("should create temp dir");
    let (_, _, code) = run_cli(temp.path(), &["check", "--log-level", "loud"]);
    assert_eq!(code, Some(2));
}
