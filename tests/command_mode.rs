//! Integration tests for command mode (-c/--command, --set, -p)

use std::fs;
use std::path::Path;
use std::process::Command;

fn run_command(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let config = dir.join("config.toml");
    if !config.exists() {
        fs::write(&config, "").expect("Failed to write config");
    }
    let output = Command::new(env!("CARGO_BIN_EXE_gridsheet"))
        // Tests must not depend on the user's config or workbook.
        .arg("--config")
        .arg(&config)
        .arg("--store")
        .arg(dir.join("workbook.json"))
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

#[test]
fn test_text_function() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_command(dir.path(), &["-c", "=UPPER(abc)"]);
    assert_eq!(stdout.trim(), "ABC");
    assert_eq!(code, 0);
}

#[test]
fn test_leading_equals_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_command(dir.path(), &["-c", "LOWER(AbC)"]);
    assert_eq!(stdout.trim(), "abc");
    assert_eq!(code, 0);
}

#[test]
fn test_sum_over_set_cells() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_command(
        dir.path(),
        &[
            "--set", "B1=10", "--set", "B2=20", "--set", "B3=30", "-c", "=SUM(B1:B3)",
        ],
    );
    assert_eq!(stdout.trim(), "60");
    assert_eq!(code, 0);
}

#[test]
fn test_unknown_function_is_error_token() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_command(dir.path(), &["-c", "=NOPE(A1)"]);
    assert_eq!(stdout.trim(), "#INVALID!");
    assert_eq!(code, 1);
}

#[test]
fn test_workbook_persists_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_command(dir.path(), &["--set", "A1=4", "--set", "A2=6"]);
    assert_eq!(code, 0);
    assert!(dir.path().join("workbook.json").exists());

    let (stdout, _, code) = run_command(dir.path(), &["-c", "C1=AVG(A1:A2)"]);
    assert_eq!(stdout.trim(), "5");
    assert_eq!(code, 0);

    let (stdout, _, code) = run_command(dir.path(), &["-p"]);
    assert_eq!(stdout.trim_end(), "4\t\t5\n6");
    assert_eq!(code, 0);
}

#[test]
fn test_functions_listing() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_command(dir.path(), &["--functions"]);
    assert_eq!(code, 0);
    for name in ["SUM(", "AVG(", "REMOVE_DUPLICATES(", "FIND_AND_REPLACE("] {
        assert!(stdout.contains(name), "missing {} in {}", name, stdout);
    }
}

#[test]
fn test_invalid_set_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_command(dir.path(), &["--set", "B1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("ADDR=TEXT"));

    let (_, stderr, code) = run_command(dir.path(), &["--set", "ZZ1=x"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("ZZ1"));
}

#[test]
fn test_small_sheet_from_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "[sheet]\ncolumns = 2\n").unwrap();
    let (_, _, code) = run_command(dir.path(), &["--set", "C1=x"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_command(dir.path(), &["--set", "B1=x"]);
    assert_eq!(code, 0);
}
