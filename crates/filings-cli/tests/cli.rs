use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary with its config directory pointed at a scratch location.
fn filings(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("filings").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path());
    cmd
}

#[test]
fn extract_reports_unsupported_file_type() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "not a filing").unwrap();

    filings(&home)
        .arg("extract")
        .arg(&notes)
        .assert()
        .success()
        .stderr(predicate::str::contains("Unsupported file type 'txt'"));
}

#[test]
fn extract_fails_on_missing_input() {
    let home = TempDir::new().unwrap();

    filings(&home)
        .args(["extract", "/definitely/not/here/filing.xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn extract_fails_on_unreadable_workbook() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let broken = dir.path().join("broken.xlsx");
    std::fs::write(&broken, "this is not a zip archive").unwrap();

    filings(&home)
        .arg("extract")
        .arg(&broken)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to extract"));
}

#[test]
fn batch_continues_past_unreadable_files() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.xlsx"), "garbage").unwrap();
    std::fs::write(dir.path().join("b.pdf"), "garbage").unwrap();
    std::fs::write(dir.path().join("skip.txt"), "ignored").unwrap();
    let out = dir.path().join("out");

    filings(&home)
        .arg("batch")
        .arg(format!("{}/*", dir.path().display()))
        .arg("--output-dir")
        .arg(&out)
        .args(["--summary", "--continue-on-error", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"))
        .stdout(predicate::str::contains("0 successful, 2 failed"));

    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,contributions"));
    assert!(summary.contains("a.xlsx,error"));
    assert!(summary.contains("b.pdf,error"));
}

#[test]
fn batch_stops_on_first_error_by_default() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.xlsx"), "garbage").unwrap();

    filings(&home)
        .arg("batch")
        .arg(format!("{}/*.xlsx", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn batch_without_matches_fails() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();

    filings(&home)
        .arg("batch")
        .arg(format!("{}/*.pdf", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn config_path_points_at_filings_dir() {
    let home = TempDir::new().unwrap();

    filings(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("filings"))
        .stdout(predicate::str::contains("config.json"))
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();

    filings(&home)
        .args(["config", "get", "pdf.render_dpi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("300"));

    filings(&home)
        .args(["config", "set", "extraction.unknown_filer", "Unnamed Committee"])
        .assert()
        .success();

    filings(&home)
        .args(["config", "get", "extraction.unknown_filer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unnamed Committee"));

    filings(&home)
        .args(["config", "set", "pdf.no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}
