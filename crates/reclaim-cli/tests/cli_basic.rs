//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against an isolated HOME so
//! they never touch the developer's real state.

use std::path::Path;
use std::process::Command;

/// Run a CLI command with HOME pointed at `home` and return output.
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "reclaim-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env("RECLAIM_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn streak_status_and_relapse() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, stderr, code) = run_cli(home.path(), &["streak", "status"]);
    assert_eq!(code, 0, "streak status failed: {stderr}");
    assert!(stdout.contains("hour"), "unexpected output: {stdout}");

    let (_, stderr, code) = run_cli(home.path(), &["streak", "relapse"]);
    assert_eq!(code, 0, "streak relapse failed: {stderr}");

    let (stdout, _, code) = run_cli(home.path(), &["streak", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("0 hours"), "unexpected output: {stdout}");
}

#[test]
fn journal_add_and_list() {
    let home = tempfile::tempdir().unwrap();

    let (_, stderr, code) = run_cli(
        home.path(),
        &[
            "journal",
            "add",
            "--category",
            "gratitude",
            "--content",
            "grateful for a quiet evening",
        ],
    );
    assert_eq!(code, 0, "journal add failed: {stderr}");

    let (stdout, _, code) = run_cli(home.path(), &["journal", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("grateful for a quiet evening"));
    assert!(stdout.contains("Gratitude"));
}

#[test]
fn journal_add_rejects_blank_content() {
    let home = tempfile::tempdir().unwrap();

    let (_, stderr, code) = run_cli(
        home.path(),
        &["journal", "add", "--category", "thoughts", "--content", "   "],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("error"), "expected error output: {stderr}");
}

#[test]
fn config_set_and_show() {
    let home = tempfile::tempdir().unwrap();

    let (_, stderr, code) = run_cli(
        home.path(),
        &["config", "set", "--lockdown-secs", "600"],
    );
    assert_eq!(code, 0, "config set failed: {stderr}");

    let (stdout, _, code) = run_cli(home.path(), &["config", "show"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("duration_secs = 600"), "got: {stdout}");
}

#[test]
fn onboarding_sets_profile() {
    let home = tempfile::tempdir().unwrap();

    let (_, stderr, code) = run_cli(
        home.path(),
        &[
            "profile",
            "onboard",
            "--age",
            "30",
            "--goal",
            "stay clean",
            "--protein-target",
            "140",
        ],
    );
    assert_eq!(code, 0, "onboard failed: {stderr}");

    let (stdout, _, code) = run_cli(home.path(), &["profile", "show"]);
    assert_eq!(code, 0);
    let record: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(record["onboarded"], serde_json::Value::Bool(true));
    assert_eq!(record["profile"]["daily_protein_target_g"], 140);
}

#[test]
fn lockdown_run_with_scripted_early_exit() {
    let home = tempfile::tempdir().unwrap();

    let (stdout, stderr, code) = run_cli(
        home.path(),
        &["lockdown", "run", "--secs", "120", "--exit-after", "1"],
    );
    assert_eq!(code, 0, "lockdown run failed: {stderr}");
    assert!(stdout.contains("ended early"), "got: {stdout}");
}
