//! Integration tests for the specwork CLI.
//!
//! Drives the built binary against temporary workspaces to cover each
//! subcommand and the error paths users actually hit.

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Get the path to the specwork binary
fn specwork_bin() -> String {
    let mut cmd = Command::new("cargo");
    cmd.args(["build", "--quiet", "--bin", "specwork"]);
    cmd.output().expect("Failed to build specwork binary");

    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    format!("{}/../../target/debug/specwork", manifest_dir)
}

/// Run specwork with the given arguments in `dir`
fn specwork(dir: &Path, args: &[&str]) -> Output {
    Command::new(specwork_bin())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run specwork")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_cli_version() -> Result<()> {
    let output = Command::new(specwork_bin()).arg("--version").output()?;

    assert!(output.status.success());
    assert!(stdout(&output).contains("specwork"));

    Ok(())
}

#[test]
fn test_cli_help_lists_commands() -> Result<()> {
    let output = Command::new(specwork_bin()).arg("--help").output()?;

    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["init", "propose", "plan", "ready", "advance", "complete", "archive", "status"]
    {
        assert!(text.contains(command), "help missing {command}");
    }

    Ok(())
}

#[test]
fn test_init_creates_state_directory() -> Result<()> {
    let temp = TempDir::new()?;

    let output = specwork(temp.path(), &["init"]);
    assert!(output.status.success(), "init failed: {}", stderr(&output));

    let state = temp.path().join(".specwork");
    assert!(state.join("tasks.json").exists());
    assert!(state.join("changes.json").exists());
    assert!(state.join("specs").is_dir());

    Ok(())
}

#[test]
fn test_commands_fail_outside_workspace() -> Result<()> {
    let temp = TempDir::new()?;

    let output = specwork(temp.path(), &["propose", "auth", "add-mfa", "--scope", "x"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error:"));
    assert!(stderr(&output).contains("specwork init"));

    Ok(())
}

#[test]
fn test_full_change_workflow() -> Result<()> {
    let temp = TempDir::new()?;
    specwork(temp.path(), &["init"]);

    let output = specwork(
        temp.path(),
        &["propose", "auth", "add-mfa", "--scope", "add multi-factor auth"],
    );
    assert!(output.status.success(), "propose failed: {}", stderr(&output));
    assert!(stdout(&output).contains("auth/add-mfa"));

    fs::write(
        temp.path().join("plan.toml"),
        r#"
[[task]]
title = "add MFA entity"
priority = 2

[[task]]
title = "add MFA repository"
blocked_by = [0]

[[task]]
title = "add MFA service"
blocked_by = [1]
"#,
    )?;
    let output = specwork(
        temp.path(),
        &["plan", "auth", "add-mfa", "--tasks", "plan.toml"],
    );
    assert!(output.status.success(), "plan failed: {}", stderr(&output));
    assert!(stdout(&output).contains("3 tasks"));

    // Only the entity task is ready; the id is deterministic (the epic took
    // t-1, the plan entries t-2 through t-4).
    let output = specwork(temp.path(), &["ready", "auth", "add-mfa"]);
    let ready = stdout(&output);
    assert!(ready.contains("add MFA entity"));
    assert!(!ready.contains("add MFA repository"));

    let output = specwork(temp.path(), &["ready", "auth", "add-mfa", "--blocked"]);
    assert!(stdout(&output).contains("blocked by t-2"));

    // Work the chain in order.
    for id in ["t-2", "t-3", "t-4"] {
        let output = specwork(temp.path(), &["advance", "auth", "add-mfa"]);
        assert!(stdout(&output).contains(id), "expected {id} next");
        let output = specwork(temp.path(), &["task", id, "closed"]);
        assert!(output.status.success(), "close {id} failed: {}", stderr(&output));
    }
    let output = specwork(temp.path(), &["advance", "auth", "add-mfa"]);
    assert!(stdout(&output).contains("No open tasks remain"));

    fs::write(
        temp.path().join("delta.toml"),
        r#"
[[added]]
heading = "MFA Enrollment"
body = "Users enroll a second factor."
"#,
    )?;
    let output = specwork(
        temp.path(),
        &["complete", "auth", "add-mfa", "--delta", "delta.toml"],
    );
    assert!(output.status.success(), "complete failed: {}", stderr(&output));
    assert!(stdout(&output).contains("1 added, 0 modified, 0 removed"));

    let document = fs::read_to_string(temp.path().join(".specwork/specs/auth.md"))?;
    assert!(document.contains("## MFA Enrollment"));
    assert!(document.contains("## Implementation Notes"));

    let output = specwork(temp.path(), &["status", "auth", "add-mfa"]);
    let status = stdout(&output);
    assert!(status.contains("completed"));
    assert!(status.contains("100% done"));

    let output = specwork(temp.path(), &["archive", "auth", "add-mfa"]);
    assert!(output.status.success(), "archive failed: {}", stderr(&output));

    // Archived changes disappear from status.
    let output = specwork(temp.path(), &["status", "auth", "add-mfa"]);
    assert!(!output.status.success());

    Ok(())
}

#[test]
fn test_complete_rejected_while_tasks_open() -> Result<()> {
    let temp = TempDir::new()?;
    specwork(temp.path(), &["init"]);
    specwork(temp.path(), &["propose", "auth", "add-mfa", "--scope", "x"]);

    fs::write(
        temp.path().join("plan.toml"),
        "[[task]]\ntitle = \"add MFA entity\"\n",
    )?;
    specwork(temp.path(), &["plan", "auth", "add-mfa", "--tasks", "plan.toml"]);

    fs::write(
        temp.path().join("delta.toml"),
        "[[added]]\nheading = \"MFA Enrollment\"\nbody = \"x\"\n",
    )?;
    let output = specwork(
        temp.path(),
        &["complete", "auth", "add-mfa", "--delta", "delta.toml"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unfinished task"));

    // Nothing was written and the change is retryable.
    assert!(!temp.path().join(".specwork/specs/auth.md").exists());
    let output = specwork(temp.path(), &["status", "auth", "add-mfa"]);
    assert!(stdout(&output).contains("in_progress"));

    specwork(temp.path(), &["task", "t-2", "closed"]);
    let output = specwork(
        temp.path(),
        &["complete", "auth", "add-mfa", "--delta", "delta.toml"],
    );
    assert!(output.status.success(), "retry failed: {}", stderr(&output));

    Ok(())
}

#[test]
fn test_plan_rejects_bad_blocker_index() -> Result<()> {
    let temp = TempDir::new()?;
    specwork(temp.path(), &["init"]);
    specwork(temp.path(), &["propose", "auth", "add-mfa", "--scope", "x"]);

    fs::write(
        temp.path().join("plan.toml"),
        "[[task]]\ntitle = \"a\"\nblocked_by = [7]\n",
    )?;
    let output = specwork(
        temp.path(),
        &["plan", "auth", "add-mfa", "--tasks", "plan.toml"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error:"));

    Ok(())
}

#[test]
fn test_state_persists_between_invocations() -> Result<()> {
    let temp = TempDir::new()?;
    specwork(temp.path(), &["init"]);
    specwork(temp.path(), &["propose", "auth", "add-mfa", "--scope", "x"]);

    // A fresh process sees the proposed change.
    let output = specwork(temp.path(), &["status", "auth", "add-mfa"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("proposed"));

    // And commands work from a subdirectory of the workspace.
    let sub = temp.path().join("src");
    fs::create_dir(&sub)?;
    let output = specwork(&sub, &["status", "auth", "add-mfa"]);
    assert!(output.status.success());

    Ok(())
}
