//! Out-of-process task store adapter.
//!
//! Runs a tracker binary via `std::process::Command`, one invocation per
//! store operation. The tracker is expected to print JSON payloads on stdout
//! and, on failure, a `kind=<error-kind>` token on stderr so the error can be
//! mapped back onto the local taxonomy. Anything unrecognized surfaces as a
//! [`CoreError::StoreCommand`].

use crate::error::{CoreError, Result};
use crate::store::tasks::TaskStore;
use crate::task::{BlockedTask, DepKind, EpicProgress, NewTask, Status, Task, TaskId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::process::Command;

/// Task store backed by an external tracker process.
///
/// The workflow coordinator only sees the [`TaskStore`] trait, so swapping
/// this in for the in-process store requires no coordinator changes.
#[derive(Debug, Clone)]
pub struct ProcessTaskStore {
    /// Tracker binary name or path.
    program: String,

    /// Working directory for tracker invocations.
    workdir: Option<PathBuf>,
}

impl ProcessTaskStore {
    /// Creates an adapter for the given tracker binary.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            workdir: None,
        }
    }

    /// Sets the working directory for tracker invocations.
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Runs the tracker and captures trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| {
            CoreError::StoreCommand(format!("failed to execute {}: {}", self.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::StoreCommand(format!(
                "{} {} failed: {}",
                self.program,
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Extracts the `kind=<token>` the tracker prints on stderr, if any.
fn error_kind(stderr: &str) -> Option<&str> {
    stderr
        .split_whitespace()
        .find_map(|word| word.strip_prefix("kind="))
}

/// Parses a JSON payload from tracker stdout.
fn parse_payload<T: DeserializeOwned>(payload: &str, what: &str) -> Result<T> {
    serde_json::from_str(payload)
        .map_err(|e| CoreError::StoreCommand(format!("invalid {what} payload: {e}")))
}

impl TaskStore for ProcessTaskStore {
    fn create_task(&self, req: NewTask) -> Result<TaskId> {
        #[derive(Deserialize)]
        struct Created {
            id: String,
        }

        let priority = req.priority.to_string();
        let mut args = vec![
            "task",
            "create",
            &req.title,
            "--kind",
            req.kind.as_str(),
            "--priority",
            &priority,
        ];
        for label in &req.labels {
            args.push("--label");
            args.push(label);
        }

        let payload = self.run(&args)?;
        let created: Created = parse_payload(&payload, "task id")?;
        Ok(TaskId(created.id))
    }

    fn add_dependency(&self, from: &TaskId, to: &TaskId, kind: DepKind) -> Result<()> {
        let result = self.run(&[
            "dep",
            "add",
            from.as_str(),
            to.as_str(),
            "--type",
            kind.as_str(),
        ]);
        match result {
            Ok(_) => Ok(()),
            Err(CoreError::StoreCommand(msg)) => match error_kind(&msg) {
                Some("cycle") => Err(CoreError::Cycle {
                    from: from.clone(),
                    to: to.clone(),
                }),
                Some("not-found") => Err(CoreError::TaskNotFound(to.clone())),
                _ => Err(CoreError::StoreCommand(msg)),
            },
            Err(other) => Err(other),
        }
    }

    fn update_status(&self, id: &TaskId, status: Status) -> Result<()> {
        let result = self.run(&["task", "status", id.as_str(), status.as_str()]);
        match result {
            Ok(_) => Ok(()),
            Err(CoreError::StoreCommand(msg)) => match error_kind(&msg) {
                Some("terminal-state") => Err(CoreError::TerminalState(id.clone())),
                Some("not-found") => Err(CoreError::TaskNotFound(id.clone())),
                _ => Err(CoreError::StoreCommand(msg)),
            },
            Err(other) => Err(other),
        }
    }

    fn get(&self, id: &TaskId) -> Result<Task> {
        let payload = self.run(&["task", "show", id.as_str(), "--json"])?;
        parse_payload(&payload, "task")
    }

    fn ready(&self, label: Option<&str>) -> Result<Vec<Task>> {
        let mut args = vec!["task", "ready", "--json"];
        if let Some(l) = label {
            args.push("--label");
            args.push(l);
        }
        let payload = self.run(&args)?;
        parse_payload(&payload, "ready list")
    }

    fn blocked(&self, label: Option<&str>) -> Result<Vec<BlockedTask>> {
        let mut args = vec!["task", "blocked", "--json"];
        if let Some(l) = label {
            args.push("--label");
            args.push(l);
        }
        let payload = self.run(&args)?;
        parse_payload(&payload, "blocked list")
    }

    fn epic_status(&self, id: &TaskId) -> Result<EpicProgress> {
        let payload = self.run(&["epic", "status", id.as_str(), "--json"])?;
        parse_payload(&payload, "epic status")
    }
}
