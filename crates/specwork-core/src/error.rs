//! Error types for specwork core operations.
//!
//! This module defines all error variants that can occur across the task
//! graph store and the workflow coordinator. All errors use `thiserror` and
//! are returned as explicit result values from every public operation; lower
//! layer errors are forwarded unchanged, never swallowed.

use crate::change::{ChangeId, ChangeState};
use crate::task::{Status, TaskId};
use specwork_doc::MergeError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors for task graph and workflow coordinator operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CoreError {
    // Task graph errors
    /// No task exists with the given id.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Adding the `blocks` edge would create a cycle; the graph is unchanged.
    #[error("dependency cycle: {from} -> {to} closes a blocking loop")]
    Cycle {
        /// Blocking side of the rejected edge.
        from: TaskId,
        /// Blocked side of the rejected edge.
        to: TaskId,
    },

    /// Attempted to mutate a closed task. Closed is terminal.
    #[error("task {0} is closed and cannot change status")]
    TerminalState(TaskId),

    /// Status transition not in the legal set.
    #[error("invalid status transition for task {id}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Task whose status was being changed.
        id: TaskId,
        /// Current status.
        from: Status,
        /// Requested status.
        to: Status,
    },

    /// The task referenced as an epic is a plain task.
    #[error("task {0} is not an epic")]
    NotAnEpic(TaskId),

    // Change lifecycle errors
    /// Feature or change name is not a valid slug. Both become labels,
    /// ledger keys, and file names, so the charset is restricted.
    #[error("invalid slug: {0}")]
    InvalidSlug(String),

    /// A change with this `(feature, name)` pair is already live.
    #[error("change already exists: {0}")]
    AlreadyExists(ChangeId),

    /// No live change with the given identity.
    #[error("change not found: {0}")]
    ChangeNotFound(ChangeId),

    /// The change is not in a state that permits the requested transition.
    #[error("change {change} cannot move from {from} to {to}")]
    InvalidChangeState {
        /// Change identity.
        change: ChangeId,
        /// Current state.
        from: ChangeState,
        /// Requested state.
        to: ChangeState,
    },

    /// Completion attempted while owned tasks remain open.
    #[error("change {change} has {} unfinished task(s)", open.len())]
    TasksIncomplete {
        /// Change identity.
        change: ChangeId,
        /// Ids of owned tasks that are not yet closed.
        open: Vec<TaskId>,
    },

    /// A plan's task specs are malformed (bad indexes, self-references).
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    // Store adapter errors
    /// The external task store command failed or returned an unusable payload.
    #[error("task store command failed: {0}")]
    StoreCommand(String),

    /// Persisted state on disk could not be parsed.
    #[error("corrupted state file: {path}")]
    StateParse {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    // Merge errors, forwarded from the document crate
    /// Delta application conflict reported by the merge engine.
    #[error(transparent)]
    Merge(#[from] MergeError),

    // IO and system errors
    /// Standard IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // Anyhow passthrough for rich context
    /// Generic error with context from anyhow.
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for specwork core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
