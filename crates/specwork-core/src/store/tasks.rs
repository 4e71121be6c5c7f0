//! Task graph store trait.
//!
//! The store is the single source of mutable truth for tasks and dependency
//! edges. It is defined as a trait so the workflow coordinator stays agnostic
//! to where the store actually lives: in-process
//! ([`InMemoryTaskStore`](crate::store::tasks_mem::InMemoryTaskStore)) or
//! behind an external tracker process
//! ([`ProcessTaskStore`](crate::store::tasks_proc::ProcessTaskStore)).

use crate::error::Result;
use crate::task::{BlockedTask, DepKind, EpicProgress, NewTask, Status, Task, TaskId};

/// Task graph store: authoritative storage of tasks and typed dependency
/// edges, answering readiness and blocking queries.
///
/// All operations are synchronous and all-or-nothing: a failed call commits
/// nothing. Implementations must be safe under concurrent callers.
pub trait TaskStore: Send + Sync {
    /// Creates a task with status `open` and returns its id.
    ///
    /// Always succeeds for a reachable store. The priority is clamped to
    /// [`MAX_PRIORITY`](crate::task::MAX_PRIORITY).
    fn create_task(&self, req: NewTask) -> Result<TaskId>;

    /// Adds a typed dependency edge `from -> to`.
    ///
    /// Re-adding an existing edge is an idempotent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TaskNotFound`](crate::error::CoreError::TaskNotFound)
    /// if either id is unknown,
    /// [`CoreError::TerminalState`](crate::error::CoreError::TerminalState)
    /// if a `blocks` edge touches a closed task, and
    /// [`CoreError::Cycle`](crate::error::CoreError::Cycle) if a `blocks`
    /// edge would close a cycle; in all cases the graph is unchanged.
    fn add_dependency(&self, from: &TaskId, to: &TaskId, kind: DepKind) -> Result<()>;

    /// Moves a task to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TerminalState`](crate::error::CoreError::TerminalState)
    /// for any mutation of a closed task, and
    /// [`CoreError::InvalidStatusTransition`](crate::error::CoreError::InvalidStatusTransition)
    /// for transitions outside the legal set.
    fn update_status(&self, id: &TaskId, status: Status) -> Result<()>;

    /// Returns a task by id.
    fn get(&self, id: &TaskId) -> Result<Task>;

    /// Returns all open tasks whose `blocks` predecessors are all closed,
    /// optionally filtered by label.
    ///
    /// Ordered by priority descending, then creation time ascending; the
    /// ordering is stable and deterministic. Readiness is recomputed on every
    /// call from direct predecessors only, never cached.
    fn ready(&self, label: Option<&str>) -> Result<Vec<Task>>;

    /// Returns all open tasks with at least one non-closed blocker, each with
    /// the ids of those blockers. The complement of [`ready`](Self::ready)
    /// within the open set.
    fn blocked(&self, label: Option<&str>) -> Result<Vec<BlockedTask>>;

    /// Returns status counts for the tasks sharing an epic's label set, the
    /// epic itself excluded.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotAnEpic`](crate::error::CoreError::NotAnEpic)
    /// if the id names a leaf task.
    fn epic_status(&self, id: &TaskId) -> Result<EpicProgress>;
}
