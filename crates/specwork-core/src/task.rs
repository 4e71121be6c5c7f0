//! Task, edge, and status types for the task graph store.
//!
//! Tasks are grouped by free-text labels rather than hard parent pointers: a
//! task can carry a feature label and a change label at the same time, and an
//! epic aggregates children through label membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Highest allowed priority. Priorities only order the ready set, never
/// affect correctness.
pub const MAX_PRIORITY: u8 = 3;

/// Opaque unique task identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Task status. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not yet started.
    Open,

    /// Actively being worked.
    InProgress,

    /// Done. No further status changes are allowed.
    Closed,
}

impl Status {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Closed => "closed",
        }
    }

    /// Returns `true` if moving from `self` to `next` is a legal transition.
    ///
    /// Legal transitions: open -> in_progress, in_progress -> open (revert),
    /// in_progress -> closed, and open -> closed (direct close for trivial
    /// tasks). Everything out of `Closed` is illegal.
    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Open, Status::InProgress)
                | (Status::InProgress, Status::Open)
                | (Status::InProgress, Status::Closed)
                | (Status::Open, Status::Closed)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Status::Open),
            "in_progress" => Ok(Status::InProgress),
            "closed" => Ok(Status::Closed),
            _ => Err(format!("invalid status: {}", s)),
        }
    }
}

/// Task kind: a leaf unit of work or an aggregating epic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// A leaf unit of work.
    Task,

    /// An aggregate closed only when all label-sharing children are closed.
    Epic,
}

impl TaskKind {
    /// Returns the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Task => "task",
            TaskKind::Epic => "epic",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(TaskKind::Task),
            "epic" => Ok(TaskKind::Epic),
            _ => Err(format!("invalid task kind: {}", s)),
        }
    }
}

/// Dependency edge type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepKind {
    /// `A blocks B`: B cannot become ready until A is closed. The blocks
    /// subgraph must stay acyclic.
    Blocks,

    /// Provenance only: links discovered work back to the task that revealed
    /// it. No readiness effect.
    DiscoveredFrom,
}

impl DepKind {
    /// Returns the string representation of the edge type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DepKind::Blocks => "blocks",
            DepKind::DiscoveredFrom => "discovered-from",
        }
    }
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DepKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocks" => Ok(DepKind::Blocks),
            "discovered-from" => Ok(DepKind::DiscoveredFrom),
            _ => Err(format!("invalid dependency type: {}", s)),
        }
    }
}

/// A stored task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique id assigned by the store.
    pub id: TaskId,

    /// Human-readable title.
    pub title: String,

    /// Free-text label set used for feature/change grouping.
    pub labels: BTreeSet<String>,

    /// Current status.
    pub status: Status,

    /// Ready-set ordering priority, 0 to [`MAX_PRIORITY`].
    pub priority: u8,

    /// Leaf task or epic.
    pub kind: TaskKind,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A typed dependency edge between two tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Source task (the blocker for `blocks` edges).
    pub from: TaskId,

    /// Target task (the blocked one for `blocks` edges).
    pub to: TaskId,

    /// Edge type.
    pub kind: DepKind,
}

/// Request to create a task.
///
/// # Examples
///
/// ```
/// use specwork_core::task::{NewTask, TaskKind};
///
/// let req = NewTask::new("wire repository layer", TaskKind::Task)
///     .with_label("auth")
///     .with_priority(2);
/// assert_eq!(req.priority, 2);
/// ```
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Human-readable title.
    pub title: String,

    /// Initial label set.
    pub labels: BTreeSet<String>,

    /// Ready-set ordering priority; clamped to [`MAX_PRIORITY`] by the store.
    pub priority: u8,

    /// Leaf task or epic.
    pub kind: TaskKind,
}

impl NewTask {
    /// Creates a request with no labels and priority 0.
    pub fn new(title: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            title: title.into(),
            labels: BTreeSet::new(),
            priority: 0,
            kind,
        }
    }

    /// Adds a label to the request.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

/// One planned task inside a change, as declared by the caller.
///
/// `blocked_by` holds indexes into the same plan list: spec `i` listing `j`
/// means the task created from spec `j` blocks the task created from spec
/// `i`. This is how plans wire bottom-up layering (data tasks block logic
/// tasks block interface tasks).
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSpec {
    /// Human-readable title.
    pub title: String,

    /// Ready-set ordering priority.
    #[serde(default)]
    pub priority: u8,

    /// Indexes of plan entries that must close before this task is ready.
    #[serde(default)]
    pub blocked_by: Vec<usize>,
}

impl TaskSpec {
    /// Creates a spec with priority 0 and no blockers.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: 0,
            blocked_by: Vec::new(),
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Declares that the plan entry at `index` blocks this task.
    pub fn blocked_by(mut self, index: usize) -> Self {
        self.blocked_by.push(index);
        self
    }
}

/// A task that is not ready, together with the open tasks blocking it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedTask {
    /// The blocked task.
    pub task: Task,

    /// Ids of its blockers that are still open or in progress.
    pub blocked_by: Vec<TaskId>,
}

/// Status counts for an epic's label-sharing children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicProgress {
    /// Children with status `open`.
    pub open: usize,

    /// Children with status `in_progress`.
    pub in_progress: usize,

    /// Children with status `closed`.
    pub closed: usize,

    /// Rounded percentage of closed children; 100 for an epic with no
    /// children.
    pub percent_closed: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_status_transitions() {
        assert!(Status::Open.can_transition_to(Status::InProgress));
        assert!(Status::Open.can_transition_to(Status::Closed));
        assert!(Status::InProgress.can_transition_to(Status::Open));
        assert!(Status::InProgress.can_transition_to(Status::Closed));
    }

    #[test]
    fn test_closed_is_terminal() {
        assert!(!Status::Closed.can_transition_to(Status::Open));
        assert!(!Status::Closed.can_transition_to(Status::InProgress));
        assert!(!Status::Closed.can_transition_to(Status::Closed));
    }

    #[test]
    fn test_same_status_is_not_a_transition() {
        assert!(!Status::Open.can_transition_to(Status::Open));
        assert!(!Status::InProgress.can_transition_to(Status::InProgress));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [Status::Open, Status::InProgress, Status::Closed] {
            assert_eq!(status.as_str().parse::<Status>(), Ok(status));
        }
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn test_dep_kind_round_trip() {
        assert_eq!("blocks".parse::<DepKind>(), Ok(DepKind::Blocks));
        assert_eq!(
            "discovered-from".parse::<DepKind>(),
            Ok(DepKind::DiscoveredFrom)
        );
        assert!("requires".parse::<DepKind>().is_err());
    }

    #[test]
    fn test_new_task_builder() {
        let req = NewTask::new("entity model", TaskKind::Task)
            .with_label("auth")
            .with_label("change:auth/add-mfa")
            .with_priority(3);

        assert_eq!(req.title, "entity model");
        assert_eq!(req.labels.len(), 2);
        assert_eq!(req.priority, 3);
        assert_eq!(req.kind, TaskKind::Task);
    }

    #[test]
    fn test_task_spec_builder() {
        let spec = TaskSpec::new("service layer").with_priority(1).blocked_by(0);
        assert_eq!(spec.blocked_by, vec![0]);
        assert_eq!(spec.priority, 1);
    }
}
