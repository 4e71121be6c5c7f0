//! In-process task graph store.
//!
//! Backs the store trait with plain maps behind a single writer lock per
//! store instance. The lock is held only for the duration of each operation,
//! never across merges. Cloning the store shares the underlying graph, which
//! is how the CLI keeps a concrete handle for snapshot persistence while the
//! coordinator works through the trait object.

use crate::error::{CoreError, Result};
use crate::store::tasks::TaskStore;
use crate::task::{
    BlockedTask, DepKind, Edge, EpicProgress, MAX_PRIORITY, NewTask, Status, Task, TaskId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// In-memory task graph store.
///
/// # Examples
///
/// ```
/// use specwork_core::store::tasks::TaskStore;
/// use specwork_core::store::tasks_mem::InMemoryTaskStore;
/// use specwork_core::task::{NewTask, TaskKind};
///
/// let store = InMemoryTaskStore::new();
/// let id = store
///     .create_task(NewTask::new("entity model", TaskKind::Task))
///     .unwrap();
/// assert_eq!(store.ready(None).unwrap()[0].id, id);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    tasks: HashMap<TaskId, Task>,
    /// Creation order, the readiness tiebreaker.
    order: Vec<TaskId>,
    edges: Vec<Edge>,
    /// Label index per the grouping design: label -> member task ids.
    labels: HashMap<String, BTreeSet<TaskId>>,
    next_id: u64,
}

/// Persisted form of the graph: task records plus edge records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tasks in creation order.
    pub tasks: Vec<Task>,

    /// All dependency edges.
    pub edges: Vec<Edge>,

    /// Next id sequence value.
    pub next_id: u64,
}

impl InMemoryTaskStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current graph as a serializable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock().unwrap();
        Snapshot {
            tasks: inner
                .order
                .iter()
                .map(|id| inner.tasks[id].clone())
                .collect(),
            edges: inner.edges.clone(),
            next_id: inner.next_id,
        }
    }

    /// Rebuilds a store from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut inner = Inner {
            next_id: snapshot.next_id,
            edges: snapshot.edges,
            ..Inner::default()
        };
        for task in snapshot.tasks {
            inner.order.push(task.id.clone());
            for label in &task.labels {
                inner
                    .labels
                    .entry(label.clone())
                    .or_default()
                    .insert(task.id.clone());
            }
            inner.tasks.insert(task.id.clone(), task);
        }
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Loads a store from a JSON snapshot file; a missing file yields an
    /// empty store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StateParse`] for unreadable JSON and
    /// [`CoreError::Io`] for other IO failures.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path)?;
        let snapshot: Snapshot =
            serde_json::from_str(&text).map_err(|source| CoreError::StateParse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Saves the graph to a JSON snapshot file, creating parent directories
    /// as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.snapshot()).map_err(|source| {
            CoreError::StateParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, text)?;
        Ok(())
    }
}

impl Inner {
    /// Blockers of `id` that are not closed.
    ///
    /// An edge whose blocker is missing from the task map (possible after a
    /// hand-edited or truncated snapshot) does not block.
    fn open_blockers(&self, id: &TaskId) -> Vec<TaskId> {
        self.edges
            .iter()
            .filter(|e| e.kind == DepKind::Blocks && &e.to == id)
            .filter(|e| {
                self.tasks
                    .get(&e.from)
                    .is_some_and(|t| t.status != Status::Closed)
            })
            .map(|e| e.from.clone())
            .collect()
    }

    /// Open tasks matching the label filter, in creation order.
    fn open_tasks<'a>(&'a self, label: Option<&'a str>) -> impl Iterator<Item = &'a Task> {
        self.order
            .iter()
            .map(|id| &self.tasks[id])
            .filter(|t| t.status == Status::Open)
            .filter(move |t| label.is_none_or(|l| t.labels.contains(l)))
    }

    /// Bounded depth-first reachability over `blocks` edges: would inserting
    /// `from -> to` close a cycle? True iff `from` is reachable from `to`.
    fn would_create_cycle(&self, from: &TaskId, to: &TaskId) -> bool {
        let mut stack = vec![to.clone()];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if &current == from {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            for edge in &self.edges {
                if edge.kind == DepKind::Blocks && edge.from == current {
                    stack.push(edge.to.clone());
                }
            }
        }
        false
    }
}

impl TaskStore for InMemoryTaskStore {
    fn create_task(&self, req: NewTask) -> Result<TaskId> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = TaskId(format!("t-{}", inner.next_id));

        let now = Utc::now();
        let task = Task {
            id: id.clone(),
            title: req.title,
            labels: req.labels,
            status: Status::Open,
            priority: req.priority.min(MAX_PRIORITY),
            kind: req.kind,
            created_at: now,
            updated_at: now,
        };

        for label in &task.labels {
            inner
                .labels
                .entry(label.clone())
                .or_default()
                .insert(id.clone());
        }
        inner.order.push(id.clone());
        inner.tasks.insert(id.clone(), task);

        tracing::debug!(task = %id, "task created");
        Ok(id)
    }

    fn add_dependency(&self, from: &TaskId, to: &TaskId, kind: DepKind) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        for id in [from, to] {
            if !inner.tasks.contains_key(id) {
                return Err(CoreError::TaskNotFound(id.clone()));
            }
        }

        let edge = Edge {
            from: from.clone(),
            to: to.clone(),
            kind,
        };
        if inner.edges.contains(&edge) {
            return Ok(());
        }

        if kind == DepKind::Blocks {
            // Closed tasks are frozen; provenance edges may still point at them.
            for id in [from, to] {
                if inner.tasks[id].status == Status::Closed {
                    return Err(CoreError::TerminalState(id.clone()));
                }
            }
            if inner.would_create_cycle(from, to) {
                return Err(CoreError::Cycle {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }

        inner.edges.push(edge);
        Ok(())
    }

    fn update_status(&self, id: &TaskId, status: Status) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| CoreError::TaskNotFound(id.clone()))?;

        if task.status == Status::Closed {
            return Err(CoreError::TerminalState(id.clone()));
        }
        if !task.status.can_transition_to(status) {
            return Err(CoreError::InvalidStatusTransition {
                id: id.clone(),
                from: task.status,
                to: status,
            });
        }

        task.status = status;
        task.updated_at = Utc::now();
        tracing::debug!(task = %id, status = %status, "task status updated");
        Ok(())
    }

    fn get(&self, id: &TaskId) -> Result<Task> {
        let inner = self.inner.lock().unwrap();
        inner
            .tasks
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::TaskNotFound(id.clone()))
    }

    fn ready(&self, label: Option<&str>) -> Result<Vec<Task>> {
        let inner = self.inner.lock().unwrap();
        let mut tasks: Vec<Task> = inner
            .open_tasks(label)
            .filter(|t| inner.open_blockers(&t.id).is_empty())
            .cloned()
            .collect();
        // Stable sort keeps creation order within equal priorities.
        tasks.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(tasks)
    }

    fn blocked(&self, label: Option<&str>) -> Result<Vec<BlockedTask>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .open_tasks(label)
            .filter_map(|t| {
                let blocked_by = inner.open_blockers(&t.id);
                if blocked_by.is_empty() {
                    None
                } else {
                    Some(BlockedTask {
                        task: t.clone(),
                        blocked_by,
                    })
                }
            })
            .collect())
    }

    fn epic_status(&self, id: &TaskId) -> Result<EpicProgress> {
        let inner = self.inner.lock().unwrap();
        let epic = inner
            .tasks
            .get(id)
            .ok_or_else(|| CoreError::TaskNotFound(id.clone()))?;
        if epic.kind != crate::task::TaskKind::Epic {
            return Err(CoreError::NotAnEpic(id.clone()));
        }

        let mut progress = EpicProgress {
            open: 0,
            in_progress: 0,
            closed: 0,
            percent_closed: 100,
        };
        for task in inner.tasks.values() {
            if task.id == epic.id || task.kind != crate::task::TaskKind::Task {
                continue;
            }
            if !epic.labels.is_subset(&task.labels) {
                continue;
            }
            match task.status {
                Status::Open => progress.open += 1,
                Status::InProgress => progress.in_progress += 1,
                Status::Closed => progress.closed += 1,
            }
        }

        let total = progress.open + progress.in_progress + progress.closed;
        if total > 0 {
            progress.percent_closed = (progress.closed * 100 / total) as u8;
        }
        Ok(progress)
    }
}
