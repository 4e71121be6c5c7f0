//! Workflow coordinator.
//!
//! Sequences feature/change lifecycle transitions, using the task graph store
//! as the gate and the delta merge engine as the finalization step. A change
//! reaches `completed` only through a successful merge, and the merge runs
//! only once every task the change owns is closed.

use crate::change::{ChangeId, ChangeLedger, ChangeRecord, ChangeState};
use crate::error::{CoreError, Result};
use crate::store::StoreRegistry;
use crate::task::{BlockedTask, EpicProgress, NewTask, Status, Task, TaskId, TaskKind, TaskSpec};
use specwork_doc::Delta;
use std::sync::Mutex;

/// Drives change lifecycles against a store registry.
///
/// The ledger mutex is the per-change critical section: `complete` claims a
/// change by compare-and-swapping its state to `ReadyToComplete` under the
/// lock, then releases the lock for the merge itself, so two concurrent
/// completions of the same change cannot both proceed and the lock is never
/// held across a merge.
#[derive(Debug)]
pub struct Coordinator {
    stores: StoreRegistry,
    ledger: Mutex<ChangeLedger>,
}

impl Coordinator {
    /// Creates a coordinator with an empty change ledger.
    pub fn new(stores: StoreRegistry) -> Self {
        Self::with_ledger(stores, ChangeLedger::new())
    }

    /// Creates a coordinator over a previously persisted ledger.
    pub fn with_ledger(stores: StoreRegistry, ledger: ChangeLedger) -> Self {
        Self {
            stores,
            ledger: Mutex::new(ledger),
        }
    }

    /// Returns a copy of the ledger for persistence.
    pub fn ledger_snapshot(&self) -> ChangeLedger {
        self.ledger.lock().unwrap().clone()
    }

    /// Proposes a change against a feature.
    ///
    /// Creates the change's epic task, labeled with the feature and with the
    /// change label, and records the change as `proposed`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyExists`] if the `(feature, name)` pair is
    /// already live, and [`CoreError::InvalidSlug`] if either identifier is
    /// not a slug.
    #[tracing::instrument(skip(self, scope))]
    pub fn propose(&self, feature: &str, name: &str, scope: &str) -> Result<ChangeId> {
        validate_slug(feature)?;
        validate_slug(name)?;

        let id = ChangeId::new(feature, name);
        let mut ledger = self.ledger.lock().unwrap();
        if ledger.contains(&id) {
            return Err(CoreError::AlreadyExists(id));
        }

        let epic = self.stores.tasks.create_task(
            NewTask::new(format!("{name} ({feature})"), TaskKind::Epic)
                .with_label(feature)
                .with_label(id.label()),
        )?;
        ledger.insert(ChangeRecord::proposed(id.clone(), scope, epic));

        tracing::info!(change = %id, "change proposed");
        Ok(id)
    }

    /// Plans a proposed change: creates one leaf task per spec, wires the
    /// declared `blocks` edges, and moves the change to `in_progress`.
    ///
    /// All tasks are created before any edge is wired, so a spec may
    /// reference a later entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPlan`] for out-of-range or self-referent
    /// `blocked_by` indexes, [`CoreError::InvalidChangeState`] if the change
    /// is not `proposed`, and forwards store errors (including
    /// [`CoreError::Cycle`] for contradictory orderings) unchanged.
    #[tracing::instrument(skip(self, specs), fields(change = %id, tasks = specs.len()))]
    pub fn plan(&self, id: &ChangeId, specs: &[TaskSpec]) -> Result<Vec<TaskId>> {
        for (i, spec) in specs.iter().enumerate() {
            for &b in &spec.blocked_by {
                if b >= specs.len() {
                    return Err(CoreError::InvalidPlan(format!(
                        "task {i} references blocker index {b}, but the plan has {} entries",
                        specs.len()
                    )));
                }
                if b == i {
                    return Err(CoreError::InvalidPlan(format!(
                        "task {i} cannot block itself"
                    )));
                }
            }
        }

        let mut ledger = self.ledger.lock().unwrap();
        let record = ledger
            .get_mut(id)
            .ok_or_else(|| CoreError::ChangeNotFound(id.clone()))?;
        if record.state != ChangeState::Proposed {
            return Err(CoreError::InvalidChangeState {
                change: id.clone(),
                from: record.state,
                to: ChangeState::InProgress,
            });
        }

        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            let task_id = self.stores.tasks.create_task(
                NewTask::new(&spec.title, TaskKind::Task)
                    .with_label(&id.feature)
                    .with_label(id.label())
                    .with_priority(spec.priority),
            )?;
            ids.push(task_id);
        }
        for (i, spec) in specs.iter().enumerate() {
            for &b in &spec.blocked_by {
                self.stores
                    .tasks
                    .add_dependency(&ids[b], &ids[i], crate::task::DepKind::Blocks)?;
            }
        }

        record.tasks = ids.clone();
        record.transition_to(ChangeState::InProgress)?;

        tracing::info!(change = %id, tasks = ids.len(), "change planned");
        Ok(ids)
    }

    /// Returns the next ready task owned by the change, or `None` when no
    /// open task is unblocked.
    ///
    /// A pure query: callers mutate task status through the task store once
    /// the work is done.
    pub fn advance(&self, id: &ChangeId) -> Result<Option<Task>> {
        Ok(self.ready(id)?.into_iter().next())
    }

    /// All ready leaf tasks owned by the change, in ready order.
    pub fn ready(&self, id: &ChangeId) -> Result<Vec<Task>> {
        let label = self.change_label(id)?;
        let tasks = self.stores.tasks.ready(Some(&label))?;
        Ok(tasks.into_iter().filter(|t| t.kind == TaskKind::Task).collect())
    }

    /// All blocked leaf tasks owned by the change, each with its open
    /// blockers.
    pub fn blocked(&self, id: &ChangeId) -> Result<Vec<BlockedTask>> {
        let label = self.change_label(id)?;
        let blocked = self.stores.tasks.blocked(Some(&label))?;
        Ok(blocked
            .into_iter()
            .filter(|b| b.task.kind == TaskKind::Task)
            .collect())
    }

    /// Completes a change: verifies every owned task is closed, merges the
    /// delta into the feature's specification document, closes the epic, and
    /// moves the change to `completed`.
    ///
    /// Returns the changelog line recorded in the document trailer.
    ///
    /// On any failure the change reverts to `in_progress` and neither the
    /// document nor any task changes; the call is safe to retry after fixing
    /// the cause.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TasksIncomplete`] while owned tasks remain open,
    /// [`CoreError::InvalidChangeState`] if the change is not `in_progress`
    /// (including when another completion holds the claim), and forwards
    /// merge and store errors unchanged.
    #[tracing::instrument(skip(self, delta), fields(change = %id))]
    pub fn complete(&self, id: &ChangeId, delta: &Delta) -> Result<String> {
        // Claim the change before touching stores. Holding the claim, not the
        // lock, is what serializes concurrent completions.
        let record = {
            let mut ledger = self.ledger.lock().unwrap();
            let record = ledger
                .get_mut(id)
                .ok_or_else(|| CoreError::ChangeNotFound(id.clone()))?;
            record.transition_to(ChangeState::ReadyToComplete)?;
            record.clone()
        };

        match self.try_complete(&record, delta) {
            Ok(changelog) => {
                self.finish(id, ChangeState::Completed);
                tracing::info!(change = %id, "change completed");
                Ok(changelog)
            }
            Err(err) => {
                self.finish(id, ChangeState::InProgress);
                Err(err)
            }
        }
    }

    /// Archives a completed change, deleting its ledger record. The merged
    /// document and the closed tasks are retained; the `(feature, name)`
    /// pair becomes available again.
    #[tracing::instrument(skip(self), fields(change = %id))]
    pub fn archive(&self, id: &ChangeId) -> Result<()> {
        let mut ledger = self.ledger.lock().unwrap();
        let record = ledger
            .get(id)
            .ok_or_else(|| CoreError::ChangeNotFound(id.clone()))?;
        if record.state != ChangeState::Completed {
            return Err(CoreError::InvalidChangeState {
                change: id.clone(),
                from: record.state,
                to: ChangeState::Archived,
            });
        }

        ledger.remove(id);
        tracing::info!(change = %id, "change archived");
        Ok(())
    }

    /// Returns the change's record and its epic's progress counts.
    pub fn status(&self, id: &ChangeId) -> Result<(ChangeRecord, EpicProgress)> {
        let record = self
            .ledger
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::ChangeNotFound(id.clone()))?;
        let progress = self.stores.tasks.epic_status(&record.epic)?;
        Ok((record, progress))
    }

    /// The tasks-closed check plus merge plus persist, run while holding the
    /// `ReadyToComplete` claim.
    fn try_complete(&self, record: &ChangeRecord, delta: &Delta) -> Result<String> {
        let mut open = Vec::new();
        for task_id in &record.tasks {
            if self.stores.tasks.get(task_id)?.status != Status::Closed {
                open.push(task_id.clone());
            }
        }
        if !open.is_empty() {
            return Err(CoreError::TasksIncomplete {
                change: record.id.clone(),
                open,
            });
        }

        // Fetch the epic before anything is persisted, so a broken epic
        // reference fails the attempt while all state is still untouched.
        let epic = self.stores.tasks.get(&record.epic)?;

        let doc = self.stores.docs.load(&record.id.feature)?;
        let outcome = specwork_doc::merge(&doc, delta, &record.id.to_string())?;
        for warning in &outcome.warnings {
            tracing::warn!(change = %record.id, "{warning}");
        }

        // An epic already closed out of band stays closed; the document save
        // is the last fallible step, so a failed save leaves a retryable
        // change rather than a half-persisted one.
        if epic.status != Status::Closed {
            self.stores.tasks.update_status(&record.epic, Status::Closed)?;
        }
        self.stores.docs.save(&record.id.feature, &outcome.document)?;
        Ok(outcome.changelog)
    }

    /// Resolves the claim taken by `complete`, in either direction.
    fn finish(&self, id: &ChangeId, state: ChangeState) {
        let mut ledger = self.ledger.lock().unwrap();
        if let Some(record) = ledger.get_mut(id)
            && let Err(err) = record.transition_to(state)
        {
            tracing::warn!(change = %id, %err, "failed to settle completion claim");
        }
    }

    /// Change label for store queries; errors if the change is not live.
    fn change_label(&self, id: &ChangeId) -> Result<String> {
        let ledger = self.ledger.lock().unwrap();
        if !ledger.contains(id) {
            return Err(CoreError::ChangeNotFound(id.clone()));
        }
        Ok(id.label())
    }
}

/// Validates a feature or change name.
///
/// Both become task labels, the `feature/name` ledger key, and the spec file
/// name, so they are restricted to lowercase slugs: a lowercase letter
/// followed by lowercase letters, digits, or hyphens.
fn validate_slug(slug: &str) -> Result<()> {
    if !slug.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
        return Err(CoreError::InvalidSlug(format!(
            "{slug:?} (must start with a lowercase letter)"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::InvalidSlug(format!(
            "{slug:?} (allowed characters are a-z, 0-9, and '-')"
        )));
    }
    Ok(())
}
