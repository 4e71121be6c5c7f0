//! Change identity, lifecycle state, and the persisted change ledger.
//!
//! A change is the unit of work scoped to one proposal against one feature.
//! It moves through a fixed lifecycle and owns one epic task, the leaf tasks
//! created by its plan, and exactly one delta consumed at completion.

use crate::error::{CoreError, Result};
use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Identity of a change: the owning feature plus a change name, displayed as
/// `feature/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId {
    /// Feature the change is proposed against.
    pub feature: String,

    /// Change name, unique within the feature while the change is live.
    pub name: String,
}

impl ChangeId {
    /// Creates a change identity.
    pub fn new(feature: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            name: name.into(),
        }
    }

    /// Ledger key for this identity.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Label applied to every task owned by this change.
    pub fn label(&self) -> String {
        format!("change:{self}")
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.feature, self.name)
    }
}

/// Change lifecycle state.
///
/// `ReadyToComplete` is the short-lived state claimed by a `complete` call
/// before it verifies tasks and runs the merge; it is what makes two
/// concurrent completions of the same change impossible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeState {
    /// Proposed: epic exists, no plan yet.
    Proposed,

    /// Planned and being worked.
    InProgress,

    /// Claimed by a completion attempt.
    ReadyToComplete,

    /// Merged into the specification document.
    Completed,

    /// Bookkeeping removed; only the merged document and closed tasks remain.
    Archived,
}

impl ChangeState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeState::Proposed => "proposed",
            ChangeState::InProgress => "in_progress",
            ChangeState::ReadyToComplete => "ready_to_complete",
            ChangeState::Completed => "completed",
            ChangeState::Archived => "archived",
        }
    }

    /// Returns `true` if moving from `self` to `next` is a legal transition.
    ///
    /// `ReadyToComplete -> InProgress` is the revert path taken when a
    /// completion attempt fails.
    pub fn can_transition_to(&self, next: ChangeState) -> bool {
        matches!(
            (self, next),
            (ChangeState::Proposed, ChangeState::InProgress)
                | (ChangeState::InProgress, ChangeState::ReadyToComplete)
                | (ChangeState::ReadyToComplete, ChangeState::InProgress)
                | (ChangeState::ReadyToComplete, ChangeState::Completed)
                | (ChangeState::Completed, ChangeState::Archived)
        )
    }
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChangeState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "proposed" => Ok(ChangeState::Proposed),
            "in_progress" => Ok(ChangeState::InProgress),
            "ready_to_complete" => Ok(ChangeState::ReadyToComplete),
            "completed" => Ok(ChangeState::Completed),
            "archived" => Ok(ChangeState::Archived),
            _ => Err(format!("invalid change state: {}", s)),
        }
    }
}

/// Live bookkeeping for one change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Change identity.
    pub id: ChangeId,

    /// Free-text scope description from the proposal.
    pub scope: String,

    /// Current lifecycle state.
    pub state: ChangeState,

    /// Epic task aggregating the change's work.
    pub epic: TaskId,

    /// Leaf tasks created by the plan, in plan order.
    pub tasks: Vec<TaskId>,

    /// Proposal timestamp.
    pub created_at: DateTime<Utc>,

    /// Last state change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ChangeRecord {
    /// Creates a freshly proposed record.
    pub fn proposed(id: ChangeId, scope: impl Into<String>, epic: TaskId) -> Self {
        let now = Utc::now();
        Self {
            id,
            scope: scope.into(),
            state: ChangeState::Proposed,
            epic,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the record to `next`, stamping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidChangeState`] if the transition is not in
    /// the legal set.
    pub fn transition_to(&mut self, next: ChangeState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CoreError::InvalidChangeState {
                change: self.id.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// The set of live changes, persisted as a single JSON file.
///
/// Archived changes are removed from the ledger entirely; their effect
/// survives in the merged document and the closed task records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeLedger {
    /// Live changes keyed by `feature/name`.
    pub changes: HashMap<String, ChangeRecord>,
}

impl ChangeLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the change is live.
    pub fn contains(&self, id: &ChangeId) -> bool {
        self.changes.contains_key(&id.key())
    }

    /// Looks up a live change.
    pub fn get(&self, id: &ChangeId) -> Option<&ChangeRecord> {
        self.changes.get(&id.key())
    }

    /// Mutable lookup of a live change.
    pub fn get_mut(&mut self, id: &ChangeId) -> Option<&mut ChangeRecord> {
        self.changes.get_mut(&id.key())
    }

    /// Inserts or replaces a record.
    pub fn insert(&mut self, record: ChangeRecord) {
        self.changes.insert(record.id.key(), record);
    }

    /// Removes a record, returning it if it was live.
    pub fn remove(&mut self, id: &ChangeId) -> Option<ChangeRecord> {
        self.changes.remove(&id.key())
    }

    /// Loads a ledger from `path`; a missing file yields an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StateParse`] for unreadable JSON and
    /// [`CoreError::Io`] for other IO failures.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| CoreError::StateParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Saves the ledger to `path` as pretty JSON, creating parent
    /// directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| CoreError::StateParse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_change_id_display_and_label() {
        let id = ChangeId::new("auth", "add-mfa");
        assert_eq!(id.to_string(), "auth/add-mfa");
        assert_eq!(id.label(), "change:auth/add-mfa");
        assert_eq!(id.key(), "auth/add-mfa");
    }

    #[test]
    fn test_lifecycle_transitions() {
        assert!(ChangeState::Proposed.can_transition_to(ChangeState::InProgress));
        assert!(ChangeState::InProgress.can_transition_to(ChangeState::ReadyToComplete));
        assert!(ChangeState::ReadyToComplete.can_transition_to(ChangeState::Completed));
        assert!(ChangeState::ReadyToComplete.can_transition_to(ChangeState::InProgress));
        assert!(ChangeState::Completed.can_transition_to(ChangeState::Archived));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        assert!(!ChangeState::Proposed.can_transition_to(ChangeState::Completed));
        assert!(!ChangeState::InProgress.can_transition_to(ChangeState::Completed));
        assert!(!ChangeState::Completed.can_transition_to(ChangeState::InProgress));
        assert!(!ChangeState::Archived.can_transition_to(ChangeState::Proposed));
    }

    #[test]
    fn test_record_transition_updates_timestamp() {
        let mut record = ChangeRecord::proposed(
            ChangeId::new("auth", "add-mfa"),
            "add multi-factor auth",
            TaskId::from("t-1"),
        );
        let before = record.updated_at;

        record.transition_to(ChangeState::InProgress).unwrap();
        assert_eq!(record.state, ChangeState::InProgress);
        assert!(record.updated_at >= before);

        let err = record.transition_to(ChangeState::Archived).unwrap_err();
        assert!(matches!(err, CoreError::InvalidChangeState { .. }));
    }

    #[test]
    fn test_state_round_trip() {
        for state in [
            ChangeState::Proposed,
            ChangeState::InProgress,
            ChangeState::ReadyToComplete,
            ChangeState::Completed,
            ChangeState::Archived,
        ] {
            assert_eq!(state.as_str().parse::<ChangeState>(), Ok(state));
        }
        assert!("done".parse::<ChangeState>().is_err());
    }

    #[test]
    fn test_ledger_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state").join("changes.json");

        let mut ledger = ChangeLedger::new();
        ledger.insert(ChangeRecord::proposed(
            ChangeId::new("auth", "add-mfa"),
            "add multi-factor auth",
            TaskId::from("t-1"),
        ));
        ledger.save_to(&path).unwrap();

        let loaded = ChangeLedger::load_from(&path).unwrap();
        let record = loaded.get(&ChangeId::new("auth", "add-mfa")).unwrap();
        assert_eq!(record.state, ChangeState::Proposed);
        assert_eq!(record.epic, TaskId::from("t-1"));
    }

    #[test]
    fn test_ledger_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let ledger = ChangeLedger::load_from(&temp.path().join("none.json")).unwrap();
        assert!(ledger.changes.is_empty());
    }

    #[test]
    fn test_ledger_corrupt_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("changes.json");
        std::fs::write(&path, "not json").unwrap();

        let err = ChangeLedger::load_from(&path).unwrap_err();
        assert!(matches!(err, CoreError::StateParse { .. }));
    }
}
