//! Write-once change-sets applied to specification documents.

use crate::document::Section;
use serde::{Deserialize, Serialize};

/// A structured set of additions, modifications, and removals produced by one
/// change and consumed exactly once at change completion.
///
/// All three lists default to empty, so a delta can be deserialized from a
/// file that only declares the lists it uses.
///
/// # Examples
///
/// ```
/// use specwork_doc::Delta;
///
/// let delta = Delta::new()
///     .with_added("MFA Enrollment", "Users enroll a second factor.")
///     .with_removed("Legacy PIN Login");
/// assert_eq!(delta.counts(), (1, 0, 1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// New sections to append, in insertion order.
    #[serde(default)]
    pub added: Vec<Section>,

    /// Existing sections to replace: each heading must already exist, and the
    /// body is the full replacement text.
    #[serde(default)]
    pub modified: Vec<Section>,

    /// Headings of sections to delete.
    #[serde(default)]
    pub removed: Vec<String>,
}

impl Delta {
    /// Creates an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new section to the `added` list.
    pub fn with_added(mut self, heading: impl Into<String>, body: impl Into<String>) -> Self {
        self.added.push(Section::new(heading, body));
        self
    }

    /// Adds a full-body replacement to the `modified` list.
    pub fn with_modified(mut self, heading: impl Into<String>, body: impl Into<String>) -> Self {
        self.modified.push(Section::new(heading, body));
        self
    }

    /// Adds a heading to the `removed` list.
    pub fn with_removed(mut self, heading: impl Into<String>) -> Self {
        self.removed.push(heading.into());
        self
    }

    /// Returns `(added, modified, removed)` list lengths.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.added.len(), self.modified.len(), self.removed.len())
    }

    /// Returns `true` if the delta contains no operations.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_counts() {
        let delta = Delta::new()
            .with_added("A", "a")
            .with_added("B", "b")
            .with_modified("C", "c")
            .with_removed("D");

        assert_eq!(delta.counts(), (2, 1, 1));
        assert!(!delta.is_empty());
        assert!(Delta::new().is_empty());
    }

    #[test]
    fn test_deserialize_with_missing_lists() {
        let delta: Delta = serde_json::from_str(r#"{"removed": ["Old"]}"#).unwrap();
        assert_eq!(delta.counts(), (0, 0, 1));
        assert_eq!(delta.removed, vec!["Old".to_string()]);
    }
}
