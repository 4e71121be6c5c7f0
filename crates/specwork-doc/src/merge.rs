//! Deterministic delta merge over specification documents.
//!
//! The merge is purely functional over its inputs: the caller's document is
//! never mutated, and the same `(document, delta)` pair always produces the
//! same result apart from the trailer timestamp. Phases run in a fixed order
//! (removed, then modified, then added) so the outcome does not depend on how
//! the caller assembled the delta.

use crate::delta::Delta;
use crate::document::{Document, NOTES_HEADING};
use crate::error::{MergeError, Result};
use chrono::{SecondsFormat, Utc};

/// Result of a successful merge.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The new document, with the delta applied and the trailer extended.
    pub document: Document,

    /// The audit line appended to the trailer: change identity, timestamp,
    /// and operation counts.
    pub changelog: String,

    /// Non-fatal warnings, one per removal that matched no section.
    pub warnings: Vec<String>,
}

/// Folds a delta into a document, producing a new document and a changelog
/// entry.
///
/// Phases, in order:
///
/// 1. **Removed** - exact heading match; a missing section yields a warning
///    and the merge continues (removal is idempotent).
/// 2. **Modified** - exact heading match; a missing section fails the whole
///    merge with [`MergeError::SectionNotFound`].
/// 3. **Added** - an existing heading fails with
///    [`MergeError::DuplicateSection`]; otherwise sections are appended in
///    delta order.
///
/// After all three phases one audit line is appended to the
/// `Implementation Notes` trailer. Re-running the same delta against the
/// merged document fails deterministically with `DuplicateSection`, which is
/// the intended guard against double application.
///
/// # Arguments
///
/// * `doc` - The document to merge into (left untouched).
/// * `delta` - The change-set to apply.
/// * `change` - Change identity recorded in the changelog entry.
///
/// # Errors
///
/// Returns [`MergeError::ReservedHeading`] if any delta list targets the
/// trailer, plus the phase errors described above. On any error the caller's
/// document is unchanged and no partial result is produced.
pub fn merge(doc: &Document, delta: &Delta, change: &str) -> Result<MergeOutcome> {
    reject_reserved_headings(delta)?;
    reject_heading_marker_bodies(delta)?;

    let mut next = doc.clone();
    let mut warnings = Vec::new();

    for heading in &delta.removed {
        if !next.remove_section(heading) {
            warnings.push(format!("section not found: {heading}"));
        }
    }

    for replacement in &delta.modified {
        match next.section_mut(&replacement.heading) {
            Some(section) => section.body = replacement.body.clone(),
            None => return Err(MergeError::SectionNotFound(replacement.heading.clone())),
        }
    }

    for section in &delta.added {
        if next.contains(&section.heading) {
            return Err(MergeError::DuplicateSection(section.heading.clone()));
        }
        next.push_section(section.clone());
    }

    let (added, modified, removed) = delta.counts();
    let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let changelog =
        format!("{change} at {stamp}: {added} added, {modified} modified, {removed} removed");
    next.append_note(&changelog);

    Ok(MergeOutcome {
        document: next,
        changelog,
        warnings,
    })
}

/// The trailer is engine-owned; deltas may not add, modify, or remove it.
fn reject_reserved_headings(delta: &Delta) -> Result<()> {
    let targets_trailer = delta
        .added
        .iter()
        .chain(delta.modified.iter())
        .any(|s| s.heading == NOTES_HEADING)
        || delta.removed.iter().any(|h| h == NOTES_HEADING);

    if targets_trailer {
        return Err(MergeError::ReservedHeading(NOTES_HEADING.to_string()));
    }
    Ok(())
}

/// Section bodies are stored verbatim in the Markdown file, so a body line
/// starting with the section marker would reparse as a new heading and split
/// the section on the next load. Such bodies are rejected up front.
fn reject_heading_marker_bodies(delta: &Delta) -> Result<()> {
    for section in delta.added.iter().chain(delta.modified.iter()) {
        if section.body.lines().any(|line| line.starts_with("## ")) {
            return Err(MergeError::HeadingInBody(section.heading.clone()));
        }
    }
    Ok(())
}
