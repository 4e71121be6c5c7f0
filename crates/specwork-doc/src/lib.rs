//! Document model and delta merge engine for specwork.
//!
//! This crate represents a feature's living specification document as an
//! ordered list of heading-addressed sections and provides the deterministic
//! merge that folds a change's delta into it, producing a new document plus a
//! changelog entry for the audit trailer.
//!
//! # Examples
//!
//! ```
//! use specwork_doc::{merge, Delta, Document, Section};
//!
//! let mut doc = Document::new("auth");
//! doc.push_section(Section::new("Login", "Password based."));
//!
//! let delta = Delta::new().with_added("MFA Enrollment", "Second factor.");
//! let outcome = merge(&doc, &delta, "auth/add-mfa")?;
//!
//! assert!(outcome.document.contains("MFA Enrollment"));
//! assert!(outcome.changelog.contains("1 added, 0 modified, 0 removed"));
//! # Ok::<(), specwork_doc::MergeError>(())
//! ```

pub mod delta;
pub mod document;
pub mod error;
pub mod merge;

// Re-export public types for convenience
pub use delta::Delta;
pub use document::{Document, NOTES_HEADING, Section};
pub use error::{MergeError, Result};
pub use merge::{MergeOutcome, merge};
