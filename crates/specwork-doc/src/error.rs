//! Error types for the document merge crate.

use thiserror::Error;

/// Errors that can occur while merging a delta into a document.
#[derive(Error, Debug)]
pub enum MergeError {
    /// A modified section references a heading that does not exist in the
    /// document. Modifying an absent section is a caller logic error, not an
    /// idempotent no-op.
    #[error("section not found: {0}")]
    SectionNotFound(String),

    /// An added section uses a heading that already exists in the document.
    /// Added sections must be genuinely new; this is also the guard against
    /// applying the same delta twice.
    #[error("duplicate section: {0}")]
    DuplicateSection(String),

    /// The delta targets the audit trailer, which only the merge engine may
    /// write.
    #[error("reserved heading: {0}")]
    ReservedHeading(String),

    /// A section body contains a line that would parse back as a section
    /// heading, splitting the section on the next load.
    #[error("section {0} body contains a heading marker line")]
    HeadingInBody(String),

    /// Document text could not be parsed into the section model.
    #[error("document parse error: {0}")]
    DocumentParse(String),
}

/// Result type alias for document merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;
