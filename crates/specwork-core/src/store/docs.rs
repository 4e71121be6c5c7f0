//! Document source/sink trait.

use crate::error::Result;
use specwork_doc::Document;

/// Flat read/write access to a feature's specification document.
///
/// The core only manages section structure; storage location and format
/// belong to the implementation. There is exactly one live document per
/// feature, mutated only via the merge engine.
pub trait DocumentStore: Send + Sync {
    /// Loads the document for a feature.
    ///
    /// A feature that has never completed a change loads as an empty
    /// document, so the first merge bootstraps the file.
    fn load(&self, feature: &str) -> Result<Document>;

    /// Persists the full document for a feature, replacing any previous
    /// version.
    fn save(&self, feature: &str, doc: &Document) -> Result<()>;
}
