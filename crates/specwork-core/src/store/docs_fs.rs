//! File-system document store.
//!
//! One Markdown file per feature under the configured specs directory,
//! written through the document model's render/parse pair.

use crate::error::Result;
use crate::store::docs::DocumentStore;
use specwork_doc::Document;
use std::fs;
use std::path::PathBuf;

/// Document store writing `<specs_dir>/<feature>.md`.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    specs_dir: PathBuf,
}

impl FsDocumentStore {
    /// Creates a store rooted at `specs_dir`. The directory is created
    /// lazily on first save.
    pub fn new(specs_dir: PathBuf) -> Self {
        Self { specs_dir }
    }

    fn path_for(&self, feature: &str) -> PathBuf {
        self.specs_dir.join(format!("{feature}.md"))
    }
}

impl DocumentStore for FsDocumentStore {
    fn load(&self, feature: &str) -> Result<Document> {
        let path = self.path_for(feature);
        if !path.exists() {
            return Ok(Document::new(feature));
        }
        let text = fs::read_to_string(&path)?;
        Ok(Document::parse(feature, &text)?)
    }

    fn save(&self, feature: &str, doc: &Document) -> Result<()> {
        fs::create_dir_all(&self.specs_dir)?;
        fs::write(self.path_for(feature), doc.render())?;
        Ok(())
    }
}
