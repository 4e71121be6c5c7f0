//! Mock document store for testing.
//!
//! Keeps documents in an in-memory map behind `Arc<Mutex>`, so clones share
//! state and tests can inspect what the coordinator persisted.

use crate::error::Result;
use crate::store::docs::DocumentStore;
use specwork_doc::Document;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory document store.
#[derive(Debug, Clone, Default)]
pub struct MockDocumentStore {
    docs: Arc<Mutex<HashMap<String, Document>>>,
}

impl MockDocumentStore {
    /// Creates an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored document for a feature, if any was saved.
    pub fn stored(&self, feature: &str) -> Option<Document> {
        self.docs.lock().unwrap().get(feature).cloned()
    }

    /// Pre-populates the store with a document.
    pub fn seed(&self, doc: Document) {
        self.docs.lock().unwrap().insert(doc.name.clone(), doc);
    }
}

impl DocumentStore for MockDocumentStore {
    fn load(&self, feature: &str) -> Result<Document> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .get(feature)
            .cloned()
            .unwrap_or_else(|| Document::new(feature)))
    }

    fn save(&self, feature: &str, doc: &Document) -> Result<()> {
        self.docs
            .lock()
            .unwrap()
            .insert(feature.to_string(), doc.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specwork_doc::Section;

    #[test]
    fn test_load_unknown_feature_is_empty() {
        let store = MockDocumentStore::new();
        assert!(store.load("auth").unwrap().is_empty());
        assert!(store.stored("auth").is_none());
    }

    #[test]
    fn test_save_then_load() {
        let store = MockDocumentStore::new();
        let mut doc = Document::new("auth");
        doc.push_section(Section::new("Login", "x"));

        store.save("auth", &doc).unwrap();
        assert_eq!(store.load("auth").unwrap(), doc);
    }

    #[test]
    fn test_clones_share_documents() {
        let store = MockDocumentStore::new();
        let clone = store.clone();
        store.save("auth", &Document::new("auth")).unwrap();
        assert!(clone.stored("auth").is_some());
    }
}
