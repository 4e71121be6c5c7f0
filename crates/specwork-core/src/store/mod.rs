//! Storage adapters for the workflow coordinator.
//!
//! Two seams: the task graph store (in-process or external process) and the
//! document source/sink (file system or in-memory mock). The registry bundles
//! one of each as trait objects so the coordinator never knows which
//! implementation it is driving.

pub mod docs;
pub mod docs_fs;
pub mod docs_mock;
pub mod tasks;
pub mod tasks_mem;
pub mod tasks_proc;

/// Store registry bundling the task graph store and the document store.
pub struct StoreRegistry {
    /// Task graph store for task and edge operations.
    pub tasks: Box<dyn tasks::TaskStore>,

    /// Document source/sink for specification documents.
    pub docs: Box<dyn docs::DocumentStore>,
}

impl StoreRegistry {
    /// Creates a registry from the provided store implementations.
    pub fn new(tasks: Box<dyn tasks::TaskStore>, docs: Box<dyn docs::DocumentStore>) -> Self {
        Self { tasks, docs }
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("tasks", &"Box<dyn TaskStore>")
            .field("docs", &"Box<dyn DocumentStore>")
            .finish()
    }
}
