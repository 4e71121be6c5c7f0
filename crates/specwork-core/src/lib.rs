//! Specwork Core - Task graph store and change workflow engine.
//!
//! This crate provides the working half of specwork: a dependency-aware task
//! graph store, a persisted change ledger, and the coordinator that sequences
//! a change from proposal through planning to completion, where the change's
//! delta is merged into the feature's specification document.
//!
//! # Architecture
//!
//! The core crate is organized into several modules:
//!
//! - [`error`]: Error types and result type alias
//! - [`config`]: On-disk layout of a specwork workspace
//! - [`task`]: Tasks, dependency edges, and graph query types
//! - [`change`]: Change identity, lifecycle state, and the ledger
//! - [`store`]: Task graph and document storage adapters
//! - [`coordinator`]: The change workflow coordinator
//!
//! # Example
//!
//! ```rust,ignore
//! use specwork_core::{Coordinator, InMemoryTaskStore, StoreRegistry, TaskSpec};
//! use specwork_core::store::docs_mock::MockDocumentStore;
//! use specwork_doc::Delta;
//!
//! let stores = StoreRegistry::new(
//!     Box::new(InMemoryTaskStore::new()),
//!     Box::new(MockDocumentStore::new()),
//! );
//! let coordinator = Coordinator::new(stores);
//!
//! let change = coordinator.propose("auth", "add-mfa", "add multi-factor auth")?;
//! coordinator.plan(&change, &[TaskSpec::new("add MFA entity")])?;
//! // ... close the planned tasks through the task store ...
//! coordinator.complete(&change, &Delta::new().with_added("MFA Enrollment", "..."))?;
//! ```

pub mod change;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod store;
pub mod task;

// Re-export core types for convenience
pub use change::{ChangeId, ChangeLedger, ChangeRecord, ChangeState};
pub use config::SpecworkConfig;
pub use coordinator::Coordinator;
pub use error::{CoreError, Result};
pub use store::docs::DocumentStore;
pub use store::docs_fs::FsDocumentStore;
pub use store::tasks::TaskStore;
pub use store::tasks_mem::InMemoryTaskStore;
pub use store::tasks_proc::ProcessTaskStore;
pub use store::StoreRegistry;
pub use task::{
    BlockedTask, DepKind, Edge, EpicProgress, NewTask, Status, Task, TaskId, TaskKind, TaskSpec,
};
