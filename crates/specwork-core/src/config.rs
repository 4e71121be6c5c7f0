//! Configuration for the specwork runtime.
//!
//! All on-disk paths are derived from a single workspace root, so callers
//! construct one value and never juggle individual file locations.

use std::path::PathBuf;

/// Main specwork configuration.
///
/// Contains every path the stores and the CLI need, derived from the
/// workspace root with `new`.
#[derive(Debug, Clone)]
pub struct SpecworkConfig {
    /// Workspace root directory (absolute path).
    pub root: PathBuf,

    /// State directory (typically `.specwork`).
    pub state_dir: PathBuf,

    /// Task graph snapshot file (`.specwork/tasks.json`).
    pub tasks_file: PathBuf,

    /// Change ledger file (`.specwork/changes.json`).
    pub ledger_file: PathBuf,

    /// Per-feature specification documents (`.specwork/specs/<feature>.md`).
    pub specs_dir: PathBuf,
}

impl SpecworkConfig {
    /// Creates a configuration with all paths derived from `root`.
    pub fn new(root: PathBuf) -> Self {
        let state_dir = root.join(".specwork");
        Self {
            tasks_file: state_dir.join("tasks.json"),
            ledger_file: state_dir.join("changes.json"),
            specs_dir: state_dir.join("specs"),
            state_dir,
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_root() {
        let config = SpecworkConfig::new(PathBuf::from("/work"));
        assert_eq!(config.state_dir, PathBuf::from("/work/.specwork"));
        assert_eq!(config.tasks_file, PathBuf::from("/work/.specwork/tasks.json"));
        assert_eq!(
            config.ledger_file,
            PathBuf::from("/work/.specwork/changes.json")
        );
        assert_eq!(config.specs_dir, PathBuf::from("/work/.specwork/specs"));
    }
}
