//! Test database utilities

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use fleet_manager::database::Database;

/// File-backed database in a temp directory. Reopening the same path
/// simulates a process restart.
pub struct TestDatabase {
    _temp_dir: TempDir,
    path: PathBuf,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("data").join("fleet.db");
        Self {
            _temp_dir: temp_dir,
            path,
        }
    }

    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    /// Open (or reopen) the database
    pub async fn open(&self) -> Result<Arc<Database>> {
        Ok(Arc::new(Database::new(&self.path_string()).await?))
    }

    /// Fresh in-memory database
    pub async fn in_memory() -> Result<Arc<Database>> {
        Ok(Arc::new(Database::new(":memory:").await?))
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}
