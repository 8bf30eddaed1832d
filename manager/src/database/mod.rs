//! Database layer for the fleet manager.
//!
//! This module provides SQLite persistence for:
//! - Scheduled jobs (the durable half of every armed timer)
//! - Job history (capped, newest first)
//!
//! The module is organized into submodules:
//! - `records` - History record types
//! - `jobs` - Persistent job store operations
//! - `history` - History log operations
//!
//! All writes go through one connection and one async mutex, so concurrent
//! task runs never interleave a read-modify-write.

mod history;
mod jobs;
mod records;

pub use records::*;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{error, info};

pub struct Database {
    pool: Pool<Sqlite>,
    write_lock: Mutex<()>,
}

impl Database {
    /// Expose pool for integration test queries
    #[allow(dead_code)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        info!("Opening database at {}", database_path);

        let database_url = if database_path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            if let Some(parent) = Path::new(database_path).parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = tokio::fs::create_dir_all(parent).await {
                        error!("Failed to create parent directory {:?}: {}", parent, e);
                        return Err(e.into());
                    }
                }
            }
            format!("sqlite:{}?mode=rwc", database_path)
        };

        let pool = match SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database {}: {}", database_url, e);
                return Err(e.into());
            }
        };

        let database = Self {
            pool,
            write_lock: Mutex::new(()),
        };

        database.initialize_tables().await?;
        info!("Database initialized");
        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        let jobs_table_sql = r#"
            CREATE TABLE IF NOT EXISTS scheduled_jobs (
                id TEXT PRIMARY KEY,
                action TEXT NOT NULL,
                targets TEXT NOT NULL,
                fire_at DATETIME NOT NULL,
                cluster_aware BOOLEAN NOT NULL,
                profile TEXT NOT NULL
            )
        "#;

        if let Err(e) = sqlx::query(jobs_table_sql).execute(&self.pool).await {
            error!("Failed to create scheduled_jobs table: {}", e);
            return Err(e.into());
        }

        let history_table_sql = r#"
            CREATE TABLE IF NOT EXISTS job_history (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                task_id TEXT NOT NULL,
                recorded_at DATETIME NOT NULL,
                action TEXT NOT NULL,
                targets TEXT NOT NULL,
                cluster_aware BOOLEAN NOT NULL,
                profile TEXT NOT NULL,
                status TEXT NOT NULL,
                detail TEXT NOT NULL
            )
        "#;

        if let Err(e) = sqlx::query(history_table_sql).execute(&self.pool).await {
            error!("Failed to create job_history table: {}", e);
            return Err(e.into());
        }

        Ok(())
    }
}

/// Targets are stored as a JSON array
fn encode_targets(targets: &[String]) -> Result<String> {
    Ok(serde_json::to_string(targets)?)
}

fn decode_targets(raw: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(raw)?)
}
