//! Persistent job store operations.
//!
//! One row per armed task. Each mutation is a single statement, so a reader
//! never observes a partially written job.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, error, warn};

use super::{decode_targets, encode_targets, Database};
use crate::scheduler::{Action, ScheduledTask};

impl Database {
    /// Insert or replace the job with the same id
    pub async fn add_job(&self, task: &ScheduledTask) -> Result<()> {
        debug!("Persisting scheduled job: {}", task.id);
        let targets = encode_targets(&task.targets)?;

        let _guard = self.write_lock.lock().await;
        match sqlx::query(
            r#"
            INSERT OR REPLACE INTO scheduled_jobs (
                id, action, targets, fire_at, cluster_aware, profile
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(task.action.as_str())
        .bind(&targets)
        .bind(task.fire_at)
        .bind(task.cluster_aware)
        .bind(&task.profile)
        .execute(&self.pool)
        .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to persist scheduled job {}: {}", task.id, e);
                Err(e.into())
            }
        }
    }

    /// Returns false when no job had this id
    pub async fn remove_job(&self, task_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM scheduled_jobs WHERE id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to remove scheduled job {}: {}", task_id, e);
                e
            })?;

        let removed = result.rows_affected() > 0;
        if !removed {
            debug!("Scheduled job {} was not in the store", task_id);
        }
        Ok(removed)
    }

    /// Read failures degrade to an empty list; rows that cannot be decoded
    /// are skipped.
    pub async fn list_jobs(&self) -> Vec<ScheduledTask> {
        let rows = match sqlx::query(
            r#"
            SELECT id, action, targets, fire_at, cluster_aware, profile
            FROM scheduled_jobs
            ORDER BY fire_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                error!("Failed to load scheduled jobs: {}", e);
                return Vec::new();
            }
        };

        rows.iter()
            .filter_map(|row| match job_from_row(row) {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!("Skipping unreadable scheduled job row: {}", e);
                    None
                }
            })
            .collect()
    }

    pub async fn get_job(&self, task_id: &str) -> Result<Option<ScheduledTask>> {
        let row = sqlx::query(
            r#"
            SELECT id, action, targets, fire_at, cluster_aware, profile
            FROM scheduled_jobs
            WHERE id = ?
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(job_from_row).transpose()
    }
}

fn job_from_row(row: &SqliteRow) -> Result<ScheduledTask> {
    let action: String = row.try_get("action")?;
    let targets: String = row.try_get("targets")?;
    let fire_at: DateTime<Utc> = row.try_get("fire_at")?;

    Ok(ScheduledTask {
        id: row.try_get("id")?,
        action: action.parse::<Action>().map_err(|e| anyhow!("{}", e))?,
        targets: decode_targets(&targets)?,
        fire_at,
        cluster_aware: row.try_get("cluster_aware")?,
        profile: row.try_get("profile")?,
    })
}
