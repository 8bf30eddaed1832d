//! History log operations.

use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, error, warn};

use super::records::{HistoryEntry, TaskStatus};
use super::{decode_targets, encode_targets, Database};
use crate::constants::history::MAX_ENTRIES;
use crate::scheduler::Action;

impl Database {
    /// Insert at the front and evict everything past the cap, in one
    /// transaction.
    pub async fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        if entry.status == TaskStatus::Pending {
            return Err(anyhow!(
                "History entry {} is still pending and cannot be persisted",
                entry.id
            ));
        }

        debug!("Recording history entry {} for job {}", entry.id, entry.task_id);
        let targets = encode_targets(&entry.targets)?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO job_history (
                id, task_id, recorded_at, action, targets,
                cluster_aware, profile, status, detail
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.task_id)
        .bind(entry.timestamp)
        .bind(entry.action.as_str())
        .bind(&targets)
        .bind(entry.cluster_aware)
        .bind(&entry.profile)
        .bind(entry.status.as_str())
        .bind(&entry.detail)
        .execute(&mut *tx)
        .await?;

        let trimmed = sqlx::query(
            r#"
            DELETE FROM job_history
            WHERE seq NOT IN (
                SELECT seq FROM job_history ORDER BY seq DESC LIMIT ?
            )
            "#,
        )
        .bind(MAX_ENTRIES)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if trimmed.rows_affected() > 0 {
            debug!("Evicted {} old history entries", trimmed.rows_affected());
        }
        Ok(())
    }

    /// Newest first. Read failures degrade to an empty list.
    pub async fn get_history(&self) -> Vec<HistoryEntry> {
        let rows = match sqlx::query(
            r#"
            SELECT id, task_id, recorded_at, action, targets,
                   cluster_aware, profile, status, detail
            FROM job_history
            ORDER BY seq DESC
            LIMIT ?
            "#,
        )
        .bind(MAX_ENTRIES)
        .fetch_all(&self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                error!("Failed to load job history: {}", e);
                return Vec::new();
            }
        };

        rows.iter()
            .filter_map(|row| match history_from_row(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable history row: {}", e);
                    None
                }
            })
            .collect()
    }
}

fn history_from_row(row: &SqliteRow) -> Result<HistoryEntry> {
    let action: String = row.try_get("action")?;
    let targets: String = row.try_get("targets")?;
    let status: String = row.try_get("status")?;

    Ok(HistoryEntry {
        id: row.try_get("id")?,
        task_id: row.try_get("task_id")?,
        timestamp: row.try_get("recorded_at")?,
        action: action.parse::<Action>().map_err(|e| anyhow!("{}", e))?,
        targets: decode_targets(&targets)?,
        cluster_aware: row.try_get("cluster_aware")?,
        profile: row.try_get("profile")?,
        status: TaskStatus::parse(&status)
            .ok_or_else(|| anyhow!("Unknown history status '{}'", status))?,
        detail: row.try_get("detail")?,
    })
}
