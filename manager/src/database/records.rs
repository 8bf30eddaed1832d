//! History record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scheduler::{Action, ScheduledTask};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// In-memory only, before the run settles
    Pending,
    Success,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Skipped => "SKIPPED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PENDING" => Some(TaskStatus::Pending),
            "SUCCESS" => Some(TaskStatus::Success),
            "FAILED" => Some(TaskStatus::Failed),
            "SKIPPED" => Some(TaskStatus::Skipped),
            _ => None,
        }
    }
}

/// Outcome of one task run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub task_id: String,
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub targets: Vec<String>,
    pub cluster_aware: bool,
    pub profile: String,
    pub status: TaskStatus,
    pub detail: String,
}

impl HistoryEntry {
    pub fn pending(task: &ScheduledTask) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task.id.clone(),
            timestamp: Utc::now(),
            action: task.action,
            targets: task.targets.clone(),
            cluster_aware: task.cluster_aware,
            profile: task.profile.clone(),
            status: TaskStatus::Pending,
            detail: String::new(),
        }
    }

    /// Settle the entry, stamping the completion time
    pub fn finish(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self.timestamp = Utc::now();
        self
    }

    pub fn push_detail(&mut self, text: &str) {
        self.detail.push_str(text);
    }
}
