//! Common test data and constants

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;

use fleet_manager::database::{HistoryEntry, TaskStatus};
use fleet_manager::scheduler::{Action, ScheduledTask};
use fleet_manager::services::RollingPolicy;

pub const PROFILE: &str = "container";

/// Common test server names
pub mod servers {
    pub const APP_1: &str = "app-1";
    pub const APP_2: &str = "app-2";
    pub const APP_3: &str = "app-3";
    pub const BATCH_1: &str = "batch-1";
}

pub fn targets(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Same shape as the production protocol, scaled down to milliseconds
pub fn fast_policy() -> RollingPolicy {
    RollingPolicy {
        poll_interval: Duration::from_millis(5),
        reach_attempts: 30,
        stability_polls: 5,
    }
}

/// Task firing `offset_ms` from now (negative for the past)
pub fn task_in(action: Action, names: &[&str], offset_ms: i64, cluster_aware: bool) -> ScheduledTask {
    ScheduledTask::new(
        action,
        targets(names),
        Utc::now() + ChronoDuration::milliseconds(offset_ms),
        cluster_aware,
        PROFILE.to_string(),
    )
}

pub fn finished_entry(task: &ScheduledTask, status: TaskStatus, detail: &str) -> HistoryEntry {
    let mut entry = HistoryEntry::pending(task);
    entry.push_detail(detail);
    entry.finish(status)
}
