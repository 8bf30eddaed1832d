// Deferred job endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::common::{engine_error_response, error_response, ApiResponse, ApiResult};
use crate::constants::history::TIME_FORMAT;
use crate::database::{HistoryEntry, TaskStatus};
use crate::errors::ValidationError;
use crate::scheduler::{Action, ScheduledTask, TimeOfDay};
use crate::topology::ClusterMap;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub action: String,
    pub servers: Vec<String>,
    /// `<min> <hour> * * *`
    pub cron: Option<String>,
    /// `HH:MM`, used when `cron` is absent
    pub time: Option<String>,
    #[serde(default)]
    pub cluster_aware: bool,
    /// Credential profile, defaults to the configured one
    pub was: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub action: Action,
    pub targets: Vec<String>,
    pub next_run_time: String,
    pub cluster_aware: bool,
    pub profile: String,
}

impl From<ScheduledTask> for JobSummary {
    fn from(task: ScheduledTask) -> Self {
        Self {
            next_run_time: task.fire_at.with_timezone(&Local).to_rfc3339(),
            id: task.id,
            action: task.action,
            targets: task.targets,
            cluster_aware: task.cluster_aware,
            profile: task.profile,
        }
    }
}

pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Vec<JobSummary>> {
    let jobs = state
        .engine
        .list_tasks()
        .await
        .into_iter()
        .map(JobSummary::from)
        .collect();
    Ok(Json(ApiResponse::success(jobs)))
}

pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<Value> {
    let action: Action = request
        .action
        .parse()
        .map_err(|e: ValidationError| {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        })?;

    let time_input = request
        .cron
        .as_deref()
        .or(request.time.as_deref())
        .ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                "Either 'cron' or 'time' is required".to_string(),
            )
        })?;
    let time: TimeOfDay = time_input
        .parse()
        .map_err(|e: ValidationError| {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        })?;

    let profile = request
        .was
        .unwrap_or_else(|| state.config.default_profile.clone());
    if state.config.profile(&profile).is_none() {
        warn!("Rejected job for unknown profile '{}'", profile);
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown profile '{}'", profile),
        ));
    }

    info!(
        "Scheduling {} on {:?} at {} (profile: {}, cluster aware: {})",
        action, request.servers, time, profile, request.cluster_aware
    );

    match state
        .engine
        .create_task(action, request.servers, time, request.cluster_aware, &profile)
        .await
    {
        Ok(job_id) => Ok(Json(ApiResponse::success(json!({ "job_id": job_id })))),
        Err(e) => {
            if !e.is_validation() {
                error!("Failed to schedule job: {}", e);
            }
            Err(engine_error_response(e))
        }
    }
}

pub async fn delete_job(
    Path(job_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Value> {
    match state.engine.cancel_task(&job_id).await {
        Ok(()) => Ok(Json(ApiResponse::success(json!({
            "job_id": job_id,
            "status": "cancelled"
        })))),
        Err(e) => {
            if !e.is_not_found() {
                error!("Failed to cancel job {}: {}", job_id, e);
            }
            Err(engine_error_response(e))
        }
    }
}

/// History entry as shown to operators, stamped in server-local time
#[derive(Debug, Serialize)]
pub struct HistorySummary {
    pub id: String,
    pub task_id: String,
    pub timestamp: String,
    pub action: Action,
    pub targets: Vec<String>,
    pub cluster_aware: bool,
    pub profile: String,
    pub status: TaskStatus,
    pub detail: String,
}

impl From<HistoryEntry> for HistorySummary {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            timestamp: entry
                .timestamp
                .with_timezone(&Local)
                .format(TIME_FORMAT)
                .to_string(),
            id: entry.id,
            task_id: entry.task_id,
            action: entry.action,
            targets: entry.targets,
            cluster_aware: entry.cluster_aware,
            profile: entry.profile,
            status: entry.status,
            detail: entry.detail,
        }
    }
}

pub async fn get_history(State(state): State<AppState>) -> ApiResult<Vec<HistorySummary>> {
    let history = state
        .engine
        .get_history()
        .await
        .into_iter()
        .map(HistorySummary::from)
        .collect();
    Ok(Json(ApiResponse::success(history)))
}

pub async fn get_clusters(State(state): State<AppState>) -> ApiResult<ClusterMap> {
    Ok(Json(ApiResponse::success(state.engine.get_clusters())))
}
