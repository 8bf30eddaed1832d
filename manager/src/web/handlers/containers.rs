// Live member status and immediate actions

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::common::{engine_error_response, error_response, ApiResponse, ApiResult};
use crate::agent::{ImmediateAction, ServerStatusView};
use crate::constants::history::TIME_FORMAT;
use crate::errors::ValidationError;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub was: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContainerActionRequest {
    pub action: String,
    pub servers: Vec<String>,
    pub was: Option<String>,
}

fn resolve_profile(
    state: &AppState,
    requested: Option<String>,
) -> Result<String, (StatusCode, Json<ApiResponse<()>>)> {
    let profile = requested.unwrap_or_else(|| state.config.default_profile.clone());
    if state.config.profile(&profile).is_none() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Unknown profile '{}'", profile),
        ));
    }
    Ok(profile)
}

pub async fn list_containers(
    Query(query): Query<ProfileQuery>,
    State(state): State<AppState>,
) -> ApiResult<ServerStatusView> {
    let profile = resolve_profile(&state, query.was)?;
    Ok(Json(ApiResponse::success(
        state.agent.query_status(&profile).await,
    )))
}

/// Run a verb right away, bypassing the scheduler and cluster checks.
/// Besides the lifecycle actions this accepts `status`.
pub async fn manage_container(
    State(state): State<AppState>,
    Json(request): Json<ContainerActionRequest>,
) -> ApiResult<Value> {
    let action: ImmediateAction = request
        .action
        .parse()
        .map_err(|e: ValidationError| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;
    let profile = resolve_profile(&state, request.was)?;

    let servers: Vec<String> = request
        .servers
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if servers.is_empty() {
        return Err(engine_error_response(ValidationError::EmptyTargets.into()));
    }

    info!("Immediate {} requested on {:?} (profile: {})", action, servers, profile);

    match state.agent.apply_immediate(action, &servers, &profile).await {
        Ok(output) => Ok(Json(ApiResponse::success(json!({
            "action": action.as_str(),
            "servers": servers,
            "output": output
        })))),
        Err(e) => {
            error!("Immediate {} on {:?} failed: {}", action, servers, e);
            Err(engine_error_response(e))
        }
    }
}

pub async fn get_time() -> ApiResult<Value> {
    let now = Local::now();
    Ok(Json(ApiResponse::success(json!({
        "time": now.format(TIME_FORMAT).to_string(),
        "timezone": now.format("%:z").to_string()
    }))))
}
