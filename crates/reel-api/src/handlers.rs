//! Request handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use reel_models::{JobId, JobRecord, Preferences, RenderParams};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub job_id: String,
    pub script: String,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub content_class: String,
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub job_id: String,
    pub status: String,
    pub poll_url: String,
}

/// POST /api/queue
///
/// 202 with a poll URL on success, 409 when an active job already holds
/// the id.
pub async fn enqueue(
    State(state): State<AppState>,
    Json(request): Json<EnqueueRequest>,
) -> ApiResult<(StatusCode, Json<EnqueueResponse>)> {
    if request.job_id.trim().is_empty() {
        return Err(ApiError::bad_request("job_id must not be empty"));
    }
    if request.script.trim().is_empty() {
        return Err(ApiError::bad_request("script must not be empty"));
    }

    let id = JobId::from_string(request.job_id.trim());
    let params = RenderParams {
        script: request.script,
        preferences: request.preferences,
        content_class: request.content_class,
        video_id: request.video_id,
    };

    let record = state.store.create(id.clone(), params).await?;
    info!(job_id = %id, "job enqueued");

    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueueResponse {
            job_id: record.id.to_string(),
            status: record.status.to_string(),
            poll_url: format!("/api/queue/{id}"),
        }),
    ))
}

/// GET /api/queue/{id}
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobRecord>> {
    let record = state.store.get(&JobId::from_string(id)).await?;
    Ok(Json(record))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
