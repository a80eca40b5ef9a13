//! HTTP front end for the render queue.
//!
//! Exposes a thin surface over the job store: enqueue a render job,
//! poll its status, health check. All heavy lifting happens in the
//! worker process, which shares the store with this service.

pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/queue", post(handlers::enqueue))
        .route("/api/queue/:id", get(handlers::status))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::Json;

    use reel_models::{JobId, JobStatus, Preferences, RenderParams};
    use reel_store::MemoryJobStore;

    use crate::error::ApiError;
    use crate::handlers::{self, EnqueueRequest};
    use crate::state::AppState;

    fn test_state() -> AppState {
        AppState::new(Arc::new(MemoryJobStore::new()))
    }

    fn request(job_id: &str, script: &str) -> EnqueueRequest {
        EnqueueRequest {
            job_id: job_id.to_string(),
            script: script.to_string(),
            preferences: Preferences::default(),
            content_class: String::new(),
            video_id: None,
        }
    }

    #[tokio::test]
    async fn test_enqueue_accepts_and_returns_poll_url() {
        let state = test_state();

        let (status, Json(body)) =
            handlers::enqueue(State(state.clone()), Json(request("job-1", "A short story.")))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body.job_id, "job-1");
        assert_eq!(body.status, "pending");
        assert_eq!(body.poll_url, "/api/queue/job-1");

        let record = state.store.get(&JobId::from_string("job-1")).await.unwrap();
        assert_eq!(record.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_enqueue_rejects_blank_fields() {
        let state = test_state();

        let err = handlers::enqueue(State(state.clone()), Json(request("  ", "hi")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = handlers::enqueue(State(state), Json(request("job-1", "   ")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_enqueue_conflicts_on_active_duplicate() {
        let state = test_state();

        let _ = handlers::enqueue(State(state.clone()), Json(request("job-1", "take one")))
            .await
            .unwrap();
        let err = handlers::enqueue(State(state), Json(request("job-1", "take two")))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_enqueue_allows_resubmit_after_terminal() {
        let state = test_state();
        let id = JobId::from_string("job-1");

        state
            .store
            .create(id.clone(), RenderParams::new("first run"))
            .await
            .unwrap();
        state
            .store
            .update(&id, reel_models::JobUpdate::failed("render exploded"))
            .await
            .unwrap();

        let (status, _) = handlers::enqueue(State(state), Json(request("job-1", "second run")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_status_returns_record_or_404() {
        let state = test_state();
        state
            .store
            .create(JobId::from_string("job-1"), RenderParams::new("hello"))
            .await
            .unwrap();

        let Json(record) = handlers::status(State(state.clone()), Path("job-1".to_string()))
            .await
            .unwrap();
        assert_eq!(record.id.as_str(), "job-1");

        let err = handlers::status(State(state), Path("nope".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
