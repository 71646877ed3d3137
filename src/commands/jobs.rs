//! Job tracker commands

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::models::{AppError, JobDescriptor, JobPatch};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[serde(flatten)]
    pub descriptor: JobDescriptor,
    /// Start ticking immediately (default) or wait in the queue
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
}

fn default_auto_start() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct FailRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

fn ok(data: impl serde::Serialize) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
}

/// GET /api/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<Value> {
    let jobs = state.job_manager.read().await.list().await;
    ok(jobs)
}

/// POST /api/jobs
pub async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload.map_err(bad_body)?;

    let mut manager = state.job_manager.write().await;
    let job = if request.auto_start {
        manager.submit(request.descriptor).await?
    } else {
        manager.enqueue(request.descriptor).await?
    };
    Ok((StatusCode::CREATED, ok(job)))
}

/// GET /api/jobs/stats
pub async fn job_stats(State(state): State<AppState>) -> Json<Value> {
    let stats = state.job_manager.read().await.stats().await;
    ok(stats)
}

/// GET /api/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let job = state
        .job_manager
        .read()
        .await
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(id.clone()))?;
    Ok(ok(job))
}

/// PATCH /api/jobs/{id}
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<JobPatch>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(patch) = payload.map_err(bad_body)?;
    let job = state
        .job_manager
        .write()
        .await
        .update(&id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(id.clone()))?;
    Ok(ok(job))
}

/// DELETE /api/jobs/{id}
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let removed = state.job_runtime.cancel_job(id).await?;
    Ok(ok(json!({ "removed": removed })))
}

/// POST /api/jobs/{id}/start
pub async fn start_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(ok(state.job_runtime.start_job(id).await?))
}

/// POST /api/jobs/{id}/pause
pub async fn pause_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(ok(state.job_runtime.pause_job(id).await?))
}

/// POST /api/jobs/{id}/resume
pub async fn resume_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(ok(state.job_runtime.resume_job(id).await?))
}

/// POST /api/jobs/{id}/retry
pub async fn retry_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(ok(state.job_runtime.retry_job(id).await?))
}

/// POST /api/jobs/{id}/fail
///
/// The body is optional; `{"reason": "..."}` sets the error message.
pub async fn fail_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        FailRequest::default()
    } else {
        serde_json::from_slice::<FailRequest>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?
    };
    Ok(ok(state.job_runtime.fail_job(id, request.reason).await?))
}

/// POST /api/jobs/clear-completed
pub async fn clear_completed(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let cleared = state.job_runtime.clear_completed().await?;
    Ok(ok(json!({ "count": cleared })))
}

/// POST /api/jobs/pause-all
pub async fn pause_all(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let paused = state.job_runtime.pause_all().await?;
    Ok(ok(json!({ "count": paused })))
}

/// POST /api/jobs/resume-all
pub async fn resume_all(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let resumed = state.job_runtime.resume_all().await?;
    Ok(ok(json!({ "count": resumed })))
}

/// POST /api/jobs/retry-failed
pub async fn retry_failed(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let retried = state.job_runtime.retry_failed().await?;
    Ok(ok(json!({ "count": retried })))
}
