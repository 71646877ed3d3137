//! HTTP surface: route table, middleware and error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::commands;
use crate::core::models::AppError;
use crate::AppState;

/// Error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Internal server error");
        }

        let body = ApiErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(conversion_routes())
        .merge(job_routes())
        .route("/health", get(commands::system::health));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Convert, video info and download endpoints
fn conversion_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/convert",
            post(commands::convert::convert).get(commands::convert::describe),
        )
        .route("/video-info", post(commands::youtube::video_info))
        .route("/download/{filename}", get(commands::download::download_file))
}

/// Job tracker endpoints
fn job_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/jobs",
            get(commands::jobs::list_jobs).post(commands::jobs::create_job),
        )
        .route("/jobs/stats", get(commands::jobs::job_stats))
        .route("/jobs/clear-completed", post(commands::jobs::clear_completed))
        .route("/jobs/pause-all", post(commands::jobs::pause_all))
        .route("/jobs/resume-all", post(commands::jobs::resume_all))
        .route("/jobs/retry-failed", post(commands::jobs::retry_failed))
        .route(
            "/jobs/{id}",
            get(commands::jobs::get_job)
                .patch(commands::jobs::update_job)
                .delete(commands::jobs::cancel_job),
        )
        .route("/jobs/{id}/start", post(commands::jobs::start_job))
        .route("/jobs/{id}/pause", post(commands::jobs::pause_job))
        .route("/jobs/{id}/resume", post(commands::jobs::resume_job))
        .route("/jobs/{id}/retry", post(commands::jobs::retry_job))
        .route("/jobs/{id}/fail", post(commands::jobs::fail_job))
}

/// Bind `address` and serve until `shutdown` resolves.
pub async fn serve<F>(state: AppState, address: &str, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("🌐 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::JobStatus;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: JobStatus::Completed,
                to: JobStatus::Paused,
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
