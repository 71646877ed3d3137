//! File download command

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;

use crate::core::models::AppError;
use crate::AppState;

/// GET /api/download/{filename}
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let payload = state.conversion.download(&filename)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, payload.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", payload.filename),
        )
        .header(header::CONTENT_LENGTH, payload.data.len())
        .body(Body::from(payload.data))
        .map_err(|e| AppError::Internal(format!("Response build failed: {e}")))
}
