//! Conversion commands

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::core::converter::{ConvertRequest, MSG_MISSING_CONVERT_FIELDS};
use crate::core::models::AppError;
use crate::AppState;

const MSG_CONVERSION_FAILED: &str = "Internal server error during conversion";

/// POST /api/convert
pub async fn convert(
    State(state): State<AppState>,
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("Rejected convert body: {}", rejection);
        AppError::Validation(MSG_MISSING_CONVERT_FIELDS.to_string())
    })?;

    match state.conversion.convert(request).await {
        Ok(result) => Ok(Json(json!({ "success": true, "data": result }))),
        Err(AppError::Validation(message)) => Err(AppError::Validation(message)),
        Err(e) => {
            tracing::error!("Conversion error: {}", e);
            Err(AppError::Internal(MSG_CONVERSION_FAILED.to_string()))
        }
    }
}

/// GET /api/convert
pub async fn describe() -> Json<Value> {
    Json(json!({
        "message": "YouTube Converter API",
        "endpoints": {
            "convert": "POST /api/convert - Convert YouTube video",
            "videoInfo": "POST /api/video-info - Fetch video metadata",
            "download": "GET /api/download/{filename} - Download converted file",
        }
    }))
}
