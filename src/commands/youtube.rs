//! Video metadata commands

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::models::AppError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct VideoInfoRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /api/video-info
pub async fn video_info(
    State(state): State<AppState>,
    payload: Result<Json<VideoInfoRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let info = state.conversion.video_info(request.url.as_deref()).await?;
    Ok(Json(json!({ "success": true, "data": info })))
}
