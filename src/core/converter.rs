//! Mock conversion service
//!
//! Validates requests, looks up catalogue metadata and fabricates a
//! placeholder file for every "conversion". Artificial delays imitate a slow
//! backend and can be turned off.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::artifacts::ArtifactStore;
use crate::core::catalogue::{self, VideoInfo};
use crate::core::container;
use crate::core::models::{AppError, AppResult, MediaFormat};
use crate::utils::{
    extract_video_id, get_file_extension, is_valid_download_filename, is_valid_youtube_url,
    output_filename,
};

pub const MSG_MISSING_CONVERT_FIELDS: &str = "Missing required fields: url, format, quality";
pub const MSG_MISSING_URL: &str = "Missing required field: url";
pub const MSG_INVALID_URL: &str = "Invalid YouTube URL";
pub const MSG_INVALID_FORMAT: &str = "Invalid format. Must be 'mp3' or 'mp4'";
pub const MSG_NO_VIDEO_ID: &str = "Could not extract video ID from URL";
pub const MSG_INVALID_FILENAME: &str = "Invalid filename";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionConfig {
    /// Metadata lookup delay inside a conversion
    pub info_delay_ms: u64,
    /// Delay of the standalone video info endpoint
    pub video_info_delay_ms: u64,
    /// Simulated conversion time
    pub convert_delay_ms: u64,
    /// How long converted files stay downloadable
    pub artifact_ttl_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            info_delay_ms: 1000,
            video_info_delay_ms: 800,
            convert_delay_ms: 2000,
            artifact_ttl_secs: 3600,
        }
    }
}

impl ConversionConfig {
    /// Defaults with every artificial delay removed.
    pub fn instant() -> Self {
        Self {
            info_delay_ms: 0,
            video_info_delay_ms: 0,
            convert_delay_ms: 0,
            ..Default::default()
        }
    }
}

/// Body of a conversion request. Fields are optional so that a missing field
/// produces the API's own validation message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "quality_from_text_or_number")]
    pub quality: Option<String>,
}

/// Quality labels arrive as `"320"` or as a bare `320`.
#[derive(Deserialize)]
#[serde(untagged)]
enum QualityValue {
    Text(String),
    Number(serde_json::Number),
}

fn quality_from_text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<QualityValue>::deserialize(deserializer)?;
    Ok(value.map(|quality| match quality {
        QualityValue::Text(text) => text,
        QualityValue::Number(number) => number.to_string(),
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub title: String,
    pub duration: String,
    pub thumbnail: String,
    pub download_url: String,
    pub file_size: String,
    pub format: String,
    pub quality: String,
    /// Base64 encoded file contents
    pub blob_data: String,
    pub filename: String,
}

/// A file ready to be streamed to the client
#[derive(Debug, Clone)]
pub struct DownloadPayload {
    pub filename: String,
    pub content_type: &'static str,
    pub data: Bytes,
}

pub struct ConversionService {
    config: ConversionConfig,
    artifacts: Arc<ArtifactStore>,
}

impl ConversionService {
    pub fn new(config: ConversionConfig) -> Self {
        let ttl = Duration::from_secs(config.artifact_ttl_secs);
        Self {
            config,
            artifacts: Arc::new(ArtifactStore::new(ttl)),
        }
    }

    pub fn artifacts(&self) -> Arc<ArtifactStore> {
        Arc::clone(&self.artifacts)
    }

    /// Metadata for the video behind `url`.
    pub async fn video_info(&self, url: Option<&str>) -> AppResult<VideoInfo> {
        let url = non_empty(url).ok_or_else(|| AppError::Validation(MSG_MISSING_URL.into()))?;
        if !is_valid_youtube_url(url) {
            return Err(AppError::Validation(MSG_INVALID_URL.into()));
        }
        let video_id =
            extract_video_id(url).ok_or_else(|| AppError::Validation(MSG_NO_VIDEO_ID.into()))?;

        simulate_latency(self.config.video_info_delay_ms).await;
        debug!("Resolved video info for {}", video_id);
        Ok(catalogue::lookup(&video_id))
    }

    /// Run a mock conversion and keep the result for later download.
    pub async fn convert(&self, request: ConvertRequest) -> AppResult<ConversionResult> {
        let (url, format_name, quality) = match (
            non_empty(request.url.as_deref()),
            non_empty(request.format.as_deref()),
            non_empty(request.quality.as_deref()),
        ) {
            (Some(url), Some(format), Some(quality)) => (url, format, quality),
            _ => return Err(AppError::Validation(MSG_MISSING_CONVERT_FIELDS.into())),
        };

        if !is_valid_youtube_url(url) {
            return Err(AppError::Validation(MSG_INVALID_URL.into()));
        }
        let format = MediaFormat::from_extension(format_name)
            .ok_or_else(|| AppError::Validation(MSG_INVALID_FORMAT.into()))?;
        // The URL passed the pattern check, so a missing id is a lookup failure.
        let video_id =
            extract_video_id(url).ok_or_else(|| AppError::Internal(MSG_NO_VIDEO_ID.into()))?;

        simulate_latency(self.config.info_delay_ms).await;
        let info = catalogue::lookup(&video_id);

        simulate_latency(self.config.convert_delay_ms).await;
        let filename = output_filename(&info.title, format.extension());
        let data = container::synthesize(format, &info.title);
        let blob_data = BASE64.encode(&data);
        let artifact = self.artifacts.insert(format, filename.clone(), data);

        info!(
            "🎵 Converted {} to {} ({}) as {}",
            video_id,
            format.extension(),
            quality,
            artifact.file_id
        );

        Ok(ConversionResult {
            title: info.title,
            duration: info.duration,
            thumbnail: info.thumbnail,
            download_url: artifact.download_path(),
            file_size: catalogue::estimated_file_size(format, quality).to_string(),
            format: format.extension().to_string(),
            quality: quality.to_string(),
            blob_data,
            filename,
        })
    }

    /// Resolve `{file id}.{mp3|mp4}` to a stored artifact, or fabricate a
    /// fresh placeholder when nothing (or nothing live) is stored under it.
    pub fn download(&self, filename: &str) -> AppResult<DownloadPayload> {
        if !is_valid_download_filename(filename) {
            return Err(AppError::Validation(MSG_INVALID_FILENAME.into()));
        }
        let format = get_file_extension(filename)
            .and_then(MediaFormat::from_extension)
            .ok_or_else(|| AppError::Validation(MSG_INVALID_FILENAME.into()))?;
        let file_id = filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(filename);

        if let Some(artifact) = self.artifacts.get(file_id) {
            if artifact.format == format {
                debug!("Serving stored artifact {}", file_id);
                return Ok(DownloadPayload {
                    filename: artifact.filename,
                    content_type: format.mime_type(),
                    data: artifact.data,
                });
            }
        }

        debug!("No stored artifact for {}, synthesizing", filename);
        Ok(DownloadPayload {
            filename: filename.to_string(),
            content_type: format.mime_type(),
            data: container::synthesize(format, file_id),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

async fn simulate_latency(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
