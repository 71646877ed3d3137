//! Mock video catalogue
//!
//! Stands in for a real metadata API. The same video id always maps to the
//! same entry so repeated lookups stay consistent.

use serde::{Deserialize, Serialize};

use crate::core::models::MediaFormat;

struct CatalogueEntry {
    title: &'static str,
    channel: &'static str,
    duration: &'static str,
    views: &'static str,
}

const CATALOGUE: [CatalogueEntry; 4] = [
    CatalogueEntry {
        title: "How to Build Amazing Web Applications",
        channel: "WebDev Pro",
        duration: "12:34",
        views: "2,456,789",
    },
    CatalogueEntry {
        title: "Complete JavaScript Tutorial for Beginners",
        channel: "CodeMaster",
        duration: "45:12",
        views: "5,234,567",
    },
    CatalogueEntry {
        title: "React vs Vue: Which Framework to Choose?",
        channel: "TechReview",
        duration: "18:45",
        views: "1,876,543",
    },
    CatalogueEntry {
        title: "10 CSS Tricks Every Developer Should Know",
        channel: "DesignGuru",
        duration: "8:23",
        views: "987,654",
    },
];

pub const UPLOAD_DATE: &str = "2024-01-15";
pub const AUDIO_QUALITIES: [&str; 3] = ["128", "192", "320"];
pub const VIDEO_QUALITIES: [&str; 4] = ["360", "720", "1080", "4k"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableFormats {
    pub audio: Vec<String>,
    pub video: Vec<String>,
}

impl Default for AvailableFormats {
    fn default() -> Self {
        Self {
            audio: AUDIO_QUALITIES.iter().map(|q| q.to_string()).collect(),
            video: VIDEO_QUALITIES.iter().map(|q| q.to_string()).collect(),
        }
    }
}

/// Metadata returned for a YouTube video id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub thumbnail: String,
    pub channel: String,
    pub views: String,
    pub upload_date: String,
    pub available_formats: AvailableFormats,
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)
}

fn catalogue_index(video_id: &str) -> usize {
    let sum: u64 = video_id.encode_utf16().map(u64::from).sum();
    (sum % CATALOGUE.len() as u64) as usize
}

/// Deterministic mock metadata for `video_id`.
pub fn lookup(video_id: &str) -> VideoInfo {
    let entry = &CATALOGUE[catalogue_index(video_id)];
    VideoInfo {
        id: video_id.to_string(),
        title: entry.title.to_string(),
        description: format!(
            "This is an amazing video about {}...",
            entry.title.to_lowercase()
        ),
        duration: entry.duration.to_string(),
        thumbnail: thumbnail_url(video_id),
        channel: entry.channel.to_string(),
        views: entry.views.to_string(),
        upload_date: UPLOAD_DATE.to_string(),
        available_formats: AvailableFormats::default(),
    }
}

/// Display size for a format/quality pair. Unknown qualities fall back to a
/// per-format default.
pub fn estimated_file_size(format: MediaFormat, quality: &str) -> &'static str {
    match format {
        MediaFormat::Audio => match quality {
            "128" => "3.1 MB",
            "192" => "4.6 MB",
            "320" => "7.8 MB",
            _ => "5.2 MB",
        },
        MediaFormat::Video => match quality {
            "360" => "15.3 MB",
            "720" => "45.7 MB",
            "1080" => "89.2 MB",
            "4k" => "256.8 MB",
            _ => "25.8 MB",
        },
    }
}
