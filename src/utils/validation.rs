//! URL and input validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

static RE_YOUTUBE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+").unwrap());
static RE_VIDEO_ID_DIRECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)").unwrap()
});
static RE_VIDEO_ID_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtube\.com/watch\?.*v=([^&\n?#]+)").unwrap());
static RE_DOWNLOAD_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-z-]+\.(mp3|mp4)$").unwrap());

/// Check if URL looks like a YouTube watch or short link
pub fn is_valid_youtube_url(url: &str) -> bool {
    RE_YOUTUBE_URL.is_match(url)
}

/// Pull the video id out of a YouTube URL.
///
/// Direct forms (`watch?v=`, `youtu.be/`, `embed/`) win over a `v=` parameter
/// found later in the query string.
pub fn extract_video_id(url: &str) -> Option<String> {
    [&*RE_VIDEO_ID_DIRECT, &*RE_VIDEO_ID_QUERY]
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check a download file name (`{file id}.mp3` / `{file id}.mp4`)
pub fn is_valid_download_filename(filename: &str) -> bool {
    RE_DOWNLOAD_FILENAME.is_match(filename)
}
