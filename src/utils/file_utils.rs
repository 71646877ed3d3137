//! File system utilities

use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;

/// Ensure directory exists
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| anyhow!("Failed to create directory {}: {}", path.display(), e))?;
    }
    Ok(())
}

/// Get file extension
pub fn get_file_extension(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|ext| ext.to_str())
}

/// Strip everything except ASCII letters, digits, whitespace and `-`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Download name offered to the user for a converted title
pub fn output_filename(title: &str, extension: &str) -> String {
    format!("{}.{}", sanitize_title(title), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_filename_strips_punctuation() {
        assert_eq!(
            output_filename("React vs Vue: Which Framework to Choose?", "mp4"),
            "React vs Vue Which Framework to Choose.mp4"
        );
        assert_eq!(
            output_filename("  10 CSS Tricks Every Developer Should Know ", "mp3"),
            "10 CSS Tricks Every Developer Should Know.mp3"
        );
        assert_eq!(output_filename("Ünïcode—title!", "mp3"), "ncodetitle.mp3");
    }

    #[test]
    fn test_get_file_extension() {
        assert_eq!(get_file_extension("123-abc.mp4"), Some("mp4"));
        assert_eq!(get_file_extension("noext"), None);
    }
}
