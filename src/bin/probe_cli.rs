use std::env;

use tube_converter::core::catalogue::{estimated_file_size, lookup};
use tube_converter::core::models::MediaFormat;
use tube_converter::utils::{extract_video_id, is_valid_youtube_url, output_filename};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: probe_cli <youtube-url> [mp3|mp4] [quality]");
        std::process::exit(1);
    }

    let url = &args[1];
    let format_name = args.get(2).map(String::as_str).unwrap_or("mp3");
    let Some(format) = MediaFormat::from_extension(format_name) else {
        eprintln!("Error: Invalid format. Must be 'mp3' or 'mp4'");
        std::process::exit(1);
    };
    let quality = args
        .get(3)
        .cloned()
        .unwrap_or_else(|| default_quality(format).to_string());

    if !is_valid_youtube_url(url) {
        eprintln!("Error: Invalid YouTube URL");
        std::process::exit(1);
    }
    let Some(video_id) = extract_video_id(url) else {
        eprintln!("Error: Could not extract video ID from URL");
        std::process::exit(1);
    };

    let info = lookup(&video_id);
    println!("Video ID: {}", info.id);
    println!("Title: {}", info.title);
    println!("Channel: {}", info.channel);
    println!("Duration: {}", info.duration);
    println!("Views: {}", info.views);
    println!("Thumbnail: {}", info.thumbnail);
    println!("Format: {} ({})", format.extension(), quality);
    println!("Estimated size: {}", estimated_file_size(format, &quality));
    println!("Filename: {}", output_filename(&info.title, format.extension()));
}

fn default_quality(format: MediaFormat) -> &'static str {
    match format {
        MediaFormat::Audio => "192",
        MediaFormat::Video => "720",
    }
}
