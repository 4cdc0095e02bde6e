// SPDX-License-Identifier: MIT

//! Metadata reporter for the `--metadata` flag
//!
//! Purely descriptive output; nothing here feeds back into sorting.

use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::media::{guess_mime, human_size, probe_audio, read_id3};
use crate::{Result, TaxisError};

const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "webp", "tiff", "bmp", "svg"];
const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "aac", "ogg", "m4a"];

/// Print detailed metadata for a file, or for every file under a
/// directory.
pub fn show_metadata(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(TaxisError::Config(format!("Path not found: {:?}", path)));
    }

    if path.is_file() {
        report_file(path)?;
        return Ok(());
    }

    let files: Vec<_> = WalkDir::new(path)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .collect();

    if files.is_empty() {
        println!("No files found in directory");
        return Ok(());
    }

    println!("Found {} files\n", files.len());
    for (i, entry) in files.iter().enumerate() {
        println!("=== File {}/{} ===", i + 1, files.len());
        report_file(entry.path())?;
        if i + 1 < files.len() {
            println!("{:-<70}", "");
        }
    }

    Ok(())
}

fn report_file(path: &Path) -> Result<()> {
    let meta = fs::metadata(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    println!("File Information:");
    println!(
        "  Filename:  {}",
        path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
    );
    println!("  Path:      {}", path.display());
    println!("  Size:      {} ({} bytes)", human_size(meta.len()), meta.len());
    println!("  Type:      {}", guess_mime(&ext));
    println!("  Extension: {}", if ext.is_empty() { "-" } else { ext.as_str() });
    println!("  Created:   {}", format_time(meta.created().ok()));
    println!("  Modified:  {}", format_time(meta.modified().ok()));
    println!("  Accessed:  {}", format_time(meta.accessed().ok()));

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        match image::image_dimensions(path) {
            Ok((width, height)) => {
                println!("Image Properties:");
                println!("  Dimensions: {}x{}", width, height);
            }
            Err(e) => println!("Image Properties: unreadable ({})", e),
        }
    }

    if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        if let Some(props) = probe_audio(path) {
            println!("Audio Properties:");
            println!("  Duration:    {}", props.duration_display());
            println!(
                "  Sample rate: {}",
                props
                    .sample_rate
                    .map(|r| format!("{}Hz", r))
                    .unwrap_or_else(|| "unknown".to_string())
            );
            println!("  Channels:    {}", props.channels_display());
        }
        if ext == "mp3" {
            if let Some(tags) = read_id3(path) {
                println!("ID3 Tags:");
                println!("  Title:  {}", tags.title.as_deref().unwrap_or("Unknown"));
                println!("  Artist: {}", tags.artist.as_deref().unwrap_or("Unknown"));
                println!("  Album:  {}", tags.album.as_deref().unwrap_or("Unknown"));
                println!(
                    "  Year:   {}",
                    tags.year.map(|y| y.to_string()).unwrap_or_else(|| "Unknown".to_string())
                );
                println!("  Genre:  {}", tags.genre.as_deref().unwrap_or("Unknown"));
            }
        }
    }

    Ok(())
}

fn format_time(time: Option<SystemTime>) -> String {
    match time {
        Some(t) => DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "unknown".to_string(),
    }
}
