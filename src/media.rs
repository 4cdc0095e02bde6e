// SPDX-License-Identifier: MIT

//! Media helpers: audio probing, MIME lookup, human-readable sizes
//!
//! Everything here produces descriptive values only; sorting decisions
//! never depend on the results beyond prompt text.

use std::path::Path;

use id3::TagLike;

/// Acoustic properties fed into the audio naming prompt.
#[derive(Debug, Default, Clone)]
pub struct AudioProps {
    pub duration_secs: Option<f64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
}

impl AudioProps {
    /// `3m 25s` style duration, or `unknown`.
    pub fn duration_display(&self) -> String {
        match self.duration_secs {
            Some(secs) => format!("{}m {}s", (secs / 60.0) as u64, (secs % 60.0) as u64),
            None => "unknown".to_string(),
        }
    }

    pub fn channels_display(&self) -> &'static str {
        match self.channels {
            Some(2) => "Stereo",
            Some(_) => "Mono",
            None => "unknown",
        }
    }
}

/// Probe an audio file for duration, sample rate and channel count.
/// Returns `None` when the container cannot be read or decoded.
pub fn probe_audio(path: &Path) -> Option<AudioProps> {
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = std::fs::File::open(path).ok()?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .ok()?;

    let mut props = AudioProps::default();
    if let Some(track) = probed.format.default_track() {
        props.sample_rate = track.codec_params.sample_rate;
        props.channels = track.codec_params.channels.map(|c| c.count());
        if let (Some(n_frames), Some(rate)) =
            (track.codec_params.n_frames, track.codec_params.sample_rate)
        {
            props.duration_secs = Some(n_frames as f64 / rate as f64);
        }
    }

    Some(props)
}

/// ID3 tag summary for MP3 files.
#[derive(Debug, Default)]
pub struct Id3Summary {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
}

pub fn read_id3(path: &Path) -> Option<Id3Summary> {
    let tag = id3::Tag::read_from_path(path).ok()?;
    Some(Id3Summary {
        title: tag.title().map(String::from),
        artist: tag.artist().map(String::from),
        album: tag.album().map(String::from),
        year: tag.year(),
        genre: tag.genre().map(String::from),
    })
}

/// MIME type for an image extension; `image/jpeg` when unrecognized.
pub fn image_mime(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
}

/// Best-effort MIME guess for the metadata reporter.
pub fn guess_mime(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" | "svg" => image_mime(ext),
        "tiff" | "tif" => "image/tiff",
        "mp4" => "video/mp4",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "html" => "text/html",
        "css" => "text/css",
        "json" => "application/json",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        _ => "unknown",
    }
}

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable byte count (`1.50 MB`).
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}
