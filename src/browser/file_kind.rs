//! File-type classification by extension and size formatting for listings.

use serde::Serialize;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "ico"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv", "flv", "wmv"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac"];
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "xml", "csv", "log", "js", "ts", "css", "html",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Text,
    /// Anything else; rendered with a generic glyph.
    Other,
}

impl FileKind {
    /// Classify a key or file name by its lowercased extension.
    pub fn of(name: &str) -> FileKind {
        let ext = extension(name);
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            FileKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            FileKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            FileKind::Audio
        } else if TEXT_EXTENSIONS.contains(&ext) {
            FileKind::Text
        } else {
            FileKind::Other
        }
    }

    pub fn is_image(name: &str) -> bool {
        FileKind::of(name) == FileKind::Image
    }

    pub fn is_video(name: &str) -> bool {
        FileKind::of(name) == FileKind::Video
    }

    /// Short label used by the console listing.
    pub fn label(self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Text => "text",
            FileKind::Other => "file",
        }
    }
}

fn extension(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or(base)
        .to_ascii_lowercase()
}

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size with binary units and at most two decimals,
/// e.g. `1536` -> `1.5 KB`.
pub fn format_size(bytes: i64) -> String {
    if bytes <= 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}
