use std::fs::Metadata;
use std::time::SystemTime;

use chrono::{DateTime, Local};

const SIZE_UNITS: [&str; 6] = ["kB", "MB", "GB", "TB", "PB", "EB"];

/// Decimal (SI) human-readable size: `"11 Bytes"`, `"1.5 kB"`, `"3.2 GB"`.
pub fn human_size(bytes: u64) -> String {
    if bytes == 1 {
        return "1 Byte".to_owned();
    }
    if bytes < 1000 {
        return format!("{bytes} Bytes");
    }

    let bytes = bytes as f64;
    let mut unit = 1000f64;
    for suffix in SIZE_UNITS {
        unit *= 1000.0;
        if bytes < unit {
            return format!("{:.1} {suffix}", bytes * 1000.0 / unit);
        }
    }

    format!("{:.1} {}", bytes * 1000.0 / unit, SIZE_UNITS[SIZE_UNITS.len() - 1])
}

/// Local wall-clock time in ISO-8601 form without an offset.
pub fn iso_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

pub fn modified_time(metadata: &Metadata) -> SystemTime {
    metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH)
}

pub fn created_time(metadata: &Metadata) -> SystemTime {
    metadata
        .created()
        .unwrap_or_else(|_| modified_time(metadata))
}

#[cfg(unix)]
pub fn permission_bits(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
pub fn permission_bits(metadata: &Metadata) -> String {
    if metadata.permissions().readonly() {
        "444".to_owned()
    } else {
        "666".to_owned()
    }
}

pub const DIRECTORY_MIME: &str = "inode/directory";
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Guesses a mime type from a lowercased extension without the leading dot.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "txt" | "text" | "log" | "conf" | "cfg" | "ini" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "js" | "mjs" => "text/javascript",
        "py" => "text/x-python",
        "rs" => "text/x-rust",
        "c" | "h" => "text/x-c",
        "cpp" | "cc" | "cxx" | "hpp" => "text/x-c++",
        "java" => "text/x-java",
        "go" => "text/x-go",
        "sh" => "application/x-sh",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "toml" => "application/toml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "tar" => "application/x-tar",
        "bz2" => "application/x-bzip2",
        "7z" => "application/x-7z-compressed",
        "wasm" => "application/wasm",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/vnd.microsoft.icon",
        "tif" | "tiff" => "image/tiff",
        "mp3" => "audio/mpeg",
        "wav" => "audio/x-wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        _ => FALLBACK_MIME,
    }
}
