//! Content-type detection for files served from disk.

use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guesses a MIME type from the file extension.
///
/// # Example
///
/// ```
/// # use tinyweb::http::mime::detect;
/// assert_eq!(detect("site/index.HTML"), "text/html; charset=utf-8");
/// assert_eq!(detect("blob"), "application/octet-stream");
/// ```
pub fn detect(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(for_extension)
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

pub fn for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",

        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",

        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "wasm" => "application/wasm",
        _ => OCTET_STREAM,
    }
}
