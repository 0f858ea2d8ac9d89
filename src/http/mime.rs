//! MIME type detection module
//!
//! Returns the Content-Type for a file extension and classifies the
//! extensions the router treats as static assets.

/// Extensions served by the static-asset route
pub const STATIC_EXTENSIONS: [&str; 11] = [
    "html", "css", "js", "json", "png", "jpg", "jpeg", "gif", "webp", "svg", "ico",
];

/// Extensions served straight from the images directory
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Get MIME Content-Type based on file extension (case-insensitive).
/// Unknown or missing extensions map to `application/octet-stream`.
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    let extension = extension.map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",

        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",

        _ => "application/octet-stream",
    }
}

/// Extension of the last path segment, if any
pub fn extension_of(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}

pub fn is_static_extension(ext: &str) -> bool {
    STATIC_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}
