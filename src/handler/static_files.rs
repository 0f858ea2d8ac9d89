//! Static file serving module
//!
//! Serves the favicon, files under the public directory and uploaded images.

use hyper::StatusCode;
use std::path::{Component, Path};
use tokio::fs;

use crate::config::{AppState, ResourcesConfig};
use crate::error::AppError;
use crate::http::{self, mime, HttpResponse};
use crate::logger;

const FAVICON_FILE: &str = "favicon.ico";

/// Serve `<public>/favicon.ico`; an absent icon is a bodiless 404
pub async fn serve_favicon(state: &AppState) -> Result<HttpResponse, AppError> {
    match fs::read(state.public_dir.join(FAVICON_FILE)).await {
        Ok(data) => Ok(http::build_file_response(data, "image/x-icon")),
        Err(_) => Ok(http::build_empty_response(StatusCode::NOT_FOUND)),
    }
}

/// Serve `relative` (still percent-encoded) from under `root`
pub async fn serve_from(root: &Path, relative: &str) -> Result<HttpResponse, AppError> {
    match load_from_directory(root, relative).await {
        Some((content, content_type)) => Ok(http::build_file_response(content, content_type)),
        None => Err(AppError::Asset(format!("File not found: /{relative}"))),
    }
}

/// Load a file from `root`, refusing anything that resolves outside of it
pub async fn load_from_directory(root: &Path, relative: &str) -> Option<(Vec<u8>, &'static str)> {
    let decoded = urlencoding::decode(relative).ok()?;
    let relative_path = Path::new(decoded.as_ref());

    // Only plain segments: no `..`, no absolute paths, no drive prefixes
    if decoded.contains('\0')
        || !relative_path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        logger::log_warning(&format!("Path traversal attempt blocked: /{relative}"));
        return None;
    }

    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                root.display()
            ));
            return None;
        }
    };

    // File not found is common (404), no need to log it
    let file_canonical = fs::canonicalize(root.join(relative_path)).await.ok()?;
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: /{relative} -> {}",
            file_canonical.display()
        ));
        return None;
    }
    if !fs::metadata(&file_canonical).await.ok()?.is_file() {
        return None;
    }

    let content = match fs::read(&file_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_canonical.display()
            ));
            return None;
        }
    };

    let content_type = mime::get_content_type(file_canonical.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}

/// Create the public and images directories if they are missing
pub async fn ensure_public_dirs(resources: &ResourcesConfig) -> std::io::Result<()> {
    fs::create_dir_all(&resources.public_dir).await?;
    fs::create_dir_all(resources.images_dir()).await
}
