// Uploaded image handling
// Streams an image part to a temporary file, then moves it into the public images directory

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::IngestError;
use crate::logger;

/// File name used when the client sent none
const FALLBACK_FILE_NAME: &str = "image.jpg";
const MAX_NAME_LEN: usize = 100;

/// An uploaded image waiting in the temporary directory
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    original_name: Option<String>,
    size: u64,
}

/// An image moved into the public images directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub file_name: String,
    pub path: PathBuf,
    /// URL relative to the static root, e.g. `images/product_...png`
    pub url: String,
}

impl TempUpload {
    /// Stream a file part into `temp_dir`.
    ///
    /// Returns `None` for an empty part (a file input left blank).
    pub async fn receive(
        field: &mut multer::Field<'_>,
        temp_dir: &Path,
        original_name: Option<String>,
    ) -> Result<Option<Self>, IngestError> {
        let path = temp_dir.join(format!("catalog-upload-{}.part", Uuid::new_v4().simple()));
        let mut file = fs::File::create(&path).await?;
        let mut size: u64 = 0;

        let written = async {
            while let Some(chunk) = field.chunk().await.map_err(IngestError::from_multer)? {
                size += chunk.len() as u64;
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok::<(), IngestError>(())
        }
        .await;
        drop(file);

        if let Err(e) = written {
            remove_quietly(&path).await;
            return Err(e);
        }
        if size == 0 {
            remove_quietly(&path).await;
            return Ok(None);
        }

        Ok(Some(Self {
            path,
            original_name,
            size,
        }))
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Move the upload into `images_dir` under a collision-resistant name.
    ///
    /// Falls back to copy-then-delete when a rename is not possible, e.g. when
    /// the temporary directory lives on another filesystem.
    pub async fn persist(self, images_dir: &Path) -> Result<SavedImage, IngestError> {
        let file_name = generate_file_name(self.original_name.as_deref());
        let target = images_dir.join(&file_name);

        if let Err(rename_err) = fs::rename(&self.path, &target).await {
            logger::log_warning(&format!(
                "Rename of '{}' failed ({rename_err}), copying instead",
                self.path.display()
            ));
            if let Err(copy_err) = fs::copy(&self.path, &target).await {
                remove_quietly(&self.path).await;
                return Err(IngestError::Io(copy_err));
            }
            remove_quietly(&self.path).await;
        }

        Ok(SavedImage {
            url: format!("images/{file_name}"),
            file_name,
            path: target,
        })
    }

    /// Drop the temporary file without keeping it
    pub async fn discard(self) {
        remove_quietly(&self.path).await;
    }
}

impl SavedImage {
    /// Delete the stored file, used when the product it belongs to is rejected
    pub async fn remove(&self) {
        remove_quietly(&self.path).await;
    }
}

/// `product_<millis>-<random>_<original name>`
///
/// The random component keeps concurrent uploads of the same file within the
/// same millisecond apart.
pub fn generate_file_name(original_name: Option<&str>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "product_{}-{}_{}",
        Utc::now().timestamp_millis(),
        &random[..8],
        sanitize_file_name(original_name.unwrap_or_default())
    )
}

/// Keep only the final path component and a conservative character set
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return FALLBACK_FILE_NAME.to_string();
    }
    if cleaned.len() <= MAX_NAME_LEN {
        return cleaned.to_string();
    }
    // Keep the extension when shortening
    match cleaned.rsplit_once('.') {
        Some((_, ext)) if ext.len() < 10 => {
            format!("{}.{ext}", &cleaned[..MAX_NAME_LEN - ext.len() - 1])
        }
        _ => cleaned[..MAX_NAME_LEN].to_string(),
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            logger::log_warning(&format!(
                "Failed to remove '{}': {e}",
                path.display()
            ));
        }
    }
}
