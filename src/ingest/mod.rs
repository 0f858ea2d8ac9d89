//! Product ingestion module
//!
//! Decodes a multipart product submission, normalizes and validates the text
//! fields, and moves the uploaded image into the public images directory.
//! Validation runs before the image is persisted so a rejected submission
//! leaves nothing behind.

mod form;
mod normalize;
mod upload;

use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logger;

use form::read_multipart;
use normalize::ProductFields;

pub use normalize::ValidationError;
pub use upload::SavedImage;

#[cfg(test)]
pub(crate) use form::tests as multipart_fixtures;

/// Failures while receiving a submission
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Expected a multipart/form-data body")]
    NotMultipart,
    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("Malformed form data: {0}")]
    Malformed(multer::Error),
    #[error("Failed to store uploaded image: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub(crate) fn from_multer(e: multer::Error) -> Self {
        match e {
            multer::Error::StreamSizeExceeded { limit }
            | multer::Error::FieldSizeExceeded { limit, .. } => Self::TooLarge { limit },
            other => Self::Malformed(other),
        }
    }
}

/// Why a submission was turned away
#[derive(Debug, Error)]
pub enum Rejection {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Failed(#[from] IngestError),
}

/// A validated submission whose image, if any, is already in place
#[derive(Debug)]
pub struct Submission {
    pub fields: ProductFields,
    pub image: Option<SavedImage>,
}

/// Receives product submissions for the create and update endpoints
#[derive(Debug, Clone)]
pub struct Ingestor {
    images_dir: PathBuf,
    temp_dir: PathBuf,
    max_body_size: u64,
}

impl Ingestor {
    pub const fn new(images_dir: PathBuf, temp_dir: PathBuf, max_body_size: u64) -> Self {
        Self {
            images_dir,
            temp_dir,
            max_body_size,
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Decode, normalize and validate a submission, then persist its image.
    pub async fn ingest(
        &self,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Submission, Rejection> {
        let form = read_multipart(content_type, body, self.max_body_size, &self.temp_dir).await?;
        let fields = match ProductFields::from_fields(&form.fields)
            .and_then(|fields| fields.validate().map(|()| fields))
        {
            Ok(fields) => fields,
            Err(e) => {
                form.discard().await;
                return Err(e.into());
            }
        };

        let image = match form.upload {
            Some(upload) => {
                let size = upload.size();
                let saved = upload.persist(&self.images_dir).await?;
                logger::log_info(&format!("Stored image {} ({size} bytes)", saved.file_name));
                Some(saved)
            }
            None => None,
        };
        Ok(Submission { fields, image })
    }
}
