// Multipart form decoding

use bytes::Bytes;
use futures_util::stream;
use multer::{Constraints, Multipart, SizeLimit};
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;

use super::upload::TempUpload;
use super::IngestError;

/// Name of the file part carrying the product image
pub const IMAGE_FIELD: &str = "image";

/// Decoded form: text fields by name plus the image upload, if any
#[derive(Debug, Default)]
pub struct RawForm {
    pub fields: HashMap<String, Vec<String>>,
    pub upload: Option<TempUpload>,
}

impl RawForm {
    /// Remove any temporary upload still held by this form
    pub async fn discard(mut self) {
        if let Some(upload) = self.upload.take() {
            upload.discard().await;
        }
    }
}

/// Decode a `multipart/form-data` body.
///
/// Text parts are collected by name. The first non-empty file part named
/// `image` is streamed to `temp_dir`; other file parts are skipped.
pub async fn read_multipart(
    content_type: Option<&str>,
    body: Bytes,
    limit: u64,
    temp_dir: &Path,
) -> Result<RawForm, IngestError> {
    let boundary = content_type
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(IngestError::NotMultipart)?;

    let body = stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
    let mut multipart = Multipart::with_constraints(body, boundary, constraints);

    let mut form = RawForm::default();
    match collect_parts(&mut multipart, &mut form, temp_dir).await {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard().await;
            Err(e)
        }
    }
}

async fn collect_parts(
    multipart: &mut Multipart<'_>,
    form: &mut RawForm,
    temp_dir: &Path,
) -> Result<(), IngestError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(IngestError::from_multer)?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name() {
            if name == IMAGE_FIELD && form.upload.is_none() {
                let original = Some(file_name.to_string()).filter(|n| !n.is_empty());
                form.upload = TempUpload::receive(&mut field, temp_dir, original).await?;
            }
            continue;
        }

        let value = field.text().await.map_err(IngestError::from_multer)?;
        form.fields.entry(name).or_default().push(value);
    }
    Ok(())
}
