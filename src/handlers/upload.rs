//! Multipart upload helper

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::{AppError, AppResult};

/// Form field carrying the CSV
const FILE_FIELD: &str = "file";

/// Pull the bytes of the `file` field, skipping any other fields
pub async fn read_file_field(multipart: &mut Multipart) -> AppResult<Bytes> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let file_name = field.file_name().unwrap_or("upload.csv").to_string();
            let bytes = field.bytes().await?;
            tracing::info!("Received {} ({} bytes)", file_name, bytes.len());
            return Ok(bytes);
        }
    }
    Err(AppError::NoFileUploaded)
}
