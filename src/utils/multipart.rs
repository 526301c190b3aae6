use std::collections::HashMap;

use axum::extract::Multipart;
use tracing::error;

use crate::error::{AppError, AppResult};

pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub original_name: String,
    pub content_type: Option<String>,
}

/// Reads a multipart body expecting exactly one `file` field; any other
/// fields are returned as text key/value pairs.
pub async fn read_file_upload(
    mut multipart: Multipart,
) -> AppResult<(UploadedFile, HashMap<String, String>)> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut original_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        let msg = format!("invalid multipart data: {err}");
        error!(error = %err, "invalid multipart data");
        AppError::bad_request(msg)
    })? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                original_name = field.file_name().map(|n| n.to_string());
                content_type = field.content_type().map(|mime| mime.to_string());
                let data = field.bytes().await.map_err(|err| {
                    let msg = format!("failed to read file bytes: {err}");
                    error!(error = %err, "failed to read file bytes");
                    AppError::bad_request(msg)
                })?;
                file_bytes = Some(data.to_vec());
            }
            Some(other) => {
                let key = other.to_string();
                let value = field.text().await.map_err(|err| {
                    let msg = format!("invalid field {key}: {err}");
                    error!(error = %err, field = %key, "invalid multipart field");
                    AppError::bad_request(msg)
                })?;
                fields.insert(key, value);
            }
            None => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| AppError::bad_request("file field is required"))?;
    if bytes.is_empty() {
        return Err(AppError::bad_request("file field must not be empty"));
    }
    let original_name =
        original_name.ok_or_else(|| AppError::bad_request("filename is required"))?;

    let content_type = content_type.or_else(|| {
        mime_guess::from_path(&original_name)
            .first()
            .map(|mime| mime.to_string())
    });

    Ok((
        UploadedFile {
            bytes,
            original_name,
            content_type,
        },
        fields,
    ))
}

pub fn file_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
        _ => "bin",
    }
}
