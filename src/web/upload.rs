use std::path::Path;

use anyhow::Context;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::response::success;
use super::AppState;
use crate::auth::RequireUser;
use crate::error::{FeedError, FeedResult};

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Slack on top of `MAX_UPLOAD_SIZE` for multipart boundaries and headers.
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub url: String,
    pub filename: String,
}

/// Lower-cased extension of a client file name if it is an allowed image type.
fn image_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Storage name: content hash plus extension, so identical uploads share a file.
fn stored_name(bytes: &[u8], ext: &str) -> String {
    format!("{}.{ext}", hex::encode(Sha256::digest(bytes)))
}

fn multipart_error(err: &MultipartError, max_size: usize) -> FeedError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return FeedError::FileTooLarge(max_size);
    }
    debug!(error = %err.body_text(), "Rejected multipart body");
    FeedError::validation("Invalid multipart body")
}

async fn read_limited(mut field: Field<'_>, max_size: usize) -> FeedResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(&e, max_size))?
    {
        if bytes.len() + chunk.len() > max_size {
            return Err(FeedError::FileTooLarge(max_size));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// `POST /api/upload`: store the multipart field `image` under the upload
/// directory and return its public URL.
pub async fn upload_image(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    mut multipart: Multipart,
) -> FeedResult<Response> {
    let max_size = state.config.max_upload_size;

    let field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(&e, max_size))?
        {
            Some(field) if field.name() == Some("image") => break field,
            Some(_) => {}
            None => return Err(FeedError::validation("No file uploaded")),
        }
    };

    let file_name = field.file_name().unwrap_or_default().to_string();
    let ext = image_extension(&file_name).ok_or(FeedError::InvalidFileType)?;
    let bytes = read_limited(field, max_size).await?;
    if bytes.is_empty() {
        return Err(FeedError::validation("No file uploaded"));
    }

    let upload_dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(upload_dir)
        .await
        .with_context(|| format!("Failed to create upload directory: {}", upload_dir.display()))?;

    let filename = stored_name(&bytes, &ext);
    let path = upload_dir.join(&filename);
    let exists = tokio::fs::try_exists(&path)
        .await
        .with_context(|| format!("Failed to check upload: {}", path.display()))?;
    if exists {
        debug!(filename = %filename, "Upload already stored");
    } else {
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to save upload: {}", path.display()))?;
    }

    info!(
        user_id = viewer.id,
        filename = %filename,
        size_bytes = bytes.len(),
        "Image uploaded"
    );

    Ok(success(
        UploadedFile {
            url: format!("/uploads/{filename}"),
            filename,
        },
        "File uploaded successfully",
    ))
}
