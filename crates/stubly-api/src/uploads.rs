use std::path::Path as FsPath;

use axum::Json;
use axum::extract::State;
use axum::extract::multipart::Field;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::error;

use stubly_types::api::GetImageRequest;

use crate::auth::AppState;
use crate::error::ApiError;

/// Per-file cap, matching the 4 MB limit of the original upload middleware.
const MAX_IMAGE_BYTES: usize = 4_000_000;

const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif"];

/// Write one uploaded image into the upload directory and return its stored
/// file name (`{field}-{millis}.{ext}`). Files are staged before the event
/// transaction runs; a failed creation leaves the staged file behind, same
/// as the disk-first middleware this replaces.
pub async fn stage_image(field: Field<'_>, upload_dir: &FsPath) -> Result<String, ApiError> {
    let field_name = sanitize_field_name(field.name().unwrap_or("upload"));
    let original_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_owned).unwrap_or_default();

    let extension = FsPath::new(&original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) || !content_type.starts_with("image/") {
        return Err(ApiError::Validation("Error: Images Only!".to_string()));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read upload: {}", e)))?;
    if data.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::Validation(format!(
            "Uploaded file exceeds the {} byte limit",
            MAX_IMAGE_BYTES
        )));
    }

    let file_name = format!("{}-{}.{}", field_name, Utc::now().timestamp_millis(), extension);

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::Database(anyhow::anyhow!("Failed to create upload dir: {}", e)))?;
    tokio::fs::write(upload_dir.join(&file_name), &data)
        .await
        .map_err(|e| ApiError::Database(anyhow::anyhow!("Failed to write {}: {}", file_name, e)))?;

    Ok(file_name)
}

/// `guests[2][name]` → `Some((2, "name"))` for the given prefix.
pub fn indexed_field<'a>(name: &'a str, prefix: &str) -> Option<(usize, &'a str)> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('[')?;
    let (index, rest) = rest.split_once(']')?;
    let key = rest.strip_prefix('[')?.strip_suffix(']')?;
    Some((index.parse().ok()?, key))
}

/// `guests[3][photo]` → `Some(3)`; any other field shape is not a guest
/// photo.
pub fn guest_photo_index(name: &str) -> Option<usize> {
    match indexed_field(name, "guests") {
        Some((index, "photo")) => Some(index),
        _ => None,
    }
}

/// `photos[0]`, `photos[1]`, … carry the event image; the first one wins.
pub fn is_event_photo_field(name: &str) -> bool {
    name.strip_prefix("photos[")
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(|index| index.parse::<usize>().is_ok())
}

/// POST /get-image — serve a stored upload by the path the event payloads
/// reference. Only plain file names inside the upload directory resolve.
pub async fn get_image(
    State(state): State<AppState>,
    Json(req): Json<GetImageRequest>,
) -> Result<Response, ApiError> {
    let relative = req.image_path.trim().trim_start_matches('/');
    let relative = relative.strip_prefix("uploads/").unwrap_or(relative);

    // Stored names never contain separators; reject traversal attempts.
    if relative.is_empty() || relative.contains("..") || relative.contains('/') {
        return Err(ApiError::Validation("Invalid image path".to_string()));
    }

    let path = state.upload_dir.join(relative);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        error!("Failed to read image {}: {}", path.display(), e);
        ApiError::NotFound("Image not found".to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, content_type_for(relative))], bytes).into_response())
}

fn content_type_for(file_name: &str) -> &'static str {
    match FsPath::new(file_name).extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn sanitize_field_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '[' | ']' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
