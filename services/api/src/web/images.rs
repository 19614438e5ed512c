//! services/api/src/web/images.rs
//!
//! Serves lesson images from the configured directory. Responses carry a
//! wildcard `Access-Control-Allow-Origin` so any front end can embed them.

use crate::error::{ApiError, ErrorResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;
use tracing::debug;

fn content_type(file: &FsPath) -> &'static str {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Only plain relative paths below the image root are served.
fn is_contained(relative: &FsPath) -> bool {
    !relative.as_os_str().is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// GET /images/{path} - Fetch a lesson image
#[utoipa::path(
    get,
    path = "/images/{path}",
    tag = "images",
    params(("path" = String, Path, description = "Image path relative to the image directory")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn image_handler(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let not_found = || ApiError::NotFound("Image not found".to_string());

    let relative = PathBuf::from(&path);
    if !is_contained(&relative) {
        debug!("Rejected image path '{}'", path);
        return Err(not_found());
    }

    let file = state.config.images_path.join(&relative);
    match tokio::fs::metadata(&file).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            debug!("Image not found: {}", file.display());
            return Err(not_found());
        }
    }

    let bytes = tokio::fs::read(&file).await?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type(&file)),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        bytes,
    )
        .into_response())
}
