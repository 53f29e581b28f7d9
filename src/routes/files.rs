//! Serves uploaded files at their public URL

use hyper::{Response, StatusCode};
use tracing::debug;

use super::http_util::{bytes_response, decode_path, BoxBody};
use crate::storage::{content_type_for, FileStore};
use crate::types::{LingoError, Result};

/// GET /files/{path}
pub async fn handle_file(files: &FileStore, segments: &[&str]) -> Result<Response<BoxBody>> {
    let path = decode_path(segments)?;
    let data = files
        .read(&path)
        .await?
        .ok_or_else(|| LingoError::not_found("File not found"))?;

    debug!(path = %path, size = data.len(), "Serving file");
    Ok(bytes_response(StatusCode::OK, content_type_for(&path), data))
}
