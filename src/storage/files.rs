//! Local file storage for assignment uploads
//!
//! Files live under `{root}/{userId}/{millis}_{name}` and are served back
//! at `{public_url}/files/{path}`.

use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::types::{LingoError, Result};

/// Bucket name reported to clients
pub const BUCKET_NAME: &str = "assignment-files";

/// Maximum upload size (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "image/jpeg",
    "image/png",
    "image/jpg",
];

/// Replace anything outside `[a-zA-Z0-9.-]` with `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Storage path for a learner's upload
pub fn storage_path(user_id: i64, millis: i64, file_name: &str) -> String {
    format!("{}/{}_{}", user_id, millis, sanitize_file_name(file_name))
}

/// Mime type without parameters, lowercased
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Accept only the document and image types assignments allow
pub fn check_mime(content_type: Option<&str>) -> Result<String> {
    let mime = content_type.map(essence).unwrap_or_default();
    if ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        Ok(mime)
    } else {
        Err(LingoError::UnsupportedMedia(
            "Invalid file type. Only PDF, DOC, DOCX, XLS, XLSX, JPG, PNG allowed.".into(),
        ))
    }
}

/// Content type to serve a stored file with, from its extension
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Result of storing an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: String,
    pub url: String,
    pub size: u64,
}

pub struct FileStore {
    root_dir: PathBuf,
    public_url: String,
}

impl FileStore {
    /// Create a store rooted at `root_dir`, creating it if needed
    pub async fn new<P: AsRef<Path>>(root_dir: P, public_url: &str) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir).await?;

        info!(path = %root_dir.display(), "Initialized file store");

        Ok(Self {
            root_dir,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/files/{}", self.public_url, path)
    }

    /// Resolve a relative storage path, refusing anything that escapes the root
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root_dir.join(relative))
    }

    /// Write a new file; an existing file at `path` is never overwritten
    pub async fn store(&self, path: &str, data: &[u8]) -> Result<StoredFile> {
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(LingoError::PayloadTooLarge(
                "File too large. Maximum size is 10MB".into(),
            ));
        }

        let full_path = self
            .resolve(path)
            .ok_or_else(|| LingoError::bad_request("Invalid file path"))?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    LingoError::bad_request("A file with this name already exists")
                }
                _ => LingoError::from(e),
            })?;
        file.write_all(data).await?;
        file.flush().await?;

        debug!(path = %path, size = data.len(), "Stored upload");

        Ok(StoredFile {
            path: path.to_string(),
            url: self.public_url(path),
            size: data.len() as u64,
        })
    }

    /// Read a stored file; `None` when it does not exist
    pub async fn read(&self, path: &str) -> Result<Option<Bytes>> {
        let Some(full_path) = self.resolve(path) else {
            return Ok(None);
        };
        match fs::read(&full_path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
