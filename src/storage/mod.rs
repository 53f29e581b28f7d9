//! Object storage for uploaded files

pub mod files;

pub use files::{
    check_mime, content_type_for, sanitize_file_name, storage_path, FileStore, StoredFile,
    ALLOWED_MIME_TYPES, BUCKET_NAME, MAX_UPLOAD_BYTES,
};
