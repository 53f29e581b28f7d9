//! Assignment routes: listing, submissions, comments and uploads

use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

use super::http_util::{
    authenticate, header_str, parse_json_body, path_id, read_body_limited, success, BoxBody,
};
use crate::server::AppState;
use crate::services::assignments::{
    self, ClassCommentRequest, MarkDoneRequest, PrivateCommentRequest, SubmitRequest,
    UploadUrlRequest,
};
use crate::storage::MAX_UPLOAD_BYTES;
use crate::types::{LingoError, Result};

/// Header carrying the original file name of a raw upload
pub const FILE_NAME_HEADER: &str = "x-file-name";

/// GET /api/assignments
pub async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let items = assignments::list(state.store.as_ref(), caller.id).await?;
    Ok(success(StatusCode::OK, json!({ "assignments": items })))
}

/// GET /api/assignments/{id}
pub async fn handle_details(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let assignment_id = path_id(id, "Invalid assignment ID")?;

    let details = assignments::details(state.store.as_ref(), caller.id, assignment_id).await?;
    Ok(success(
        StatusCode::OK,
        json!({
            "assignment": details.assignment,
            "submission": details.submission,
            "classComments": details.class_comments,
            "privateComments": details.private_comments,
        }),
    ))
}

/// POST /api/assignments/submit
pub async fn handle_submit(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let request: SubmitRequest = parse_json_body(req.into_body()).await?;

    let submission = assignments::submit(state.store.as_ref(), caller.id, request).await?;
    Ok(success(
        StatusCode::OK,
        json!({
            "message": "Assignment submitted successfully!",
            "submission": submission,
        }),
    ))
}

/// POST /api/assignments/mark-done
pub async fn handle_mark_done(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let request: MarkDoneRequest = parse_json_body(req.into_body()).await?;

    assignments::mark_done(state.store.as_ref(), caller.id, request).await?;
    Ok(success(
        StatusCode::OK,
        json!({ "message": "Assignment marked as done!" }),
    ))
}

/// POST /api/assignments/class-comment
pub async fn handle_class_comment(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let request: ClassCommentRequest = parse_json_body(req.into_body()).await?;

    let comment = assignments::add_class_comment(state.store.as_ref(), caller.id, request).await?;
    Ok(success(
        StatusCode::CREATED,
        json!({ "message": "Comment added successfully!", "comment": comment }),
    ))
}

/// POST /api/assignments/private-comment
pub async fn handle_private_comment(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let request: PrivateCommentRequest = parse_json_body(req.into_body()).await?;

    let comment = assignments::add_private_comment(state.store.as_ref(), caller.id, request).await?;
    Ok(success(
        StatusCode::CREATED,
        json!({ "message": "Private comment added successfully!", "comment": comment }),
    ))
}

/// POST /api/assignments/upload-url
pub async fn handle_upload_url(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let request: UploadUrlRequest = parse_json_body(req.into_body()).await?;

    let target = assignments::upload_target(caller.id, request)?;
    Ok(success(
        StatusCode::OK,
        json!({
            "filePath": target.file_path,
            "bucketName": target.bucket_name,
            "userId": target.user_id,
        }),
    ))
}

/// POST /api/assignments/upload
///
/// The body is the raw file. `X-File-Name` carries the percent-encoded
/// original name and `Content-Type` its mime type.
pub async fn handle_upload(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;

    let file_name = header_str(req.headers(), FILE_NAME_HEADER)
        .map(|raw| {
            urlencoding::decode(raw)
                .map(|name| name.into_owned())
                .map_err(|_| LingoError::bad_request("Invalid file name encoding"))
        })
        .transpose()?;
    let content_type = header_str(req.headers(), CONTENT_TYPE.as_str()).map(str::to_string);

    let declared = header_str(req.headers(), "content-length").and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > MAX_UPLOAD_BYTES) {
        return Err(LingoError::PayloadTooLarge(
            "File too large. Maximum size is 10MB".into(),
        ));
    }

    let data = read_body_limited(req.into_body(), MAX_UPLOAD_BYTES)
        .await
        .map_err(|e| match e {
            LingoError::PayloadTooLarge(_) => {
                LingoError::PayloadTooLarge("File too large. Maximum size is 10MB".into())
            }
            other => other,
        })?;

    let uploaded = assignments::upload(
        &state.files,
        caller.id,
        file_name.as_deref(),
        content_type.as_deref(),
        &data,
    )
    .await?;

    Ok(success(
        StatusCode::OK,
        json!({
            "fileUrl": uploaded.file_url,
            "fileName": uploaded.file_name,
            "filePath": uploaded.file_path,
            "fileSize": uploaded.file_size,
            "message": "File uploaded successfully",
        }),
    ))
}
