//! Assignments, submissions and comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::schemas::{
    to_chrono, AssignmentDoc, ClassCommentDoc, Metadata, PrivateCommentDoc, SubmissionDoc,
    SubmissionStatus,
};
use crate::db::Store;
use crate::storage::{check_mime, storage_path, FileStore, StoredFile, BUCKET_NAME};
use crate::types::{LingoError, LooseInt, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub assignment_id: Option<LooseInt>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub submission_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkDoneRequest {
    pub assignment_id: Option<LooseInt>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCommentRequest {
    pub assignment_id: Option<LooseInt>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateCommentRequest {
    pub submission_id: Option<LooseInt>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub chapter: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
    pub points: Option<i64>,
}

impl From<&AssignmentDoc> for AssignmentView {
    fn from(a: &AssignmentDoc) -> Self {
        Self {
            id: a.id,
            title: a.title.clone(),
            description: a.description.clone(),
            chapter: a.chapter.clone(),
            start_date: a.start_date.map(to_chrono),
            due_date: a.due_date.map(to_chrono),
            status: a.status.clone(),
            points: a.points,
        }
    }
}

/// An assignment merged with the caller's submission state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentListItem {
    #[serde(flatten)]
    pub assignment: AssignmentView,
    pub submission_status: String,
    pub submission_id: Option<i64>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub grade: Option<i64>,
    pub submission_file_url: Option<String>,
    pub submission_file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionView {
    pub id: i64,
    pub assignment_id: i64,
    pub user_id: i64,
    pub status: String,
    pub submission_file_url: Option<String>,
    pub submission_file_name: Option<String>,
    pub submission_text: Option<String>,
    pub grade: Option<i64>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl From<&SubmissionDoc> for SubmissionView {
    fn from(s: &SubmissionDoc) -> Self {
        Self {
            id: s.id,
            assignment_id: s.assignment_id,
            user_id: s.user_id,
            status: s.status.clone(),
            submission_file_url: s.submission_file_url.clone(),
            submission_file_name: s.submission_file_name.clone(),
            submission_text: s.submission_text.clone(),
            grade: s.grade,
            submitted_at: s.submitted_at.map(to_chrono),
        }
    }
}

/// Author shown next to a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentAuthor {
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nim: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_teacher: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub users: CommentAuthor,
}

impl From<&ClassCommentDoc> for CommentView {
    fn from(c: &ClassCommentDoc) -> Self {
        Self {
            id: c.id,
            comment: c.comment.clone(),
            is_teacher: None,
            created_at: c.metadata.created_at.map(to_chrono),
            users: CommentAuthor {
                full_name: c.author_name.clone(),
                nim: Some(c.author_nim.clone()),
            },
        }
    }
}

impl From<&PrivateCommentDoc> for CommentView {
    fn from(c: &PrivateCommentDoc) -> Self {
        Self {
            id: c.id,
            comment: c.comment.clone(),
            is_teacher: Some(c.is_teacher),
            created_at: c.metadata.created_at.map(to_chrono),
            users: CommentAuthor {
                full_name: c.author_name.clone(),
                nim: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetails {
    pub assignment: AssignmentView,
    pub submission: Option<SubmissionView>,
    pub class_comments: Vec<CommentView>,
    pub private_comments: Vec<CommentView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    pub file_path: String,
    pub bucket_name: &'static str,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub file_url: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
}

fn required_id(id: Option<LooseInt>, message: &str) -> Result<i64> {
    id.map(LooseInt::get)
        .filter(|id| *id > 0)
        .ok_or_else(|| LingoError::bad_request(message))
}

fn required_comment(comment: Option<String>, message: &str) -> Result<String> {
    let comment = comment.ok_or_else(|| LingoError::bad_request(message))?;
    let comment = comment.trim();
    if comment.is_empty() {
        return Err(LingoError::bad_request("Comment cannot be empty"));
    }
    Ok(comment.to_string())
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub async fn list(store: &dyn Store, user_id: i64) -> Result<Vec<AssignmentListItem>> {
    let assignments = store.list_active_assignments().await?;
    let submissions = store.list_submissions(user_id).await?;

    Ok(assignments
        .iter()
        .map(|assignment| {
            let submission = submissions.iter().find(|s| s.assignment_id == assignment.id);
            AssignmentListItem {
                assignment: AssignmentView::from(assignment),
                submission_status: SubmissionStatus::of(submission).as_str().to_string(),
                submission_id: submission.map(|s| s.id),
                submitted_at: submission.and_then(|s| s.submitted_at).map(to_chrono),
                grade: submission.and_then(|s| s.grade),
                submission_file_url: submission.and_then(|s| s.submission_file_url.clone()),
                submission_file_name: submission.and_then(|s| s.submission_file_name.clone()),
            }
        })
        .collect())
}

pub async fn details(store: &dyn Store, user_id: i64, assignment_id: i64) -> Result<AssignmentDetails> {
    let assignment = store
        .find_assignment(assignment_id)
        .await?
        .ok_or_else(|| LingoError::not_found("Assignment not found"))?;

    let submission = store.find_submission(assignment_id, user_id).await?;
    let class_comments = store.list_class_comments(assignment_id).await?;
    let private_comments = match &submission {
        Some(s) => store.list_private_comments(s.id).await?,
        None => Vec::new(),
    };

    Ok(AssignmentDetails {
        assignment: AssignmentView::from(&assignment),
        submission: submission.as_ref().map(SubmissionView::from),
        class_comments: class_comments.iter().map(CommentView::from).collect(),
        private_comments: private_comments.iter().map(CommentView::from).collect(),
    })
}

/// Find the caller's submission or start a new one, failing for unknown
/// assignments
async fn open_submission(
    store: &dyn Store,
    user_id: i64,
    assignment_id: i64,
) -> Result<SubmissionDoc> {
    if store.find_assignment(assignment_id).await?.is_none() {
        return Err(LingoError::not_found("Assignment not found"));
    }

    Ok(store
        .find_submission(assignment_id, user_id)
        .await?
        .unwrap_or_else(|| SubmissionDoc {
            _id: None,
            metadata: Metadata::now(),
            id: 0,
            assignment_id,
            user_id,
            status: SubmissionStatus::TURNED_IN.into(),
            submission_file_url: None,
            submission_file_name: None,
            submission_text: None,
            grade: None,
            submitted_at: None,
        }))
}

/// Turn in (or re-turn in) an assignment. Content fields left out of the
/// request keep their previous values.
pub async fn submit(store: &dyn Store, user_id: i64, request: SubmitRequest) -> Result<SubmissionView> {
    let assignment_id = required_id(request.assignment_id, "Assignment ID is required")?;
    let mut submission = open_submission(store, user_id, assignment_id).await?;

    submission.status = SubmissionStatus::TURNED_IN.into();
    submission.submitted_at = Some(bson::DateTime::now());
    if request.file_url.is_some() {
        submission.submission_file_url = request.file_url;
    }
    if request.file_name.is_some() {
        submission.submission_file_name = request.file_name;
    }
    if request.submission_text.is_some() {
        submission.submission_text = request.submission_text;
    }

    let saved = store.save_submission(submission).await?;
    info!(user_id, assignment_id, submission_id = saved.id, "Assignment submitted");
    Ok(SubmissionView::from(&saved))
}

pub async fn mark_done(store: &dyn Store, user_id: i64, request: MarkDoneRequest) -> Result<()> {
    let assignment_id = required_id(request.assignment_id, "Assignment ID is required")?;
    let mut submission = open_submission(store, user_id, assignment_id).await?;

    submission.status = SubmissionStatus::TURNED_IN.into();
    submission.submitted_at = Some(bson::DateTime::now());

    let saved = store.save_submission(submission).await?;
    info!(user_id, assignment_id, submission_id = saved.id, "Assignment marked done");
    Ok(())
}

pub async fn add_class_comment(
    store: &dyn Store,
    user_id: i64,
    request: ClassCommentRequest,
) -> Result<CommentView> {
    let missing = "Assignment ID and comment are required";
    let assignment_id = required_id(request.assignment_id, missing)?;
    let comment = required_comment(request.comment, missing)?;

    if store.find_assignment(assignment_id).await?.is_none() {
        return Err(LingoError::not_found("Assignment not found"));
    }
    let author = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| LingoError::not_found("User not found"))?;

    let saved = store
        .add_class_comment(ClassCommentDoc {
            _id: None,
            metadata: Metadata::now(),
            id: 0,
            assignment_id,
            user_id,
            author_name: author.full_name,
            author_nim: author.nim,
            comment,
        })
        .await?;

    Ok(CommentView::from(&saved))
}

/// Comment on one of the caller's own submissions
pub async fn add_private_comment(
    store: &dyn Store,
    user_id: i64,
    request: PrivateCommentRequest,
) -> Result<CommentView> {
    let missing = "Submission ID and comment are required";
    let submission_id = required_id(request.submission_id, missing)?;
    let comment = required_comment(request.comment, missing)?;

    let submission = store
        .find_submission_by_id(submission_id)
        .await?
        .filter(|s| s.user_id == user_id)
        .ok_or_else(|| LingoError::not_found("Submission not found"))?;
    let author = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| LingoError::not_found("User not found"))?;

    let saved = store
        .add_private_comment(PrivateCommentDoc {
            _id: None,
            metadata: Metadata::now(),
            id: 0,
            submission_id: submission.id,
            user_id,
            author_name: author.full_name,
            is_teacher: false,
            comment,
        })
        .await?;

    Ok(CommentView::from(&saved))
}

pub fn upload_target(user_id: i64, request: UploadUrlRequest) -> Result<UploadTarget> {
    let file_name = request
        .file_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| LingoError::bad_request("File name is required"))?;

    Ok(UploadTarget {
        file_path: storage_path(user_id, now_millis(), &file_name),
        bucket_name: BUCKET_NAME,
        user_id,
    })
}

/// Store an uploaded file under the caller's prefix
pub async fn upload(
    files: &FileStore,
    user_id: i64,
    file_name: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<UploadResult> {
    let file_name = file_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| LingoError::bad_request("No file uploaded"))?;
    if data.is_empty() {
        return Err(LingoError::bad_request("No file uploaded"));
    }
    check_mime(content_type)?;

    let path = storage_path(user_id, now_millis(), file_name);
    let StoredFile { path, url, size } = files.store(&path, data).await?;

    info!(user_id, path = %path, size, "File uploaded");

    Ok(UploadResult {
        file_url: url,
        file_name: file_name.to_string(),
        file_path: path,
        file_size: size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_target_sanitizes_name() {
        let target = upload_target(
            5,
            UploadUrlRequest {
                file_name: Some("tugas akhir.pdf".into()),
            },
        )
        .unwrap();
        assert!(target.file_path.starts_with("5/"));
        assert!(target.file_path.ends_with("_tugas_akhir.pdf"));
        assert_eq!(target.bucket_name, "assignment-files");

        assert!(upload_target(5, UploadUrlRequest::default()).is_err());
    }

    #[test]
    fn test_required_comment() {
        assert_eq!(required_comment(Some("  hi ".into()), "x").unwrap(), "hi");
        match required_comment(Some("   ".into()), "x") {
            Err(LingoError::BadRequest(msg)) => assert_eq!(msg, "Comment cannot be empty"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(required_comment(None, "x").is_err());
    }
}
