//! Assignment, submission and comment documents

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::Metadata;
use crate::db::mongo::IntoIndexes;

pub const ASSIGNMENT_COLLECTION: &str = "assignments";
pub const SUBMISSION_COLLECTION: &str = "assignment_submissions";
pub const CLASS_COMMENT_COLLECTION: &str = "assignment_class_comments";
pub const PRIVATE_COMMENT_COLLECTION: &str = "assignment_private_comments";

fn unique_id_index() -> (Document, Option<IndexOptions>) {
    (
        doc! { "id": 1 },
        Some(
            IndexOptions::builder()
                .unique(true)
                .name("id_unique".to_string())
                .build(),
        ),
    )
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AssignmentDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: i64,
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub chapter: Option<String>,

    #[serde(default)]
    pub start_date: Option<DateTime>,

    #[serde(default)]
    pub due_date: Option<DateTime>,

    /// Only `active` assignments are listed
    pub status: String,

    #[serde(default)]
    pub points: Option<i64>,
}

impl IntoIndexes for AssignmentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![unique_id_index(), (doc! { "status": 1, "due_date": 1 }, None)]
    }
}

/// A learner's hand-in for an assignment; one per (assignment, user)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SubmissionDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: i64,
    pub assignment_id: i64,
    pub user_id: i64,

    /// Stored status, e.g. `turned_in`, `graded`, `returned`
    pub status: String,

    #[serde(default)]
    pub submission_file_url: Option<String>,

    #[serde(default)]
    pub submission_file_name: Option<String>,

    #[serde(default)]
    pub submission_text: Option<String>,

    #[serde(default)]
    pub grade: Option<i64>,

    #[serde(default)]
    pub submitted_at: Option<DateTime>,
}

impl SubmissionDoc {
    pub fn is_graded(&self) -> bool {
        self.status == SubmissionStatus::GRADED
    }
}

impl IntoIndexes for SubmissionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            unique_id_index(),
            (
                doc! { "assignment_id": 1, "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("assignment_user_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

/// Status of an assignment as the learner sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Assigned,
    Submitted,
    Graded,
    Returned,
    Other(String),
}

impl SubmissionStatus {
    pub const TURNED_IN: &'static str = "turned_in";
    pub const GRADED: &'static str = "graded";
    pub const RETURNED: &'static str = "returned";

    pub fn of(submission: Option<&SubmissionDoc>) -> Self {
        match submission.map(|s| s.status.as_str()) {
            None => Self::Assigned,
            Some(Self::TURNED_IN) => Self::Submitted,
            Some(Self::GRADED) => Self::Graded,
            Some(Self::RETURNED) => Self::Returned,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Assigned => "assigned",
            Self::Submitted => "submitted",
            Self::Graded => "graded",
            Self::Returned => "returned",
            Self::Other(raw) => raw,
        }
    }
}

/// Comment visible to the whole class
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClassCommentDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: i64,
    pub assignment_id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub author_nim: String,
    pub comment: String,
}

impl IntoIndexes for ClassCommentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![unique_id_index(), (doc! { "assignment_id": 1 }, None)]
    }
}

/// Comment on a single submission, between learner and teacher
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PrivateCommentDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: i64,
    pub submission_id: i64,
    pub user_id: i64,
    pub author_name: String,

    #[serde(default)]
    pub is_teacher: bool,

    pub comment: String,
}

impl IntoIndexes for PrivateCommentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![unique_id_index(), (doc! { "submission_id": 1 }, None)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(status: &str) -> SubmissionDoc {
        SubmissionDoc {
            _id: None,
            metadata: Metadata::default(),
            id: 1,
            assignment_id: 1,
            user_id: 1,
            status: status.into(),
            submission_file_url: None,
            submission_file_name: None,
            submission_text: None,
            grade: None,
            submitted_at: None,
        }
    }

    #[test]
    fn test_display_status_mapping() {
        assert_eq!(SubmissionStatus::of(None).as_str(), "assigned");
        assert_eq!(SubmissionStatus::of(Some(&submission("turned_in"))).as_str(), "submitted");
        assert_eq!(SubmissionStatus::of(Some(&submission("graded"))).as_str(), "graded");
        assert_eq!(SubmissionStatus::of(Some(&submission("returned"))).as_str(), "returned");
        assert_eq!(SubmissionStatus::of(Some(&submission("late"))).as_str(), "late");
    }

    #[test]
    fn test_is_graded() {
        assert!(submission("graded").is_graded());
        assert!(!submission("turned_in").is_graded());
    }
}
