//! Database schemas for LingoBee
//!
//! Document structures shared by every `Store` implementation. Integer `id`
//! fields are the public identifiers; MongoDB's `_id` never leaves the
//! database layer.

mod assignment;
mod dashboard;
mod practice;
mod todo;
mod user;

use bson::DateTime;
use serde::{Deserialize, Serialize};

pub use assignment::{
    AssignmentDoc, ClassCommentDoc, PrivateCommentDoc, SubmissionDoc, SubmissionStatus,
    ASSIGNMENT_COLLECTION, CLASS_COMMENT_COLLECTION, PRIVATE_COMMENT_COLLECTION,
    SUBMISSION_COLLECTION,
};
pub use dashboard::{MaterialDoc, NewsDoc, MATERIAL_COLLECTION, NEWS_COLLECTION};
pub use practice::{
    ActivityLogDoc, CompletedNodeDoc, NodeDoc, QuestionDoc, SectionDoc, ACTIVITY_COLLECTION,
    COMPLETED_NODE_COLLECTION, NODE_COLLECTION, QUESTION_COLLECTION, SECTION_COLLECTION,
};
pub use todo::{TodoDoc, TODO_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};

/// Creation/update timestamps carried by learner-written documents
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl Metadata {
    /// Metadata for a document created now
    pub fn now() -> Self {
        let now = DateTime::now();
        Self {
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(DateTime::now());
        if self.created_at.is_none() {
            self.created_at = self.updated_at;
        }
    }
}

/// Convert a stored timestamp for JSON responses
pub fn to_chrono(dt: DateTime) -> chrono::DateTime<chrono::Utc> {
    dt.to_chrono()
}
