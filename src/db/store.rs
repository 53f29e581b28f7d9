//! Persistence gateway
//!
//! Services only talk to storage through [`Store`], so the same code runs
//! against MongoDB in production and [`MemoryStore`](super::MemoryStore) in
//! dev mode and tests.

use async_trait::async_trait;

use super::schemas::{
    ActivityLogDoc, AssignmentDoc, ClassCommentDoc, CompletedNodeDoc, MaterialDoc, NewsDoc,
    NodeDoc, PrivateCommentDoc, QuestionDoc, SectionDoc, SubmissionDoc, TodoDoc, UserDoc,
};
use crate::types::Result;

/// Partial update of a todo; `None` leaves the field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPatch {
    pub text: Option<String>,
    /// `Some(None)` clears the deadline
    pub deadline: Option<Option<String>>,
    pub checked: Option<bool>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.deadline.is_none() && self.checked.is_none()
    }

    pub fn apply(&self, todo: &mut TodoDoc) {
        if let Some(text) = &self.text {
            todo.text = text.clone();
        }
        if let Some(deadline) = &self.deadline {
            todo.deadline = deadline.clone();
        }
        if let Some(checked) = self.checked {
            todo.checked = checked;
        }
    }
}

/// Filters for the learning material listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialFilter {
    pub chapter: Option<String>,
    pub category: Option<String>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
}

impl MaterialFilter {
    pub fn matches(&self, material: &MaterialDoc) -> bool {
        if !material.is_active {
            return false;
        }
        if let Some(chapter) = &self.chapter {
            if material.chapter.as_ref() != Some(chapter) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if material.category.as_ref() != Some(category) {
                return false;
            }
        }
        match &self.search {
            Some(needle) => material
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Catalog content loaded from a seed file
#[derive(Debug, Clone, Default)]
pub struct CatalogDocs {
    pub sections: Vec<SectionDoc>,
    pub nodes: Vec<NodeDoc>,
    pub questions: Vec<QuestionDoc>,
    pub news: Vec<NewsDoc>,
    pub materials: Vec<MaterialDoc>,
    pub assignments: Vec<AssignmentDoc>,
}

/// Storage operations used by the services
///
/// Lists come back in the order the API presents them. Creating methods
/// assign the integer `id` and return the stored document.
#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name for logs and the health endpoint
    fn backend(&self) -> &'static str;

    // Users

    async fn create_user(&self, user: UserDoc) -> Result<UserDoc>;

    async fn find_user(&self, id: i64) -> Result<Option<UserDoc>>;

    async fn find_user_by_nim(&self, nim: &str) -> Result<Option<UserDoc>>;

    /// Atomically add `amount` to the user's XP; returns the user as it was
    /// before the increment
    async fn increment_xp(&self, user_id: i64, amount: i64) -> Result<Option<UserDoc>>;

    /// Raise the stored level to at least `level`, never lowering it;
    /// returns the updated user
    async fn raise_level(&self, user_id: i64, level: i64) -> Result<Option<UserDoc>>;

    // Practice catalog

    /// Sections by `order_index`
    async fn list_sections(&self) -> Result<Vec<SectionDoc>>;

    /// All nodes by `order_index`
    async fn list_nodes(&self) -> Result<Vec<NodeDoc>>;

    async fn find_node(&self, node_id: i64) -> Result<Option<NodeDoc>>;

    /// Questions of one node by `order_index`
    async fn list_questions(&self, section_id: i64, node_id: i64) -> Result<Vec<QuestionDoc>>;

    /// Insert or replace catalog content by id
    async fn import_catalog(&self, catalog: CatalogDocs) -> Result<()>;

    // Completions

    async fn list_completions(&self, user_id: i64) -> Result<Vec<CompletedNodeDoc>>;

    async fn find_completion(
        &self,
        user_id: i64,
        section_id: i64,
        node_id: i64,
    ) -> Result<Option<CompletedNodeDoc>>;

    /// Write the record keyed by (user, section, node), replacing any other
    async fn upsert_completion(&self, completion: CompletedNodeDoc) -> Result<()>;

    async fn delete_completion(&self, user_id: i64, section_id: i64, node_id: i64) -> Result<()>;

    async fn count_completions(&self, user_id: i64) -> Result<u64>;

    async fn log_activity(&self, entry: ActivityLogDoc) -> Result<()>;

    // Todos

    /// The user's todos by `position`
    async fn list_todos(&self, user_id: i64) -> Result<Vec<TodoDoc>>;

    async fn max_todo_position(&self, user_id: i64) -> Result<Option<i64>>;

    async fn create_todo(&self, todo: TodoDoc) -> Result<TodoDoc>;

    /// Returns `None` when the user has no todo with this id
    async fn update_todo(&self, user_id: i64, id: i64, patch: TodoPatch) -> Result<Option<TodoDoc>>;

    async fn set_todo_position(&self, user_id: i64, id: i64, position: i64) -> Result<()>;

    /// Returns whether a todo was removed
    async fn delete_todo(&self, user_id: i64, id: i64) -> Result<bool>;

    // Assignments

    /// Active assignments by due date, undated first
    async fn list_active_assignments(&self) -> Result<Vec<AssignmentDoc>>;

    async fn find_assignment(&self, id: i64) -> Result<Option<AssignmentDoc>>;

    async fn list_submissions(&self, user_id: i64) -> Result<Vec<SubmissionDoc>>;

    async fn find_submission(&self, assignment_id: i64, user_id: i64)
        -> Result<Option<SubmissionDoc>>;

    async fn find_submission_by_id(&self, id: i64) -> Result<Option<SubmissionDoc>>;

    /// Insert (when `id` is 0) or replace a submission
    async fn save_submission(&self, submission: SubmissionDoc) -> Result<SubmissionDoc>;

    async fn count_graded_submissions(&self, user_id: i64) -> Result<u64>;

    async fn add_class_comment(&self, comment: ClassCommentDoc) -> Result<ClassCommentDoc>;

    /// Newest first
    async fn list_class_comments(&self, assignment_id: i64) -> Result<Vec<ClassCommentDoc>>;

    async fn add_private_comment(&self, comment: PrivateCommentDoc) -> Result<PrivateCommentDoc>;

    /// Oldest first
    async fn list_private_comments(&self, submission_id: i64) -> Result<Vec<PrivateCommentDoc>>;

    // Dashboard

    /// Active news by `order_index`, then newest first
    async fn list_active_news(&self) -> Result<Vec<NewsDoc>>;

    /// Matching materials, newest published first
    async fn list_materials(&self, filter: &MaterialFilter) -> Result<Vec<MaterialDoc>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(title: &str, chapter: Option<&str>, active: bool) -> MaterialDoc {
        MaterialDoc {
            _id: None,
            metadata: Default::default(),
            id: 1,
            title: title.into(),
            description: None,
            content: None,
            chapter: chapter.map(str::to_string),
            category: Some("grammar".into()),
            level: None,
            thumbnail_url: None,
            content_url: None,
            date_published: None,
            is_active: active,
        }
    }

    #[test]
    fn test_material_filter() {
        let m = material("Past Tense Basics", Some("1"), true);

        assert!(MaterialFilter::default().matches(&m));
        assert!(MaterialFilter {
            search: Some("tense".into()),
            ..Default::default()
        }
        .matches(&m));
        assert!(!MaterialFilter {
            chapter: Some("2".into()),
            ..Default::default()
        }
        .matches(&m));
        assert!(!MaterialFilter {
            category: Some("vocabulary".into()),
            ..Default::default()
        }
        .matches(&m));
        assert!(!MaterialFilter::default().matches(&material("Hidden", None, false)));
    }

    #[test]
    fn test_todo_patch_apply() {
        let mut todo = TodoDoc::new(1, "Read chapter 2".into(), Some("2024-05-01".into()), 0);

        let patch = TodoPatch {
            checked: Some(true),
            deadline: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut todo);

        assert!(todo.checked);
        assert_eq!(todo.deadline, None);
        assert_eq!(todo.text, "Read chapter 2");
        assert!(TodoPatch::default().is_empty());
    }
}
