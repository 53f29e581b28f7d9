//! In-process store for dev mode and tests
//!
//! Every operation takes the single lock once, so each call is atomic with
//! respect to the others just like a single-document MongoDB write.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::schemas::{
    ActivityLogDoc, AssignmentDoc, ClassCommentDoc, CompletedNodeDoc, MaterialDoc, Metadata,
    NewsDoc, NodeDoc, PrivateCommentDoc, QuestionDoc, SectionDoc, SubmissionDoc, TodoDoc, UserDoc,
};
use super::store::{CatalogDocs, MaterialFilter, Store, TodoPatch};
use crate::types::{LingoError, Result};

#[derive(Default)]
struct Tables {
    users: Vec<UserDoc>,
    sections: Vec<SectionDoc>,
    nodes: Vec<NodeDoc>,
    questions: Vec<QuestionDoc>,
    completions: Vec<CompletedNodeDoc>,
    activity: Vec<ActivityLogDoc>,
    todos: Vec<TodoDoc>,
    assignments: Vec<AssignmentDoc>,
    submissions: Vec<SubmissionDoc>,
    class_comments: Vec<ClassCommentDoc>,
    private_comments: Vec<PrivateCommentDoc>,
    news: Vec<NewsDoc>,
    materials: Vec<MaterialDoc>,
    next_user_id: i64,
    next_todo_id: i64,
    next_submission_id: i64,
    next_comment_id: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Replace the row with the same key or append it
fn upsert_by<T, K: PartialEq>(rows: &mut Vec<T>, row: T, key: impl Fn(&T) -> K) {
    let k = key(&row);
    match rows.iter_mut().find(|existing| key(existing) == k) {
        Some(existing) => *existing = row,
        None => rows.push(row),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_xp_updates: AtomicBool,
    fail_level_updates: AtomicBool,
    skip_level_updates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent XP increments fail with a database error
    pub fn fail_xp_updates(&self, fail: bool) {
        self.fail_xp_updates.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent level writes fail with a database error
    pub fn fail_level_updates(&self, fail: bool) {
        self.fail_level_updates.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent level writes match no user, as if it was removed
    pub fn skip_level_updates(&self, skip: bool) {
        self.skip_level_updates.store(skip, Ordering::SeqCst);
    }

    /// Number of activity entries written, for inspection in tests
    pub async fn activity_count(&self) -> usize {
        self.tables.read().await.activity.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_user(&self, mut user: UserDoc) -> Result<UserDoc> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.nim == user.nim) {
            return Err(LingoError::Database(format!(
                "duplicate key: nim {}",
                user.nim
            )));
        }
        user.id = next(&mut tables.next_user_id);
        user.metadata.touch();
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<UserDoc>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_nim(&self, nim: &str) -> Result<Option<UserDoc>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.nim == nim).cloned())
    }

    async fn increment_xp(&self, user_id: i64, amount: i64) -> Result<Option<UserDoc>> {
        if self.fail_xp_updates.load(Ordering::SeqCst) {
            return Err(LingoError::Database("XP update rejected".into()));
        }
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == user_id).map(|u| {
            let before = u.clone();
            u.xp += amount;
            u.metadata.touch();
            before
        }))
    }

    async fn raise_level(&self, user_id: i64, level: i64) -> Result<Option<UserDoc>> {
        if self.fail_level_updates.load(Ordering::SeqCst) {
            return Err(LingoError::Database("Level update rejected".into()));
        }
        if self.skip_level_updates.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == user_id).map(|u| {
            u.level = u.level.max(level);
            u.clone()
        }))
    }

    async fn list_sections(&self) -> Result<Vec<SectionDoc>> {
        let mut sections = self.tables.read().await.sections.clone();
        sections.sort_by_key(|s| s.order_index);
        Ok(sections)
    }

    async fn list_nodes(&self) -> Result<Vec<NodeDoc>> {
        let mut nodes = self.tables.read().await.nodes.clone();
        nodes.sort_by_key(|n| n.order_index);
        Ok(nodes)
    }

    async fn find_node(&self, node_id: i64) -> Result<Option<NodeDoc>> {
        let tables = self.tables.read().await;
        Ok(tables.nodes.iter().find(|n| n.id == node_id).cloned())
    }

    async fn list_questions(&self, section_id: i64, node_id: i64) -> Result<Vec<QuestionDoc>> {
        let tables = self.tables.read().await;
        let mut questions: Vec<QuestionDoc> = tables
            .questions
            .iter()
            .filter(|q| q.section_id == section_id && q.node_id == node_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.order_index);
        Ok(questions)
    }

    async fn import_catalog(&self, catalog: CatalogDocs) -> Result<()> {
        let mut tables = self.tables.write().await;
        for section in catalog.sections {
            upsert_by(&mut tables.sections, section, |s| s.id);
        }
        for node in catalog.nodes {
            upsert_by(&mut tables.nodes, node, |n| n.id);
        }
        for question in catalog.questions {
            upsert_by(&mut tables.questions, question, |q| q.id);
        }
        for news in catalog.news {
            upsert_by(&mut tables.news, news, |n| n.id);
        }
        for material in catalog.materials {
            upsert_by(&mut tables.materials, material, |m| m.id);
        }
        for assignment in catalog.assignments {
            upsert_by(&mut tables.assignments, assignment, |a| a.id);
        }
        Ok(())
    }

    async fn list_completions(&self, user_id: i64) -> Result<Vec<CompletedNodeDoc>> {
        let tables = self.tables.read().await;
        Ok(tables
            .completions
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_completion(
        &self,
        user_id: i64,
        section_id: i64,
        node_id: i64,
    ) -> Result<Option<CompletedNodeDoc>> {
        let tables = self.tables.read().await;
        Ok(tables
            .completions
            .iter()
            .find(|c| c.user_id == user_id && c.section_id == section_id && c.node_id == node_id)
            .cloned())
    }

    async fn upsert_completion(&self, completion: CompletedNodeDoc) -> Result<()> {
        let mut tables = self.tables.write().await;
        upsert_by(&mut tables.completions, completion, |c| {
            (c.user_id, c.section_id, c.node_id)
        });
        Ok(())
    }

    async fn delete_completion(&self, user_id: i64, section_id: i64, node_id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.completions.retain(|c| {
            !(c.user_id == user_id && c.section_id == section_id && c.node_id == node_id)
        });
        Ok(())
    }

    async fn count_completions(&self, user_id: i64) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables.completions.iter().filter(|c| c.user_id == user_id).count() as u64)
    }

    async fn log_activity(&self, entry: ActivityLogDoc) -> Result<()> {
        self.tables.write().await.activity.push(entry);
        Ok(())
    }

    async fn list_todos(&self, user_id: i64) -> Result<Vec<TodoDoc>> {
        let tables = self.tables.read().await;
        let mut todos: Vec<TodoDoc> = tables
            .todos
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        todos.sort_by_key(|t| (t.position, t.id));
        Ok(todos)
    }

    async fn max_todo_position(&self, user_id: i64) -> Result<Option<i64>> {
        let tables = self.tables.read().await;
        Ok(tables
            .todos
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.position)
            .max())
    }

    async fn create_todo(&self, mut todo: TodoDoc) -> Result<TodoDoc> {
        let mut tables = self.tables.write().await;
        todo.id = next(&mut tables.next_todo_id);
        todo.metadata.touch();
        tables.todos.push(todo.clone());
        Ok(todo)
    }

    async fn update_todo(&self, user_id: i64, id: i64, patch: TodoPatch) -> Result<Option<TodoDoc>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .todos
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
            .map(|todo| {
                patch.apply(todo);
                todo.metadata.touch();
                todo.clone()
            }))
    }

    async fn set_todo_position(&self, user_id: i64, id: i64, position: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(todo) = tables
            .todos
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
        {
            todo.position = position;
            todo.metadata.touch();
        }
        Ok(())
    }

    async fn delete_todo(&self, user_id: i64, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.todos.len();
        tables.todos.retain(|t| !(t.id == id && t.user_id == user_id));
        Ok(tables.todos.len() != before)
    }

    async fn list_active_assignments(&self) -> Result<Vec<AssignmentDoc>> {
        let tables = self.tables.read().await;
        let mut assignments: Vec<AssignmentDoc> = tables
            .assignments
            .iter()
            .filter(|a| a.status == "active")
            .cloned()
            .collect();
        assignments.sort_by_key(|a| (a.due_date, a.id));
        Ok(assignments)
    }

    async fn find_assignment(&self, id: i64) -> Result<Option<AssignmentDoc>> {
        let tables = self.tables.read().await;
        Ok(tables.assignments.iter().find(|a| a.id == id).cloned())
    }

    async fn list_submissions(&self, user_id: i64) -> Result<Vec<SubmissionDoc>> {
        let tables = self.tables.read().await;
        Ok(tables
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_submission(
        &self,
        assignment_id: i64,
        user_id: i64,
    ) -> Result<Option<SubmissionDoc>> {
        let tables = self.tables.read().await;
        Ok(tables
            .submissions
            .iter()
            .find(|s| s.assignment_id == assignment_id && s.user_id == user_id)
            .cloned())
    }

    async fn find_submission_by_id(&self, id: i64) -> Result<Option<SubmissionDoc>> {
        let tables = self.tables.read().await;
        Ok(tables.submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn save_submission(&self, mut submission: SubmissionDoc) -> Result<SubmissionDoc> {
        let mut tables = self.tables.write().await;
        if submission.id == 0 {
            submission.id = next(&mut tables.next_submission_id);
        }
        submission.metadata.touch();
        upsert_by(&mut tables.submissions, submission.clone(), |s| {
            (s.assignment_id, s.user_id)
        });
        Ok(submission)
    }

    async fn count_graded_submissions(&self, user_id: i64) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_graded())
            .count() as u64)
    }

    async fn add_class_comment(&self, mut comment: ClassCommentDoc) -> Result<ClassCommentDoc> {
        let mut tables = self.tables.write().await;
        comment.id = next(&mut tables.next_comment_id);
        comment.metadata = Metadata::now();
        tables.class_comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_class_comments(&self, assignment_id: i64) -> Result<Vec<ClassCommentDoc>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<ClassCommentDoc> = tables
            .class_comments
            .iter()
            .filter(|c| c.assignment_id == assignment_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| Reverse((c.metadata.created_at, c.id)));
        Ok(comments)
    }

    async fn add_private_comment(
        &self,
        mut comment: PrivateCommentDoc,
    ) -> Result<PrivateCommentDoc> {
        let mut tables = self.tables.write().await;
        comment.id = next(&mut tables.next_comment_id);
        comment.metadata = Metadata::now();
        tables.private_comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_private_comments(&self, submission_id: i64) -> Result<Vec<PrivateCommentDoc>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<PrivateCommentDoc> = tables
            .private_comments
            .iter()
            .filter(|c| c.submission_id == submission_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.metadata.created_at, c.id));
        Ok(comments)
    }

    async fn list_active_news(&self) -> Result<Vec<NewsDoc>> {
        let tables = self.tables.read().await;
        let mut news: Vec<NewsDoc> = tables.news.iter().filter(|n| n.is_active).cloned().collect();
        news.sort_by_key(|n| (n.order_index, Reverse(n.metadata.created_at)));
        Ok(news)
    }

    async fn list_materials(&self, filter: &MaterialFilter) -> Result<Vec<MaterialDoc>> {
        let tables = self.tables.read().await;
        let mut materials: Vec<MaterialDoc> = tables
            .materials
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        materials.sort_by_key(|m| Reverse(m.date_published));
        Ok(materials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_ids_and_duplicate_nim() {
        let store = MemoryStore::new();
        let first = store
            .create_user(UserDoc::new("Ana".into(), "001".into(), "hash".into()))
            .await
            .unwrap();
        let second = store
            .create_user(UserDoc::new("Budi".into(), "002".into(), "hash".into()))
            .await
            .unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        let dup = store
            .create_user(UserDoc::new("Ana".into(), "001".into(), "hash".into()))
            .await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_increment_returns_before_and_level_never_drops() {
        let store = MemoryStore::new();
        let user = store
            .create_user(UserDoc::new("Ana".into(), "001".into(), "hash".into()))
            .await
            .unwrap();

        let before = store.increment_xp(user.id, 30).await.unwrap().unwrap();
        assert_eq!(before.xp, 0);

        let after = store.raise_level(user.id, 3).await.unwrap().unwrap();
        assert_eq!((after.xp, after.level), (30, 3));

        let lowered = store.raise_level(user.id, 2).await.unwrap().unwrap();
        assert_eq!(lowered.level, 3);

        assert!(store.increment_xp(99, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_completion_upsert_keeps_one_record() {
        let store = MemoryStore::new();
        let record = |score| CompletedNodeDoc {
            _id: None,
            metadata: Metadata::now(),
            user_id: 1,
            section_id: 1,
            node_id: 2,
            xp_earned: 10,
            score,
            time_spent_seconds: 30,
        };

        store.upsert_completion(record(60)).await.unwrap();
        store.upsert_completion(record(90)).await.unwrap();

        let all = store.list_completions(1).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].score, 90);

        store.delete_completion(1, 1, 2).await.unwrap();
        assert_eq!(store.count_completions(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_todos_scoped_to_owner() {
        let store = MemoryStore::new();
        let todo = store
            .create_todo(TodoDoc::new(1, "Mine".into(), None, 0))
            .await
            .unwrap();

        let patch = TodoPatch {
            checked: Some(true),
            ..Default::default()
        };
        assert!(store.update_todo(2, todo.id, patch.clone()).await.unwrap().is_none());
        assert!(!store.delete_todo(2, todo.id).await.unwrap());

        let updated = store.update_todo(1, todo.id, patch).await.unwrap().unwrap();
        assert!(updated.checked);
        assert!(store.delete_todo(1, todo.id).await.unwrap());
    }
}
