//! MongoDB implementation of [`Store`]

use async_trait::async_trait;
use bson::{doc, Bson, DateTime, Document};
use mongodb::options::ReturnDocument;
use tracing::debug;

use super::mongo::{Counters, MongoClient, MongoCollection};
use super::schemas::{
    ActivityLogDoc, AssignmentDoc, ClassCommentDoc, CompletedNodeDoc, MaterialDoc, NewsDoc,
    NodeDoc, PrivateCommentDoc, QuestionDoc, SectionDoc, SubmissionDoc, SubmissionStatus, TodoDoc,
    UserDoc, ACTIVITY_COLLECTION, ASSIGNMENT_COLLECTION, CLASS_COMMENT_COLLECTION,
    COMPLETED_NODE_COLLECTION, MATERIAL_COLLECTION, NEWS_COLLECTION, NODE_COLLECTION,
    PRIVATE_COMMENT_COLLECTION, QUESTION_COLLECTION, SECTION_COLLECTION, SUBMISSION_COLLECTION,
    TODO_COLLECTION, USER_COLLECTION,
};
use super::store::{CatalogDocs, MaterialFilter, Store, TodoPatch};
use crate::types::Result;

const USER_SEQ: &str = "users";
const TODO_SEQ: &str = "todos";
const SUBMISSION_SEQ: &str = "submissions";
const COMMENT_SEQ: &str = "comments";

/// Escape regex metacharacters so user input matches literally
fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn material_query(filter: &MaterialFilter) -> Document {
    let mut query = doc! { "is_active": true };
    if let Some(chapter) = &filter.chapter {
        query.insert("chapter", chapter.as_str());
    }
    if let Some(category) = &filter.category {
        query.insert("category", category.as_str());
    }
    if let Some(search) = &filter.search {
        query.insert(
            "title",
            doc! { "$regex": escape_regex(search), "$options": "i" },
        );
    }
    query
}

fn patch_update(patch: &TodoPatch) -> Document {
    let mut set = doc! { "metadata.updated_at": DateTime::now() };
    if let Some(text) = &patch.text {
        set.insert("text", text.as_str());
    }
    if let Some(deadline) = &patch.deadline {
        set.insert(
            "deadline",
            deadline.as_ref().map_or(Bson::Null, |d| Bson::String(d.clone())),
        );
    }
    if let Some(checked) = patch.checked {
        set.insert("checked", checked);
    }
    doc! { "$set": set }
}

pub struct MongoStore {
    db_name: String,
    counters: Counters,
    users: MongoCollection<UserDoc>,
    sections: MongoCollection<SectionDoc>,
    nodes: MongoCollection<NodeDoc>,
    questions: MongoCollection<QuestionDoc>,
    completions: MongoCollection<CompletedNodeDoc>,
    activity: MongoCollection<ActivityLogDoc>,
    todos: MongoCollection<TodoDoc>,
    assignments: MongoCollection<AssignmentDoc>,
    submissions: MongoCollection<SubmissionDoc>,
    class_comments: MongoCollection<ClassCommentDoc>,
    private_comments: MongoCollection<PrivateCommentDoc>,
    news: MongoCollection<NewsDoc>,
    materials: MongoCollection<MaterialDoc>,
}

impl MongoStore {
    /// Open every collection, creating indexes as needed
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            db_name: client.db_name().to_string(),
            counters: client.counters(),
            users: client.collection(USER_COLLECTION).await?,
            sections: client.collection(SECTION_COLLECTION).await?,
            nodes: client.collection(NODE_COLLECTION).await?,
            questions: client.collection(QUESTION_COLLECTION).await?,
            completions: client.collection(COMPLETED_NODE_COLLECTION).await?,
            activity: client.collection(ACTIVITY_COLLECTION).await?,
            todos: client.collection(TODO_COLLECTION).await?,
            assignments: client.collection(ASSIGNMENT_COLLECTION).await?,
            submissions: client.collection(SUBMISSION_COLLECTION).await?,
            class_comments: client.collection(CLASS_COMMENT_COLLECTION).await?,
            private_comments: client.collection(PRIVATE_COMMENT_COLLECTION).await?,
            news: client.collection(NEWS_COLLECTION).await?,
            materials: client.collection(MATERIAL_COLLECTION).await?,
        })
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

#[async_trait]
impl Store for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn create_user(&self, mut user: UserDoc) -> Result<UserDoc> {
        user.id = self.counters.next_id(USER_SEQ).await?;
        user.metadata.touch();
        self.users.insert_one(&user).await?;
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "id": id }).await
    }

    async fn find_user_by_nim(&self, nim: &str) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "nim": nim }).await
    }

    async fn increment_xp(&self, user_id: i64, amount: i64) -> Result<Option<UserDoc>> {
        self.users
            .find_one_and_update(
                doc! { "id": user_id },
                doc! {
                    "$inc": { "xp": amount },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
                ReturnDocument::Before,
            )
            .await
    }

    async fn raise_level(&self, user_id: i64, level: i64) -> Result<Option<UserDoc>> {
        self.users
            .find_one_and_update(
                doc! { "id": user_id },
                doc! { "$max": { "level": level } },
                ReturnDocument::After,
            )
            .await
    }

    async fn list_sections(&self) -> Result<Vec<SectionDoc>> {
        self.sections
            .find_sorted(doc! {}, doc! { "order_index": 1 })
            .await
    }

    async fn list_nodes(&self) -> Result<Vec<NodeDoc>> {
        self.nodes
            .find_sorted(doc! {}, doc! { "order_index": 1 })
            .await
    }

    async fn find_node(&self, node_id: i64) -> Result<Option<NodeDoc>> {
        self.nodes.find_one(doc! { "id": node_id }).await
    }

    async fn list_questions(&self, section_id: i64, node_id: i64) -> Result<Vec<QuestionDoc>> {
        self.questions
            .find_sorted(
                doc! { "section_id": section_id, "node_id": node_id },
                doc! { "order_index": 1 },
            )
            .await
    }

    async fn import_catalog(&self, catalog: CatalogDocs) -> Result<()> {
        for section in &catalog.sections {
            self.sections.upsert_one(doc! { "id": section.id }, section).await?;
        }
        for node in &catalog.nodes {
            self.nodes.upsert_one(doc! { "id": node.id }, node).await?;
        }
        for question in &catalog.questions {
            self.questions.upsert_one(doc! { "id": question.id }, question).await?;
        }
        for news in &catalog.news {
            self.news.upsert_one(doc! { "id": news.id }, news).await?;
        }
        for material in &catalog.materials {
            self.materials.upsert_one(doc! { "id": material.id }, material).await?;
        }
        for assignment in &catalog.assignments {
            self.assignments
                .upsert_one(doc! { "id": assignment.id }, assignment)
                .await?;
        }
        debug!(
            sections = catalog.sections.len(),
            nodes = catalog.nodes.len(),
            questions = catalog.questions.len(),
            "Catalog upserted"
        );
        Ok(())
    }

    async fn list_completions(&self, user_id: i64) -> Result<Vec<CompletedNodeDoc>> {
        self.completions
            .find_sorted(doc! { "user_id": user_id }, doc! { "section_id": 1, "node_id": 1 })
            .await
    }

    async fn find_completion(
        &self,
        user_id: i64,
        section_id: i64,
        node_id: i64,
    ) -> Result<Option<CompletedNodeDoc>> {
        self.completions
            .find_one(doc! { "user_id": user_id, "section_id": section_id, "node_id": node_id })
            .await
    }

    async fn upsert_completion(&self, completion: CompletedNodeDoc) -> Result<()> {
        let filter = doc! {
            "user_id": completion.user_id,
            "section_id": completion.section_id,
            "node_id": completion.node_id,
        };
        // The replacement must not carry a foreign _id
        let completion = CompletedNodeDoc {
            _id: None,
            ..completion
        };
        self.completions.upsert_one(filter, &completion).await?;
        Ok(())
    }

    async fn delete_completion(&self, user_id: i64, section_id: i64, node_id: i64) -> Result<()> {
        self.completions
            .delete_one(doc! { "user_id": user_id, "section_id": section_id, "node_id": node_id })
            .await?;
        Ok(())
    }

    async fn count_completions(&self, user_id: i64) -> Result<u64> {
        self.completions.count(doc! { "user_id": user_id }).await
    }

    async fn log_activity(&self, entry: ActivityLogDoc) -> Result<()> {
        self.activity.insert_one(&entry).await
    }

    async fn list_todos(&self, user_id: i64) -> Result<Vec<TodoDoc>> {
        self.todos
            .find_sorted(doc! { "user_id": user_id }, doc! { "position": 1, "id": 1 })
            .await
    }

    async fn max_todo_position(&self, user_id: i64) -> Result<Option<i64>> {
        let last = self
            .todos
            .find_sorted(doc! { "user_id": user_id }, doc! { "position": -1 })
            .await?;
        Ok(last.first().map(|t| t.position))
    }

    async fn create_todo(&self, mut todo: TodoDoc) -> Result<TodoDoc> {
        todo.id = self.counters.next_id(TODO_SEQ).await?;
        todo.metadata.touch();
        self.todos.insert_one(&todo).await?;
        Ok(todo)
    }

    async fn update_todo(&self, user_id: i64, id: i64, patch: TodoPatch) -> Result<Option<TodoDoc>> {
        self.todos
            .find_one_and_update(
                doc! { "id": id, "user_id": user_id },
                patch_update(&patch),
                ReturnDocument::After,
            )
            .await
    }

    async fn set_todo_position(&self, user_id: i64, id: i64, position: i64) -> Result<()> {
        self.todos
            .update_one(
                doc! { "id": id, "user_id": user_id },
                doc! { "$set": { "position": position, "metadata.updated_at": DateTime::now() } },
            )
            .await?;
        Ok(())
    }

    async fn delete_todo(&self, user_id: i64, id: i64) -> Result<bool> {
        let result = self
            .todos
            .delete_one(doc! { "id": id, "user_id": user_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_active_assignments(&self) -> Result<Vec<AssignmentDoc>> {
        self.assignments
            .find_sorted(doc! { "status": "active" }, doc! { "due_date": 1, "id": 1 })
            .await
    }

    async fn find_assignment(&self, id: i64) -> Result<Option<AssignmentDoc>> {
        self.assignments.find_one(doc! { "id": id }).await
    }

    async fn list_submissions(&self, user_id: i64) -> Result<Vec<SubmissionDoc>> {
        self.submissions
            .find_sorted(doc! { "user_id": user_id }, doc! { "id": 1 })
            .await
    }

    async fn find_submission(
        &self,
        assignment_id: i64,
        user_id: i64,
    ) -> Result<Option<SubmissionDoc>> {
        self.submissions
            .find_one(doc! { "assignment_id": assignment_id, "user_id": user_id })
            .await
    }

    async fn find_submission_by_id(&self, id: i64) -> Result<Option<SubmissionDoc>> {
        self.submissions.find_one(doc! { "id": id }).await
    }

    async fn save_submission(&self, mut submission: SubmissionDoc) -> Result<SubmissionDoc> {
        if submission.id == 0 {
            submission.id = self.counters.next_id(SUBMISSION_SEQ).await?;
        }
        submission.metadata.touch();
        submission._id = None;
        self.submissions
            .upsert_one(
                doc! { "assignment_id": submission.assignment_id, "user_id": submission.user_id },
                &submission,
            )
            .await?;
        Ok(submission)
    }

    async fn count_graded_submissions(&self, user_id: i64) -> Result<u64> {
        self.submissions
            .count(doc! { "user_id": user_id, "status": SubmissionStatus::GRADED })
            .await
    }

    async fn add_class_comment(&self, mut comment: ClassCommentDoc) -> Result<ClassCommentDoc> {
        comment.id = self.counters.next_id(COMMENT_SEQ).await?;
        comment.metadata.touch();
        self.class_comments.insert_one(&comment).await?;
        Ok(comment)
    }

    async fn list_class_comments(&self, assignment_id: i64) -> Result<Vec<ClassCommentDoc>> {
        self.class_comments
            .find_sorted(
                doc! { "assignment_id": assignment_id },
                doc! { "metadata.created_at": -1, "id": -1 },
            )
            .await
    }

    async fn add_private_comment(
        &self,
        mut comment: PrivateCommentDoc,
    ) -> Result<PrivateCommentDoc> {
        comment.id = self.counters.next_id(COMMENT_SEQ).await?;
        comment.metadata.touch();
        self.private_comments.insert_one(&comment).await?;
        Ok(comment)
    }

    async fn list_private_comments(&self, submission_id: i64) -> Result<Vec<PrivateCommentDoc>> {
        self.private_comments
            .find_sorted(
                doc! { "submission_id": submission_id },
                doc! { "metadata.created_at": 1, "id": 1 },
            )
            .await
    }

    async fn list_active_news(&self) -> Result<Vec<NewsDoc>> {
        self.news
            .find_sorted(
                doc! { "is_active": true },
                doc! { "order_index": 1, "metadata.created_at": -1 },
            )
            .await
    }

    async fn list_materials(&self, filter: &MaterialFilter) -> Result<Vec<MaterialDoc>> {
        self.materials
            .find_sorted(material_query(filter), doc! { "date_published": -1 })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_regex() {
        assert_eq!(escape_regex("a.b*c"), "a\\.b\\*c");
        assert_eq!(escape_regex("plain"), "plain");
    }

    #[test]
    fn test_material_query() {
        let query = material_query(&MaterialFilter {
            chapter: Some("3".into()),
            category: None,
            search: Some("verb".into()),
        });
        assert_eq!(query.get_str("chapter").unwrap(), "3");
        assert!(query.get("category").is_none());
        assert_eq!(
            query.get_document("title").unwrap().get_str("$options").unwrap(),
            "i"
        );
    }

    #[test]
    fn test_patch_update_clears_deadline() {
        let update = patch_update(&TodoPatch {
            deadline: Some(None),
            ..Default::default()
        });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get("deadline"), Some(&Bson::Null));
        assert!(set.get("text").is_none());
    }
}
