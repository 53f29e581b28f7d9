//! Personal to-do list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::db::schemas::{to_chrono, TodoDoc};
use crate::db::{Store, TodoPatch};
use crate::types::{LingoError, LooseInt, Result};

#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoRequest {
    pub text: Option<String>,
    pub deadline: Option<String>,
}

/// Absent fields are left unchanged; `"deadline": null` clears the deadline
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub text: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub deadline: Option<Option<String>>,
    pub checked: Option<bool>,
}

/// Distinguish an explicit `null` from a missing field
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct ReorderItem {
    pub id: LooseInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoView {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub deadline: Option<String>,
    pub checked: bool,
    pub position: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&TodoDoc> for TodoView {
    fn from(todo: &TodoDoc) -> Self {
        Self {
            id: todo.id,
            user_id: todo.user_id,
            text: todo.text.clone(),
            deadline: todo.deadline.clone(),
            checked: todo.checked,
            position: todo.position,
            created_at: todo.metadata.created_at.map(to_chrono),
        }
    }
}

fn non_empty_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(LingoError::bad_request("Todo text is required"));
    }
    Ok(text.to_string())
}

pub async fn list(store: &dyn Store, user_id: i64) -> Result<Vec<TodoView>> {
    let todos = store.list_todos(user_id).await?;
    Ok(todos.iter().map(TodoView::from).collect())
}

/// Append a todo after the learner's last one
pub async fn create(store: &dyn Store, user_id: i64, request: CreateTodoRequest) -> Result<TodoView> {
    let text = non_empty_text(request.text.as_deref().unwrap_or_default())?;
    let deadline = request.deadline.filter(|d| !d.trim().is_empty());

    let position = store
        .max_todo_position(user_id)
        .await?
        .map_or(0, |last| last + 1);

    let todo = store
        .create_todo(TodoDoc::new(user_id, text, deadline, position))
        .await?;

    debug!(user_id, todo_id = todo.id, position, "Todo created");
    Ok(TodoView::from(&todo))
}

pub async fn update(
    store: &dyn Store,
    user_id: i64,
    todo_id: i64,
    request: UpdateTodoRequest,
) -> Result<TodoView> {
    let patch = TodoPatch {
        text: request.text.as_deref().map(non_empty_text).transpose()?,
        deadline: request.deadline,
        checked: request.checked,
    };

    let todo = if patch.is_empty() {
        store
            .list_todos(user_id)
            .await?
            .into_iter()
            .find(|t| t.id == todo_id)
    } else {
        store.update_todo(user_id, todo_id, patch).await?
    };

    todo.map(|t| TodoView::from(&t))
        .ok_or_else(|| LingoError::not_found("Todo not found"))
}

/// Set each listed todo's position to its index in `order`
pub async fn reorder(store: &dyn Store, user_id: i64, order: Vec<ReorderItem>) -> Result<()> {
    for (position, item) in order.iter().enumerate() {
        store
            .set_todo_position(user_id, item.id.get(), position as i64)
            .await?;
    }
    debug!(user_id, count = order.len(), "Todos reordered");
    Ok(())
}

pub async fn delete(store: &dyn Store, user_id: i64, todo_id: i64) -> Result<()> {
    let removed = store.delete_todo(user_id, todo_id).await?;
    debug!(user_id, todo_id, removed, "Todo delete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null_deadline() {
        let cleared: UpdateTodoRequest = serde_json::from_str(r#"{"deadline": null}"#).unwrap();
        assert_eq!(cleared.deadline, Some(None));

        let untouched: UpdateTodoRequest = serde_json::from_str(r#"{"checked": true}"#).unwrap();
        assert_eq!(untouched.deadline, None);

        let set: UpdateTodoRequest =
            serde_json::from_str(r#"{"deadline": "2024-06-01"}"#).unwrap();
        assert_eq!(set.deadline, Some(Some("2024-06-01".into())));
    }

    #[test]
    fn test_text_is_trimmed() {
        assert_eq!(non_empty_text("  Beli buku  ").unwrap(), "Beli buku");
        assert!(non_empty_text("   ").is_err());
    }
}
