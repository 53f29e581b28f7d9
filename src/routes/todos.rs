//! To-do list routes

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::http_util::{authenticate, parse_json_body, path_id, success, BoxBody};
use crate::server::AppState;
use crate::services::todos::{self, CreateTodoRequest, ReorderItem, UpdateTodoRequest};
use crate::types::{LingoError, Result};

#[derive(Debug, Default, Deserialize)]
struct ReorderRequest {
    todos: Option<Value>,
}

/// GET /api/todos
pub async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let todos = todos::list(state.store.as_ref(), caller.id).await?;
    Ok(success(StatusCode::OK, json!({ "todos": todos })))
}

/// POST /api/todos
pub async fn handle_create(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let request: CreateTodoRequest = parse_json_body(req.into_body()).await?;

    let todo = todos::create(state.store.as_ref(), caller.id, request).await?;
    Ok(success(
        StatusCode::CREATED,
        json!({ "message": "Todo created successfully", "todo": todo }),
    ))
}

/// PUT /api/todos/{id}
pub async fn handle_update(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let todo_id = path_id(id, "Invalid todo ID")?;
    let request: UpdateTodoRequest = parse_json_body(req.into_body()).await?;

    let todo = todos::update(state.store.as_ref(), caller.id, todo_id, request).await?;
    Ok(success(
        StatusCode::OK,
        json!({ "message": "Todo updated successfully", "todo": todo }),
    ))
}

/// PUT /api/todos/reorder
pub async fn handle_reorder(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let request: ReorderRequest = parse_json_body(req.into_body()).await?;

    let Some(items @ Value::Array(_)) = request.todos else {
        return Err(LingoError::bad_request("Invalid todos array"));
    };
    let order: Vec<ReorderItem> = serde_json::from_value(items)?;

    todos::reorder(state.store.as_ref(), caller.id, order).await?;
    Ok(success(
        StatusCode::OK,
        json!({ "message": "Todos reordered successfully" }),
    ))
}

/// DELETE /api/todos/{id}
pub async fn handle_delete(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let todo_id = path_id(id, "Invalid todo ID")?;

    todos::delete(state.store.as_ref(), caller.id, todo_id).await?;
    Ok(success(
        StatusCode::OK,
        json!({ "message": "Todo deleted successfully" }),
    ))
}
