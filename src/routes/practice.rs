//! Practice path routes

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

use super::http_util::{authenticate, parse_json_body, path_id, success, BoxBody};
use crate::server::AppState;
use crate::services::practice::{self, CompleteRequest};
use crate::types::Result;

/// GET /api/practice/sections
pub async fn handle_sections(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let sections = practice::sections(state.store.as_ref(), caller.id).await?;
    Ok(success(StatusCode::OK, json!({ "sections": sections })))
}

/// GET /api/practice/completed
pub async fn handle_completed(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let keys = practice::completed_keys(state.store.as_ref(), caller.id).await?;
    Ok(success(StatusCode::OK, json!({ "completedNodes": keys })))
}

/// GET /api/practice/questions/{sectionId}/{nodeId}
pub async fn handle_questions(
    req: Request<Incoming>,
    state: Arc<AppState>,
    section_id: &str,
    node_id: &str,
) -> Result<Response<BoxBody>> {
    authenticate(&req, &state.jwt)?;
    let section_id = path_id(section_id, "Invalid section ID")?;
    let node_id = path_id(node_id, "Invalid node ID")?;

    let questions = practice::questions(state.store.as_ref(), section_id, node_id).await?;
    Ok(success(StatusCode::OK, json!({ "questions": questions })))
}

/// POST /api/practice/complete
pub async fn handle_complete(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let request: CompleteRequest = parse_json_body(req.into_body()).await?;

    let result = practice::complete_node(state.store.as_ref(), caller.id, request).await?;
    Ok(success(
        StatusCode::OK,
        json!({
            "message": result.message,
            "user": result.user,
            "rewards": result.rewards,
        }),
    ))
}
