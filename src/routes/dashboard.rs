//! Dashboard routes

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

use super::http_util::{authenticate, parse_query, success, BoxBody};
use crate::server::AppState;
use crate::services::dashboard::{self, MaterialQuery};
use crate::types::Result;

/// GET /api/dashboard/featured-news
pub async fn handle_featured_news(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    authenticate(&req, &state.jwt)?;
    let news = dashboard::featured_news(state.store.as_ref()).await?;
    Ok(success(StatusCode::OK, json!({ "news": news })))
}

/// GET /api/dashboard/materials?chapter=&category=&search=
pub async fn handle_materials(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    authenticate(&req, &state.jwt)?;
    let query: MaterialQuery = parse_query(req.uri())?;
    let materials = dashboard::materials(state.store.as_ref(), query).await?;
    Ok(success(StatusCode::OK, json!({ "materials": materials })))
}

/// GET /api/dashboard/stats
pub async fn handle_stats(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let stats = dashboard::stats(state.store.as_ref(), caller.id).await?;
    Ok(success(StatusCode::OK, json!({ "stats": stats })))
}

/// GET /api/dashboard/material-filters
pub async fn handle_material_filters(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    authenticate(&req, &state.jwt)?;
    let filters = dashboard::material_filters(state.store.as_ref()).await?;
    Ok(success(StatusCode::OK, json!({ "filters": filters })))
}
