//! Authentication routes: register, login, profile, logout

use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

use super::http_util::{authenticate, parse_json_body, success, BoxBody};
use crate::server::AppState;
use crate::services::account::{self, LoginRequest, RegisterRequest};
use crate::types::Result;

/// POST /api/auth/register
pub async fn handle_register(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let request: RegisterRequest = parse_json_body(req.into_body()).await?;
    let session = account::register(state.store.as_ref(), &state.jwt, request).await?;

    Ok(success(
        StatusCode::CREATED,
        json!({
            "message": "User registered successfully",
            "user": session.user,
            "token": session.token,
        }),
    ))
}

/// POST /api/auth/login
pub async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let request: LoginRequest = parse_json_body(req.into_body()).await?;
    let session = account::login(state.store.as_ref(), &state.jwt, request).await?;

    Ok(success(
        StatusCode::OK,
        json!({
            "message": "Login successful",
            "user": session.user,
            "token": session.token,
        }),
    ))
}

/// GET /api/auth/profile
pub async fn handle_profile(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let caller = authenticate(&req, &state.jwt)?;
    let user = account::profile(state.store.as_ref(), caller.id).await?;
    Ok(success(StatusCode::OK, json!({ "user": user })))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; the client discards its copy.
pub fn handle_logout() -> Response<BoxBody> {
    success(StatusCode::OK, json!({ "message": "Logout successful" }))
}
