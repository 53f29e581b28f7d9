//! Service banner and liveness endpoint

use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;

use super::http_util::{json_response, BoxBody};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub backend: &'static str,
}

/// GET /
pub fn root_banner() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "message": "LingoBee API is running!",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/api/auth",
                "todos": "/api/todos",
                "assignments": "/api/assignments",
                "practice": "/api/practice",
                "dashboard": "/api/dashboard",
                "health": "/api/health",
            },
        }),
    )
}

/// GET /api/health
pub fn health_check(backend: &'static str) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "OK",
            message: "Server is running",
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            backend,
        },
    )
}
