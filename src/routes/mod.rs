//! HTTP routes for LingoBee
//!
//! Handlers parse the request, authenticate the caller and hand off to
//! [`services`](crate::services). Errors are turned into JSON replies by the
//! server.

pub mod assignments;
pub mod auth_routes;
pub mod dashboard;
pub mod files;
pub mod health;
pub mod http_util;
pub mod practice;
pub mod todos;

pub use health::{health_check, root_banner};
pub use http_util::{error_response, not_found_response, BoxBody, Cors};
