//! HTTP server for LingoBee

pub mod http;

pub use http::{run, AppState};
