//! LingoBee - language-learning API for students
//!
//! A gamified practice path where each node unlocks once the one before it
//! is finished, plus the classroom features around it: assignments with
//! file submissions and comments, a dashboard of news and learning
//! materials, and a personal to-do list.
//!
//! ## Layers
//!
//! - **progression**: pure unlock, guard, reward and hearts-session rules
//! - **services**: domain operations over a [`db::Store`]
//! - **routes** / **server**: hyper HTTP API with JSON envelopes
//! - **db**: MongoDB and in-memory stores
//! - **storage**: local file storage for uploads

pub mod auth;
pub mod config;
pub mod db;
pub mod progression;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{LingoError, Result};
