//! Shared types

pub mod error;
pub mod id;

pub use error::{LingoError, Result};
pub use id::LooseInt;
