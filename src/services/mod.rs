//! Domain operations behind the HTTP routes
//!
//! Each service reads through the [`Store`](crate::db::Store), applies the
//! progression rules where they matter, and returns serializable views.

pub mod account;
pub mod assignments;
pub mod dashboard;
pub mod practice;
pub mod seed;
pub mod todos;

pub use account::UserView;
pub use seed::{Catalog, CatalogSummary};
