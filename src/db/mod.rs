//! Persistence for LingoBee
//!
//! - [`schemas`]: document types shared by all backends
//! - [`store`]: the [`Store`] trait services depend on
//! - [`mongo_store`]: MongoDB backend
//! - [`memory`]: in-process backend for dev mode and tests

pub mod memory;
pub mod mongo;
pub mod mongo_store;
pub mod schemas;
pub mod store;

pub use memory::MemoryStore;
pub use mongo::{MongoClient, MongoCollection};
pub use mongo_store::MongoStore;
pub use store::{CatalogDocs, MaterialFilter, Store, TodoPatch};
