//! User document schema
//!
//! Stores learner credentials and progression counters.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::Metadata;
use crate::db::mongo::IntoIndexes;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Public user id (sequence-assigned)
    pub id: i64,

    pub full_name: String,

    /// Student number, the login identifier
    pub nim: String,

    /// Argon2 password hash
    pub password_hash: String,

    /// Cumulative experience points
    #[serde(default)]
    pub xp: i64,

    #[serde(default = "default_level")]
    pub level: i64,

    #[serde(default)]
    pub streak: i64,
}

fn default_level() -> i64 {
    1
}

impl UserDoc {
    /// A fresh learner at level 1 with no experience
    pub fn new(full_name: String, nim: String, password_hash: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::now(),
            id: 0,
            full_name,
            nim,
            password_hash,
            xp: 0,
            level: 1,
            streak: 0,
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "nim": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("nim_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
