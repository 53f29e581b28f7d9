//! Personal to-do list entries

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::Metadata;
use crate::db::mongo::IntoIndexes;

pub const TODO_COLLECTION: &str = "todos";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TodoDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: i64,

    /// Owner
    pub user_id: i64,

    pub text: String,

    /// Free-form date string as entered by the learner
    #[serde(default)]
    pub deadline: Option<String>,

    #[serde(default)]
    pub checked: bool,

    /// Ordering key, ascending
    pub position: i64,
}

impl TodoDoc {
    pub fn new(user_id: i64, text: String, deadline: Option<String>, position: i64) -> Self {
        Self {
            _id: None,
            metadata: Metadata::now(),
            id: 0,
            user_id,
            text,
            deadline,
            checked: false,
            position,
        }
    }
}

impl IntoIndexes for TodoDoc {
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
            (doc! { "user_id": 1, "position": 1 }, None),
        ]
    }
}
