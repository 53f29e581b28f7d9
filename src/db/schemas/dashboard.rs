//! Dashboard content: featured news and learning materials

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::Metadata;
use crate::db::mongo::IntoIndexes;

pub const NEWS_COLLECTION: &str = "featured_news";
pub const MATERIAL_COLLECTION: &str = "learning_materials";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewsDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: i64,
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub link_url: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default)]
    pub order_index: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MaterialDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id: i64,
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub chapter: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    /// Difficulty label shown on the card
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub content_url: Option<String>,

    #[serde(default)]
    pub date_published: Option<DateTime>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl IntoIndexes for NewsDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(doc! { "is_active": 1, "order_index": 1 }, None)]
    }
}

impl IntoIndexes for MaterialDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (doc! { "is_active": 1, "date_published": -1 }, None),
            (doc! { "chapter": 1 }, None),
            (doc! { "category": 1 }, None),
        ]
    }
}
