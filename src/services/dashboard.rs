//! Dashboard: news, learning materials, learner stats

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::db::schemas::{to_chrono, MaterialDoc, NewsDoc};
use crate::db::{MaterialFilter, Store};
use crate::types::{LingoError, Result};

/// Query string of `GET /api/dashboard/materials`
#[derive(Debug, Default, Deserialize)]
pub struct MaterialQuery {
    pub chapter: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl From<MaterialQuery> for MaterialFilter {
    fn from(query: MaterialQuery) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            chapter: non_empty(query.chapter),
            category: non_empty(query.category),
            search: non_empty(query.search),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub order_index: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&NewsDoc> for NewsView {
    fn from(n: &NewsDoc) -> Self {
        Self {
            id: n.id,
            title: n.title.clone(),
            description: n.description.clone(),
            content: n.content.clone(),
            image_url: n.image_url.clone(),
            link_url: n.link_url.clone(),
            order_index: n.order_index,
            created_at: n.metadata.created_at.map(to_chrono),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub chapter: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub thumbnail_url: Option<String>,
    pub content_url: Option<String>,
    pub date_published: Option<DateTime<Utc>>,
}

impl From<&MaterialDoc> for MaterialView {
    fn from(m: &MaterialDoc) -> Self {
        Self {
            id: m.id,
            title: m.title.clone(),
            description: m.description.clone(),
            content: m.content.clone(),
            chapter: m.chapter.clone(),
            category: m.category.clone(),
            level: m.level.clone(),
            thumbnail_url: m.thumbnail_url.clone(),
            content_url: m.content_url.clone(),
            date_published: m.date_published.map(to_chrono),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub level: i64,
    pub xp: i64,
    pub streak: i64,
    pub completed_practices: u64,
    pub completed_assignments: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterialFilters {
    pub chapters: Vec<String>,
    pub categories: Vec<String>,
}

impl MaterialFilters {
    /// Sorted unique non-empty chapters and categories
    pub fn from_materials(materials: &[MaterialDoc]) -> Self {
        let collect = |field: fn(&MaterialDoc) -> Option<&String>| -> Vec<String> {
            materials
                .iter()
                .filter_map(field)
                .filter(|v| !v.is_empty())
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        Self {
            chapters: collect(|m| m.chapter.as_ref()),
            categories: collect(|m| m.category.as_ref()),
        }
    }
}

pub async fn featured_news(store: &dyn Store) -> Result<Vec<NewsView>> {
    let news = store.list_active_news().await?;
    Ok(news.iter().map(NewsView::from).collect())
}

pub async fn materials(store: &dyn Store, query: MaterialQuery) -> Result<Vec<MaterialView>> {
    let materials = store.list_materials(&query.into()).await?;
    Ok(materials.iter().map(MaterialView::from).collect())
}

pub async fn stats(store: &dyn Store, user_id: i64) -> Result<DashboardStats> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| LingoError::not_found("User not found"))?;

    Ok(DashboardStats {
        level: user.level,
        xp: user.xp,
        streak: user.streak,
        completed_practices: store.count_completions(user_id).await?,
        completed_assignments: store.count_graded_submissions(user_id).await?,
    })
}

pub async fn material_filters(store: &dyn Store) -> Result<MaterialFilters> {
    let materials = store.list_materials(&MaterialFilter::default()).await?;
    Ok(MaterialFilters::from_materials(&materials))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(chapter: Option<&str>, category: Option<&str>) -> MaterialDoc {
        MaterialDoc {
            _id: None,
            metadata: Default::default(),
            id: 1,
            title: "t".into(),
            description: None,
            content: None,
            chapter: chapter.map(str::to_string),
            category: category.map(str::to_string),
            level: None,
            thumbnail_url: None,
            content_url: None,
            date_published: None,
            is_active: true,
        }
    }

    #[test]
    fn test_filter_facets_sorted_unique() {
        let materials = vec![
            material(Some("Chapter 2"), Some("grammar")),
            material(Some("Chapter 1"), None),
            material(Some("Chapter 2"), Some("vocabulary")),
            material(Some(""), Some("grammar")),
            material(None, Some("listening")),
        ];

        let filters = MaterialFilters::from_materials(&materials);
        assert_eq!(filters.chapters, vec!["Chapter 1", "Chapter 2"]);
        assert_eq!(filters.categories, vec!["grammar", "listening", "vocabulary"]);
    }

    #[test]
    fn test_blank_query_params_are_ignored() {
        let filter: MaterialFilter = MaterialQuery {
            chapter: Some("".into()),
            category: Some("grammar".into()),
            search: None,
        }
        .into();
        assert_eq!(filter.chapter, None);
        assert_eq!(filter.category.as_deref(), Some("grammar"));
    }
}
