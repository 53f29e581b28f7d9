//! Curriculum and content catalog loaded at startup
//!
//! The catalog file nests questions under nodes and nodes under sections.
//! Array order becomes `order_index` unless one is given explicitly.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::db::schemas::{
    AssignmentDoc, MaterialDoc, Metadata, NewsDoc, NodeDoc, QuestionDoc, SectionDoc,
};
use crate::db::{CatalogDocs, Store};
use crate::progression::{NodePosition, NodeType};
use crate::types::{LingoError, Result};

const DEMO_CATALOG: &str = include_str!("../../data/demo_catalog.json");

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub sections: Vec<SeedSection>,
    #[serde(default)]
    pub news: Vec<SeedNews>,
    #[serde(default)]
    pub materials: Vec<SeedMaterial>,
    #[serde(default)]
    pub assignments: Vec<SeedAssignment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSection {
    pub id: i64,
    pub section_number: i64,
    pub unit_number: i64,
    pub title: String,
    pub color: String,
    pub order_index: Option<i64>,
    #[serde(default)]
    pub nodes: Vec<SeedNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedNode {
    pub id: i64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub unlocked_by_default: bool,
    pub xp_reward: Option<i64>,
    #[serde(default)]
    pub position: NodePosition,
    pub order_index: Option<i64>,
    #[serde(default)]
    pub questions: Vec<SeedQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: String,
    pub instruction: String,
    pub sentence: String,
    pub audio_url: Option<String>,
    pub words: Vec<String>,
    pub correct_answer: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedNews {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub order_index: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedMaterial {
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
    #[serde(default = "active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedAssignment {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub chapter: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default = "active_status")]
    pub status: String,
    pub points: Option<i64>,
}

fn active() -> bool {
    true
}

fn active_status() -> String {
    "active".into()
}

fn bson_date(dt: Option<DateTime<Utc>>) -> Option<bson::DateTime> {
    dt.map(bson::DateTime::from_chrono)
}

/// Counts reported after an import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSummary {
    pub sections: usize,
    pub nodes: usize,
    pub questions: usize,
    pub news: usize,
    pub materials: usize,
    pub assignments: usize,
}

fn check_unique(kind: &str, ids: impl IntoIterator<Item = i64>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(LingoError::Config(format!(
                "Seed catalog has duplicate {kind} id {id}"
            )));
        }
    }
    Ok(())
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| LingoError::Config(format!("Invalid seed catalog: {e}")))
    }

    /// Built-in sample curriculum used in dev mode
    pub fn demo() -> Result<Self> {
        Self::from_json(DEMO_CATALOG)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            LingoError::Config(format!("Cannot read seed file {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn summary(&self) -> CatalogSummary {
        let nodes = self.sections.iter().flat_map(|s| &s.nodes);
        CatalogSummary {
            sections: self.sections.len(),
            nodes: nodes.clone().count(),
            questions: nodes.map(|n| n.questions.len()).sum(),
            news: self.news.len(),
            materials: self.materials.len(),
            assignments: self.assignments.len(),
        }
    }

    /// Flatten into storage documents, rejecting duplicate ids
    pub fn into_docs(self) -> Result<CatalogDocs> {
        check_unique("section", self.sections.iter().map(|s| s.id))?;
        check_unique(
            "node",
            self.sections.iter().flat_map(|s| s.nodes.iter().map(|n| n.id)),
        )?;
        check_unique(
            "question",
            self.sections
                .iter()
                .flat_map(|s| &s.nodes)
                .flat_map(|n| n.questions.iter().map(|q| q.id)),
        )?;
        check_unique("news", self.news.iter().map(|n| n.id))?;
        check_unique("material", self.materials.iter().map(|m| m.id))?;
        check_unique("assignment", self.assignments.iter().map(|a| a.id))?;

        let mut docs = CatalogDocs::default();

        for (section_index, section) in self.sections.into_iter().enumerate() {
            for (node_index, node) in section.nodes.into_iter().enumerate() {
                for (question_index, question) in node.questions.into_iter().enumerate() {
                    docs.questions.push(QuestionDoc {
                        _id: None,
                        id: question.id,
                        section_id: section.id,
                        node_id: node.id,
                        question_type: question.question_type,
                        instruction: question.instruction,
                        sentence: question.sentence,
                        audio_url: question.audio_url,
                        available_words: question.words,
                        correct_answer: question.correct_answer,
                        order_index: question_index as i64,
                    });
                }
                docs.nodes.push(NodeDoc {
                    _id: None,
                    id: node.id,
                    section_id: section.id,
                    node_type: node.node_type,
                    is_unlocked_by_default: node.unlocked_by_default,
                    xp_reward: node.xp_reward,
                    position_top: node.position.top,
                    position_left: node.position.left,
                    order_index: node.order_index.unwrap_or(node_index as i64),
                });
            }
            docs.sections.push(SectionDoc {
                _id: None,
                id: section.id,
                section_number: section.section_number,
                unit_number: section.unit_number,
                title: section.title,
                color: section.color,
                order_index: section.order_index.unwrap_or(section_index as i64),
            });
        }

        docs.news = self
            .news
            .into_iter()
            .map(|n| NewsDoc {
                _id: None,
                metadata: Metadata::now(),
                id: n.id,
                title: n.title,
                description: n.description,
                content: n.content,
                image_url: n.image_url,
                link_url: n.link_url,
                is_active: n.is_active,
                order_index: n.order_index,
            })
            .collect();

        docs.materials = self
            .materials
            .into_iter()
            .map(|m| MaterialDoc {
                _id: None,
                metadata: Metadata::now(),
                id: m.id,
                title: m.title,
                description: m.description,
                content: m.content,
                chapter: m.chapter,
                category: m.category,
                level: m.level,
                thumbnail_url: m.thumbnail_url,
                content_url: m.content_url,
                date_published: bson_date(m.date_published),
                is_active: m.is_active,
            })
            .collect();

        docs.assignments = self
            .assignments
            .into_iter()
            .map(|a| AssignmentDoc {
                _id: None,
                metadata: Metadata::now(),
                id: a.id,
                title: a.title,
                description: a.description,
                chapter: a.chapter,
                start_date: bson_date(a.start_date),
                due_date: bson_date(a.due_date),
                status: a.status,
                points: a.points,
            })
            .collect();

        Ok(docs)
    }
}

/// Write the catalog into the store
pub async fn import(store: &dyn Store, catalog: Catalog) -> Result<CatalogSummary> {
    let summary = catalog.summary();
    store.import_catalog(catalog.into_docs()?).await?;

    info!(
        backend = store.backend(),
        sections = summary.sections,
        nodes = summary.nodes,
        questions = summary.questions,
        news = summary.news,
        materials = summary.materials,
        assignments = summary.assignments,
        "Seed catalog imported"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[test]
    fn test_demo_catalog_parses() {
        let catalog = Catalog::demo().unwrap();
        let summary = catalog.summary();
        assert!(summary.sections >= 2);
        assert!(summary.nodes > summary.sections);
        assert!(summary.questions > 0);

        let docs = catalog.into_docs().unwrap();
        assert_eq!(docs.sections[0].order_index, 0);
        assert!(docs.nodes.iter().all(|n| docs.sections.iter().any(|s| s.id == n.section_id)));
    }

    #[test]
    fn test_duplicate_node_ids_rejected() {
        let json = r##"{
            "sections": [
                {"id": 1, "section_number": 10, "unit_number": 1, "title": "A", "color": "#fff",
                 "nodes": [{"id": 1, "type": "star"}]},
                {"id": 2, "section_number": 10, "unit_number": 2, "title": "B", "color": "#fff",
                 "nodes": [{"id": 1, "type": "book"}]}
            ]
        }"##;
        let err = Catalog::from_json(json).unwrap().into_docs().unwrap_err();
        assert!(err.to_string().contains("duplicate node id 1"));
    }

    #[test]
    fn test_unknown_node_type_rejected() {
        let json = r##"{"sections": [{"id": 1, "section_number": 10, "unit_number": 1,
            "title": "A", "color": "#fff", "nodes": [{"id": 1, "type": "rocket"}]}]}"##;
        assert!(Catalog::from_json(json).is_err());
    }

    #[tokio::test]
    async fn test_import_is_repeatable() {
        let store = MemoryStore::new();
        import(&store, Catalog::demo().unwrap()).await.unwrap();
        let summary = import(&store, Catalog::demo().unwrap()).await.unwrap();

        assert_eq!(store.list_sections().await.unwrap().len(), summary.sections);
        assert_eq!(store.list_nodes().await.unwrap().len(), summary.nodes);
    }
}
