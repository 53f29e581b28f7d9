//! Practice path documents: curriculum, questions, completions, activity

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use super::Metadata;
use crate::db::mongo::IntoIndexes;
use crate::progression::{section_label, NodePosition, NodeType, PathNode, PathSection, Question};

pub const SECTION_COLLECTION: &str = "practice_sections";
pub const NODE_COLLECTION: &str = "practice_nodes";
pub const QUESTION_COLLECTION: &str = "practice_questions";
pub const COMPLETED_NODE_COLLECTION: &str = "completed_nodes";
pub const ACTIVITY_COLLECTION: &str = "user_activity_log";

/// Curriculum section
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SectionDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub id: i64,
    pub section_number: i64,
    pub unit_number: i64,
    pub title: String,
    pub color: String,
    pub order_index: i64,
}

impl SectionDoc {
    /// Assemble the client view of this section from its nodes, in order.
    /// Unlock state is the stored default until the path is annotated.
    pub fn to_path_section<'a>(&self, nodes: impl IntoIterator<Item = &'a NodeDoc>) -> PathSection {
        PathSection {
            id: self.id,
            label: section_label(self.section_number, self.unit_number),
            title: self.title.clone(),
            color: self.color.clone(),
            nodes: nodes
                .into_iter()
                .filter(|node| node.section_id == self.id)
                .map(NodeDoc::to_path_node)
                .collect(),
        }
    }
}

impl IntoIndexes for SectionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(IndexOptions::builder().unique(true).name("id_unique".to_string()).build()),
            ),
            (doc! { "order_index": 1 }, None),
        ]
    }
}

/// Exercise node within a section
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NodeDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub id: i64,
    pub section_id: i64,
    pub node_type: NodeType,
    #[serde(default)]
    pub is_unlocked_by_default: bool,
    #[serde(default)]
    pub xp_reward: Option<i64>,
    #[serde(default)]
    pub position_top: String,
    #[serde(default)]
    pub position_left: String,
    pub order_index: i64,
}

impl NodeDoc {
    pub fn to_path_node(&self) -> PathNode {
        PathNode {
            id: self.id,
            node_type: self.node_type,
            unlocked: self.is_unlocked_by_default,
            completed: false,
            xp_reward: self.xp_reward,
            position: NodePosition {
                top: self.position_top.clone(),
                left: self.position_left.clone(),
            },
        }
    }
}

impl IntoIndexes for NodeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(IndexOptions::builder().unique(true).name("id_unique".to_string()).build()),
            ),
            (doc! { "section_id": 1, "order_index": 1 }, None),
        ]
    }
}

/// Translation question attached to a node
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct QuestionDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub id: i64,
    pub section_id: i64,
    pub node_id: i64,
    pub question_type: String,
    pub instruction: String,
    pub sentence: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    pub available_words: Vec<String>,
    pub correct_answer: Vec<String>,
    pub order_index: i64,
}

impl From<QuestionDoc> for Question {
    fn from(doc: QuestionDoc) -> Self {
        Self {
            id: doc.id,
            question_type: doc.question_type,
            instruction: doc.instruction,
            sentence: doc.sentence,
            audio_url: doc.audio_url,
            words: doc.available_words,
            correct_answer: doc.correct_answer,
        }
    }
}

impl IntoIndexes for QuestionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(IndexOptions::builder().unique(true).name("id_unique".to_string()).build()),
            ),
            (doc! { "section_id": 1, "node_id": 1, "order_index": 1 }, None),
        ]
    }
}

/// One learner's completion of one node; unique per (user, section, node)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CompletedNodeDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    pub metadata: Metadata,
    pub user_id: i64,
    pub section_id: i64,
    pub node_id: i64,
    pub xp_earned: i64,
    pub score: i64,
    pub time_spent_seconds: i64,
}

impl IntoIndexes for CompletedNodeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1, "section_id": 1, "node_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_section_node_unique".to_string())
                    .build(),
            ),
        )]
    }
}

/// Append-only learner activity entry
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActivityLogDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    pub metadata: Metadata,
    pub user_id: i64,
    pub activity_type: String,
    pub description: String,
    pub xp_gained: i64,
}

impl ActivityLogDoc {
    pub fn practice_completed(user_id: i64, section_id: i64, node_id: i64, xp_gained: i64) -> Self {
        Self {
            _id: None,
            metadata: Metadata::now(),
            user_id,
            activity_type: "practice_completed".into(),
            description: format!("Completed node {node_id} in section {section_id}"),
            xp_gained,
        }
    }
}

impl IntoIndexes for ActivityLogDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(doc! { "user_id": 1 }, None)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, section_id: i64) -> NodeDoc {
        NodeDoc {
            _id: None,
            id,
            section_id,
            node_type: NodeType::Book,
            is_unlocked_by_default: id == 1,
            xp_reward: None,
            position_top: "10%".into(),
            position_left: "50%".into(),
            order_index: id,
        }
    }

    #[test]
    fn test_section_view_keeps_only_own_nodes() {
        let section = SectionDoc {
            _id: None,
            id: 1,
            section_number: 10,
            unit_number: 2,
            title: "Greetings".into(),
            color: "#fbbf24".into(),
            order_index: 0,
        };
        let nodes = vec![node(1, 1), node(2, 2), node(3, 1)];

        let view = section.to_path_section(&nodes);
        assert_eq!(view.label, "SECTION 1, UNIT 2");
        assert_eq!(view.nodes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(view.nodes[0].unlocked);
        assert_eq!(view.nodes[0].position.top, "10%");
    }

    #[test]
    fn test_activity_description() {
        let entry = ActivityLogDoc::practice_completed(7, 2, 5, 10);
        assert_eq!(entry.description, "Completed node 5 in section 2");
        assert_eq!(entry.activity_type, "practice_completed");
    }
}
