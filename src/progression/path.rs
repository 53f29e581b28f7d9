//! Practice path layout and unlock annotation
//!
//! A path is an ordered list of sections, each holding an ordered list of
//! nodes. Given the set of `"sectionId-nodeId"` keys a learner has completed,
//! [`annotate`] marks every node `completed` and computes whether it is
//! `unlocked`:
//!
//! - the first node of the first section is always unlocked
//! - a node is unlocked when its predecessor in the same section is completed
//! - the first node of a section is unlocked when every node of the previous
//!   section is completed (an empty section counts as completed)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Exercise kind shown on the path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Star,
    Practice,
    Lesson,
    Book,
    Trophy,
    Chest,
    Microphone,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Star => "star",
            Self::Practice => "practice",
            Self::Lesson => "lesson",
            Self::Book => "book",
            Self::Trophy => "trophy",
            Self::Chest => "chest",
            Self::Microphone => "microphone",
        };
        f.write_str(name)
    }
}

/// Display offsets of a node on the path canvas (CSS values such as `"40%"`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePosition {
    pub top: String,
    pub left: String,
}

/// A node as served to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathNode {
    pub id: i64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub unlocked: bool,
    pub completed: bool,
    pub xp_reward: Option<i64>,
    pub position: NodePosition,
}

/// A section as served to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSection {
    pub id: i64,
    /// Display label, e.g. `SECTION 1, UNIT 2`
    #[serde(rename = "section")]
    pub label: String,
    pub title: String,
    pub color: String,
    pub nodes: Vec<PathNode>,
}

/// Build the display label of a section from its stored numbers
pub fn section_label(section_number: i64, unit_number: i64) -> String {
    format!(
        "SECTION {}, UNIT {}",
        section_number.div_euclid(10),
        unit_number
    )
}

/// Completion-set key for a (section, node) pair
pub fn node_key(section_id: i64, node_id: i64) -> String {
    format!("{section_id}-{node_id}")
}

/// Set of completed `"sectionId-nodeId"` keys for one learner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    keys: HashSet<String>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw keys. Keys that do not follow the `a-b` format are kept
    /// but never match a node.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from (section id, node id) pairs
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        Self {
            keys: pairs
                .into_iter()
                .map(|(section_id, node_id)| node_key(section_id, node_id))
                .collect(),
        }
    }

    pub fn insert(&mut self, section_id: i64, node_id: i64) {
        self.keys.insert(node_key(section_id, node_id));
    }

    pub fn contains(&self, section_id: i64, node_id: i64) -> bool {
        self.keys.contains(&node_key(section_id, node_id))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// True when every node of the section is completed
pub fn is_section_complete(nodes: &[PathNode]) -> bool {
    nodes.iter().all(|node| node.completed)
}

/// Annotate every node with its completion and unlock state.
///
/// Pure: any `completed`/`unlocked` values already present are overwritten,
/// so annotating twice with the same set gives the same result.
pub fn annotate(mut sections: Vec<PathSection>, completed: &CompletionSet) -> Vec<PathSection> {
    let mut previous_section_done = false;

    for (section_index, section) in sections.iter_mut().enumerate() {
        let section_id = section.id;
        let mut previous_node_done = false;

        for (node_index, node) in section.nodes.iter_mut().enumerate() {
            let done = completed.contains(section_id, node.id);

            let seed = section_index == 0 && node_index == 0;
            let after_completed_node = node_index > 0 && previous_node_done;
            let after_completed_section =
                node_index == 0 && section_index > 0 && previous_section_done;

            node.completed = done;
            node.unlocked = seed || after_completed_node || after_completed_section;
            previous_node_done = done;
        }

        previous_section_done = is_section_complete(&section.nodes);
    }

    sections
}

/// Find a node by ids, returning the index of its section alongside
pub fn locate(
    sections: &[PathSection],
    section_id: i64,
    node_id: i64,
) -> Option<(usize, &PathSection, &PathNode)> {
    let (index, section) = sections
        .iter()
        .enumerate()
        .find(|(_, section)| section.id == section_id)?;
    let node = section.nodes.iter().find(|node| node.id == node_id)?;
    Some((index, section, node))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn node(id: i64) -> PathNode {
        PathNode {
            id,
            node_type: NodeType::Star,
            unlocked: false,
            completed: false,
            xp_reward: Some(10),
            position: NodePosition::default(),
        }
    }

    pub(crate) fn section(id: i64, node_ids: &[i64]) -> PathSection {
        PathSection {
            id,
            label: section_label(10, id),
            title: format!("Unit {id}"),
            color: "#c084fc".into(),
            nodes: node_ids.iter().copied().map(node).collect(),
        }
    }

    fn flags(sections: &[PathSection]) -> Vec<(i64, bool, bool)> {
        sections
            .iter()
            .flat_map(|s| s.nodes.iter().map(|n| (n.id, n.completed, n.unlocked)))
            .collect()
    }

    #[test]
    fn test_section_label() {
        assert_eq!(section_label(10, 1), "SECTION 1, UNIT 1");
        assert_eq!(section_label(25, 3), "SECTION 2, UNIT 3");
        assert_eq!(section_label(5, 1), "SECTION 0, UNIT 1");
    }

    #[test]
    fn test_node_key_format() {
        assert_eq!(node_key(1, 12), "1-12");
    }

    #[test]
    fn test_empty_input() {
        assert!(annotate(Vec::new(), &CompletionSet::new()).is_empty());
    }

    #[test]
    fn test_fresh_learner_only_seed_unlocked() {
        let path = annotate(vec![section(1, &[1, 2]), section(2, &[3])], &CompletionSet::new());
        assert_eq!(
            flags(&path),
            vec![(1, false, true), (2, false, false), (3, false, false)]
        );
    }

    #[test]
    fn test_next_node_unlocks_after_completion() {
        let done = CompletionSet::from_keys(["1-1"]);
        let path = annotate(vec![section(1, &[1, 2]), section(2, &[3])], &done);
        assert_eq!(
            flags(&path),
            vec![(1, true, true), (2, false, true), (3, false, false)]
        );
    }

    #[test]
    fn test_next_section_unlocks_after_full_section() {
        let done = CompletionSet::from_keys(["1-1", "1-2"]);
        let path = annotate(vec![section(1, &[1, 2]), section(2, &[3])], &done);
        assert_eq!(
            flags(&path),
            vec![(1, true, true), (2, true, true), (3, false, true)]
        );
    }

    #[test]
    fn test_empty_section_is_vacuously_complete() {
        let path = annotate(
            vec![section(1, &[]), section(2, &[5, 6])],
            &CompletionSet::new(),
        );
        assert!(path[1].nodes[0].unlocked);
        assert!(!path[1].nodes[1].unlocked);
    }

    #[test]
    fn test_malformed_keys_never_match() {
        let done = CompletionSet::from_keys(["1_1", "one-1", "", "1-1-1"]);
        let path = annotate(vec![section(1, &[1, 2])], &done);
        assert_eq!(flags(&path), vec![(1, false, true), (2, false, false)]);
    }

    #[test]
    fn test_completion_in_wrong_section_does_not_count() {
        // node 3 lives in section 2; a key claiming it under section 1 is ignored
        let done = CompletionSet::from_keys(["1-1", "1-2", "1-3"]);
        let path = annotate(vec![section(1, &[1, 2]), section(2, &[3, 4])], &done);
        assert!(!path[1].nodes[0].completed);
        assert!(!path[1].nodes[1].unlocked);
    }

    #[test]
    fn test_locate() {
        let path = vec![section(1, &[1, 2]), section(7, &[3])];
        let (index, s, n) = locate(&path, 7, 3).unwrap();
        assert_eq!((index, s.id, n.id), (1, 7, 3));
        assert!(locate(&path, 1, 3).is_none());
        assert!(locate(&path, 9, 1).is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let path = annotate(vec![section(1, &[1])], &CompletionSet::new());
        let json = serde_json::to_value(&path[0]).unwrap();
        assert_eq!(json["section"], "SECTION 1, UNIT 1");
        assert_eq!(json["nodes"][0]["type"], "star");
        assert_eq!(json["nodes"][0]["xpReward"], 10);
        assert_eq!(json["nodes"][0]["unlocked"], true);
        assert!(json["nodes"][0]["position"].get("top").is_some());
    }
}
