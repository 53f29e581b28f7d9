//! Navigation guard for entering a node's exercise flow

use std::fmt;

use super::path::{is_section_complete, PathNode, PathSection};

/// Why entry into a node was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    PreviousSectionIncomplete,
    NodeLocked,
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreviousSectionIncomplete => f.write_str("Complete the previous section first!"),
            Self::NodeLocked => {
                f.write_str("This lesson is locked! Complete previous lessons first.")
            }
        }
    }
}

/// Display state of a section header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStatus {
    Active,
    Locked,
}

/// Decide whether a learner may enter `node`.
///
/// `sections` must already be annotated; `section_index` is the position of
/// the node's section within it.
pub fn check_entry(
    sections: &[PathSection],
    section_index: usize,
    node: &PathNode,
) -> Result<(), LockReason> {
    if section_index > 0 {
        let previous_done = sections
            .get(section_index - 1)
            .map(|previous| is_section_complete(&previous.nodes))
            .unwrap_or(true);
        if !previous_done {
            return Err(LockReason::PreviousSectionIncomplete);
        }
    }

    if !node.unlocked {
        return Err(LockReason::NodeLocked);
    }

    Ok(())
}

/// A section is active once every section before it is complete
pub fn section_status(sections: &[PathSection], section_index: usize) -> SectionStatus {
    let all_previous_done = sections
        .iter()
        .take(section_index)
        .all(|section| is_section_complete(&section.nodes));

    if all_previous_done {
        SectionStatus::Active
    } else {
        SectionStatus::Locked
    }
}
