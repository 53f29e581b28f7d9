//! Practice path progression rules
//!
//! Pure logic shared by the API and any client runtime:
//! - [`path`]: unlock/completion annotation of sections and nodes
//! - [`guard`]: whether a learner may enter a node
//! - [`reward`]: XP and level arithmetic
//! - [`session`]: hearts and question cursor for one exercise visit

pub mod guard;
pub mod path;
pub mod reward;
pub mod session;

pub use guard::{check_entry, section_status, LockReason, SectionStatus};
pub use path::{
    annotate, is_section_complete, locate, node_key, section_label, CompletionSet, NodePosition,
    NodeType, PathNode, PathSection,
};
pub use reward::{
    apply_reward, effective_reward, is_valid_score, level_for_xp, Progress, RewardOutcome,
    RewardSummary, DEFAULT_XP_REWARD, XP_PER_LEVEL,
};
pub use session::{AnswerOutcome, ExerciseSession, Question, SessionError, SessionState, START_HEARTS};
