//! Practice path: annotated sections, questions and node completion

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::account::UserView;
use crate::db::schemas::{ActivityLogDoc, CompletedNodeDoc, Metadata};
use crate::db::Store;
use crate::progression::{
    annotate, apply_reward, check_entry, effective_reward, is_valid_score, locate, node_key,
    CompletionSet, PathSection, Progress, Question, RewardSummary,
};
use crate::types::{LingoError, LooseInt, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub section_id: Option<LooseInt>,
    pub node_id: Option<LooseInt>,
    pub score: Option<LooseInt>,
    pub time_spent: Option<LooseInt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionResult {
    pub message: String,
    pub user: UserView,
    pub rewards: RewardSummary,
}

/// The learner's completion set, read fresh from the store
pub async fn completion_set(store: &dyn Store, user_id: i64) -> Result<CompletionSet> {
    let completions = store.list_completions(user_id).await?;
    Ok(CompletionSet::from_pairs(
        completions.iter().map(|c| (c.section_id, c.node_id)),
    ))
}

/// Every section with its nodes, annotated for this learner
pub async fn sections(store: &dyn Store, user_id: i64) -> Result<Vec<PathSection>> {
    let sections = store.list_sections().await?;
    let nodes = store.list_nodes().await?;
    let completed = completion_set(store, user_id).await?;

    let path = sections
        .iter()
        .map(|section| section.to_path_section(&nodes))
        .collect();

    Ok(annotate(path, &completed))
}

/// Completion keys in `sectionId-nodeId` form
pub async fn completed_keys(store: &dyn Store, user_id: i64) -> Result<Vec<String>> {
    let completions = store.list_completions(user_id).await?;
    Ok(completions
        .iter()
        .map(|c| node_key(c.section_id, c.node_id))
        .collect())
}

pub async fn questions(store: &dyn Store, section_id: i64, node_id: i64) -> Result<Vec<Question>> {
    let questions = store.list_questions(section_id, node_id).await?;
    Ok(questions.into_iter().map(Question::from).collect())
}

/// Record a node completion and grant its reward.
///
/// The completion record is written first; if the XP update then fails the
/// record is put back the way it was before the error is returned.
pub async fn complete_node(
    store: &dyn Store,
    user_id: i64,
    request: CompleteRequest,
) -> Result<CompletionResult> {
    let positive = |id: Option<LooseInt>| id.map(LooseInt::get).filter(|id| *id > 0);
    let (Some(section_id), Some(node_id)) = (positive(request.section_id), positive(request.node_id))
    else {
        return Err(LingoError::bad_request("Section ID and Node ID are required"));
    };

    let score = request.score.map_or(100, LooseInt::get);
    if !is_valid_score(score) {
        return Err(LingoError::bad_request("Score must be between 0 and 100"));
    }
    let time_spent = request.time_spent.map_or(0, LooseInt::get);
    if time_spent < 0 {
        return Err(LingoError::bad_request("Time spent cannot be negative"));
    }

    let node = store
        .find_node(node_id)
        .await?
        .filter(|node| node.section_id == section_id)
        .ok_or_else(|| LingoError::not_found("Node not found"))?;
    let xp_reward = effective_reward(node.xp_reward);

    if store.find_user(user_id).await?.is_none() {
        return Err(LingoError::not_found("User not found"));
    }

    let path = sections(store, user_id).await?;
    let (section_index, _, target) = locate(&path, section_id, node_id)
        .ok_or_else(|| LingoError::not_found("Node not found"))?;
    if let Err(reason) = check_entry(&path, section_index, target) {
        warn!(user_id, section_id, node_id, %reason, "Completion of locked node refused");
        return Err(reason.into());
    }

    let previous = store.find_completion(user_id, section_id, node_id).await?;
    store
        .upsert_completion(CompletedNodeDoc {
            _id: None,
            metadata: Metadata::now(),
            user_id,
            section_id,
            node_id,
            xp_earned: xp_reward,
            score,
            time_spent_seconds: time_spent,
        })
        .await?;

    let before = match store.increment_xp(user_id, xp_reward).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            restore_completion(store, previous, user_id, section_id, node_id).await;
            return Err(LingoError::not_found("User not found"));
        }
        Err(e) => {
            error!(user_id, section_id, node_id, error = %e, "XP update failed");
            restore_completion(store, previous, user_id, section_id, node_id).await;
            return Err(e);
        }
    };

    let outcome = apply_reward(
        Progress {
            xp: before.xp,
            level: before.level,
        },
        xp_reward,
    );

    let raised = store
        .raise_level(user_id, outcome.after.level)
        .await
        .and_then(|user| user.ok_or_else(|| LingoError::not_found("User not found")));
    let user = match raised {
        Ok(user) => user,
        Err(e) => {
            error!(user_id, section_id, node_id, error = %e, "Level update failed");
            if let Err(undo) = store.increment_xp(user_id, -xp_reward).await {
                error!(user_id, error = %undo, "Failed to revert XP");
            }
            restore_completion(store, previous, user_id, section_id, node_id).await;
            return Err(e);
        }
    };

    let entry = ActivityLogDoc::practice_completed(user_id, section_id, node_id, xp_reward);
    if let Err(e) = store.log_activity(entry).await {
        warn!(user_id, error = %e, "Failed to write activity log");
    }

    info!(
        user_id,
        section_id,
        node_id,
        xp = user.xp,
        level = user.level,
        level_up = outcome.level_up(),
        "Node completed"
    );

    Ok(CompletionResult {
        message: format!("Node completed! +{xp_reward} XP"),
        user: UserView::from(&user),
        rewards: outcome.summary(),
    })
}

async fn restore_completion(
    store: &dyn Store,
    previous: Option<CompletedNodeDoc>,
    user_id: i64,
    section_id: i64,
    node_id: i64,
) {
    let result = match previous {
        Some(record) => store.upsert_completion(record).await,
        None => store.delete_completion(user_id, section_id, node_id).await,
    };
    if let Err(e) = result {
        error!(user_id, section_id, node_id, error = %e, "Failed to restore completion record");
    }
}
