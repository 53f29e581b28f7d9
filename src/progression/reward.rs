//! Experience and level arithmetic

use serde::Serialize;

/// Experience needed per level
pub const XP_PER_LEVEL: i64 = 100;

/// Reward granted by nodes without a configured value
pub const DEFAULT_XP_REWARD: i64 = 10;

/// Highest accepted score
pub const MAX_SCORE: i64 = 100;

/// Level for a cumulative experience total: `floor(xp / 100) + 1`
pub fn level_for_xp(xp: i64) -> i64 {
    xp.max(0).div_euclid(XP_PER_LEVEL) + 1
}

/// Reward for a node, falling back to [`DEFAULT_XP_REWARD`] when unset or zero
pub fn effective_reward(configured: Option<i64>) -> i64 {
    match configured {
        Some(xp) if xp > 0 => xp,
        _ => DEFAULT_XP_REWARD,
    }
}

/// Experience/level pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub xp: i64,
    pub level: i64,
}

/// Result of granting a node reward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardOutcome {
    pub xp_earned: i64,
    pub before: Progress,
    pub after: Progress,
}

impl RewardOutcome {
    pub fn level_up(&self) -> bool {
        self.after.level > self.before.level
    }

    pub fn summary(&self) -> RewardSummary {
        RewardSummary {
            xp_earned: self.xp_earned,
            level_up: self.level_up(),
        }
    }
}

/// Wire form of a reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSummary {
    pub xp_earned: i64,
    pub level_up: bool,
}

/// Add `xp_reward` to `before`. The score is not an input: rewards are fixed
/// per node.
pub fn apply_reward(before: Progress, xp_reward: i64) -> RewardOutcome {
    let xp = before.xp + xp_reward;
    RewardOutcome {
        xp_earned: xp_reward,
        before,
        after: Progress {
            xp,
            level: level_for_xp(xp),
        },
    }
}

/// Score must lie in `0..=100`
pub fn is_valid_score(score: i64) -> bool {
    (0..=MAX_SCORE).contains(&score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_formula() {
        let levels: Vec<i64> = [0, 99, 100, 199, 200].into_iter().map(level_for_xp).collect();
        assert_eq!(levels, vec![1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_effective_reward() {
        assert_eq!(effective_reward(Some(25)), 25);
        assert_eq!(effective_reward(None), 10);
        assert_eq!(effective_reward(Some(0)), 10);
    }

    #[test]
    fn test_level_up_crossing_boundary() {
        let outcome = apply_reward(Progress { xp: 95, level: 1 }, 10);
        assert_eq!(outcome.after, Progress { xp: 105, level: 2 });
        assert!(outcome.level_up());
        assert_eq!(
            outcome.summary(),
            RewardSummary {
                xp_earned: 10,
                level_up: true
            }
        );
    }

    #[test]
    fn test_no_level_up_inside_level() {
        let outcome = apply_reward(Progress { xp: 10, level: 1 }, 10);
        assert_eq!(outcome.after.level, 1);
        assert!(!outcome.level_up());
    }

    #[test]
    fn test_stale_stored_level_is_corrected() {
        // stored level lags behind xp; the new level still follows the formula
        let outcome = apply_reward(Progress { xp: 250, level: 1 }, 10);
        assert_eq!(outcome.after.level, 3);
        assert!(outcome.level_up());
    }

    #[test]
    fn test_score_bounds() {
        assert!(is_valid_score(0));
        assert!(is_valid_score(100));
        assert!(!is_valid_score(-1));
        assert!(!is_valid_score(101));
    }

    #[test]
    fn test_summary_wire_shape() {
        let json = serde_json::to_value(apply_reward(Progress { xp: 0, level: 1 }, 10).summary())
            .unwrap();
        assert_eq!(json, serde_json::json!({"xpEarned": 10, "levelUp": false}));
    }
}
