//! Practice path progression integration tests
//!
//! Exercises the pure progression rules through the public API:
//! - Unlock predicate over every completion subset of a small layout
//! - Annotation idempotence
//! - Navigation guard, section header status and reward arithmetic
//! - Hearts session lifecycle

use std::time::{Duration, Instant};

use lingobee::progression::{
    annotate, apply_reward, check_entry, level_for_xp, locate, section_status, AnswerOutcome,
    CompletionSet, ExerciseSession, LockReason, NodePosition, NodeType, PathNode, PathSection,
    Progress, Question, SectionStatus, SessionState, START_HEARTS,
};

fn node(id: i64) -> PathNode {
    PathNode {
        id,
        node_type: NodeType::Star,
        unlocked: false,
        completed: false,
        xp_reward: Some(10),
        position: NodePosition::default(),
    }
}

fn section(id: i64, node_ids: &[i64]) -> PathSection {
    PathSection {
        id,
        label: format!("SECTION 1, UNIT {id}"),
        title: format!("Unit {id}"),
        color: "#58cc02".into(),
        nodes: node_ids.iter().copied().map(node).collect(),
    }
}

fn unlocked(sections: &[PathSection]) -> Vec<(i64, bool)> {
    sections
        .iter()
        .flat_map(|s| s.nodes.iter().map(|n| (n.id, n.unlocked)))
        .collect()
}

// =============================================================================
// Unlock predicate
// =============================================================================

#[test]
fn test_unlock_matches_predicate_for_all_subsets() {
    // A = [1, 2], B = [3, 4]
    let layout = vec![section(1, &[1, 2]), section(2, &[3, 4])];
    let pairs = [(1, 1), (1, 2), (2, 3), (2, 4)];

    for mask in 0u32..16 {
        let done: Vec<bool> = (0..4).map(|bit| mask & (1 << bit) != 0).collect();
        let completed = CompletionSet::from_pairs(
            pairs
                .iter()
                .zip(&done)
                .filter(|(_, d)| **d)
                .map(|(pair, _)| *pair),
        );

        let annotated = annotate(layout.clone(), &completed);

        let expected = vec![
            (1, true),
            (2, done[0]),
            (3, done[0] && done[1]),
            (4, done[2]),
        ];
        assert_eq!(unlocked(&annotated), expected, "mask {mask:04b}");

        for (i, n) in annotated.iter().flat_map(|s| &s.nodes).enumerate() {
            assert_eq!(n.completed, done[i], "mask {mask:04b} node {}", n.id);
        }
    }
}

#[test]
fn test_first_node_always_unlocked() {
    let layout = vec![section(1, &[1, 2]), section(2, &[3])];
    let sets = [
        CompletionSet::new(),
        CompletionSet::from_keys(["2-3"]),
        CompletionSet::from_keys(["1-2", "garbage", "1-"]),
    ];
    for completed in &sets {
        let annotated = annotate(layout.clone(), completed);
        assert!(annotated[0].nodes[0].unlocked);
    }
}

#[test]
fn test_annotate_is_idempotent() {
    let layout = vec![section(1, &[1, 2]), section(2, &[3])];
    let completed = CompletionSet::from_keys(["1-1"]);

    let once = annotate(layout, &completed);
    let twice = annotate(once.clone(), &completed);
    assert_eq!(once, twice);
}

#[test]
fn test_two_section_scenario() {
    let layout = vec![section(1, &[1, 2]), section(2, &[3])];

    let fresh = annotate(layout.clone(), &CompletionSet::new());
    assert_eq!(unlocked(&fresh), vec![(1, true), (2, false), (3, false)]);

    let one = annotate(layout.clone(), &CompletionSet::from_keys(["1-1"]));
    assert_eq!(unlocked(&one), vec![(1, true), (2, true), (3, false)]);

    let both = annotate(layout, &CompletionSet::from_keys(["1-1", "1-2"]));
    assert_eq!(unlocked(&both), vec![(1, true), (2, true), (3, true)]);
}

// =============================================================================
// Navigation guard
// =============================================================================

#[test]
fn test_guard_follows_annotation() {
    let layout = vec![section(1, &[1, 2]), section(2, &[3])];
    let annotated = annotate(layout, &CompletionSet::from_keys(["1-1"]));

    let (index, _, target) = locate(&annotated, 1, 2).unwrap();
    assert!(check_entry(&annotated, index, target).is_ok());

    let (index, _, target) = locate(&annotated, 2, 3).unwrap();
    assert_eq!(
        check_entry(&annotated, index, target),
        Err(LockReason::PreviousSectionIncomplete)
    );

    assert!(locate(&annotated, 2, 1).is_none());
}

#[test]
fn test_section_header_status() {
    fn statuses(done: &[&str]) -> Vec<SectionStatus> {
        let annotated = annotate(
            vec![section(1, &[1, 2]), section(2, &[3]), section(3, &[4])],
            &CompletionSet::from_keys(done.iter().copied()),
        );
        (0..annotated.len())
            .map(|index| section_status(&annotated, index))
            .collect()
    }

    use SectionStatus::{Active, Locked};
    assert_eq!(statuses(&[]), vec![Active, Locked, Locked]);
    assert_eq!(statuses(&["1-1"]), vec![Active, Locked, Locked]);
    assert_eq!(statuses(&["1-1", "1-2"]), vec![Active, Active, Locked]);
    // A skipped section keeps every later header locked
    assert_eq!(statuses(&["1-1", "1-2", "3-4"]), vec![Active, Active, Locked]);
    assert_eq!(statuses(&["1-1", "1-2", "2-3"]), vec![Active, Active, Active]);
}

// =============================================================================
// Rewards
// =============================================================================

#[test]
fn test_level_formula_table() {
    let levels: Vec<i64> = [0, 99, 100, 199, 200].into_iter().map(level_for_xp).collect();
    assert_eq!(levels, vec![1, 1, 2, 2, 3]);
}

#[test]
fn test_reward_crosses_level_boundary() {
    let outcome = apply_reward(Progress { xp: 95, level: 1 }, 10);
    assert_eq!(outcome.after, Progress { xp: 105, level: 2 });
    assert!(outcome.level_up());
    assert_eq!(outcome.summary().xp_earned, 10);
}

// =============================================================================
// Hearts session
// =============================================================================

fn question(id: i64, answer: &[&str]) -> Question {
    Question {
        id,
        question_type: "arrange".into(),
        instruction: "Arrange the words".into(),
        sentence: "Saya suka kopi".into(),
        audio_url: None,
        words: answer.iter().rev().map(|w| w.to_string()).collect(),
        correct_answer: answer.iter().map(|w| w.to_string()).collect(),
    }
}

fn words(ws: &[&str]) -> Vec<String> {
    ws.iter().map(|w| w.to_string()).collect()
}

#[test]
fn test_five_wrong_answers_end_session() {
    let start = Instant::now();
    let mut session = ExerciseSession::new(vec![question(1, &["I", "like", "coffee"])], start).unwrap();
    assert_eq!(session.hearts(), START_HEARTS);

    for attempt in 0..START_HEARTS {
        let outcome = session
            .submit(&words(&["coffee", "I", "like"]), start + Duration::from_secs(attempt as u64))
            .unwrap();
        assert!(matches!(
            outcome,
            AnswerOutcome::Incorrect { .. } | AnswerOutcome::OutOfHearts { .. }
        ));
    }

    assert_eq!(session.hearts(), 0);
    assert_eq!(session.state(), SessionState::OutOfHearts);
    assert!(session
        .submit(&words(&["I", "like", "coffee"]), start)
        .is_err());
}

#[test]
fn test_skip_never_passes_final_question() {
    let start = Instant::now();
    let mut session = ExerciseSession::new(
        vec![question(1, &["a"]), question(2, &["b"])],
        start,
    )
    .unwrap();

    assert!(session.skip());
    assert!(session.is_last());
    assert!(!session.skip());
    assert_eq!(session.current().id, 2);
    assert_eq!(session.progress(), 100.0);
}
