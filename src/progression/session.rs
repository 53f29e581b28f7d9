//! Exercise session state for one visit to a node
//!
//! A session walks the node's questions in order. Each wrong answer costs a
//! heart; running out ends the session without a completion. Answering the
//! last question correctly finishes it with the elapsed time. Nothing here is
//! persisted, and entering the node again starts a new session.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Hearts at the start of every session
pub const START_HEARTS: u32 = 5;

/// A translation exercise as served to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: String,
    pub instruction: String,
    pub sentence: String,
    pub audio_url: Option<String>,
    pub words: Vec<String>,
    pub correct_answer: Vec<String>,
}

impl Question {
    /// The expected answer as a single sentence
    pub fn expected_sentence(&self) -> String {
        self.correct_answer.join(" ")
    }

    pub fn is_correct(&self, words: &[String]) -> bool {
        words.join(" ") == self.expected_sentence()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Node has no questions")]
    NoQuestions,

    #[error("Session already ended")]
    Ended,
}

/// Result of submitting an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Correct; the next question is now current
    Advanced,
    /// Correct on the final question
    Completed { time_spent_secs: u64 },
    /// Wrong; hearts remain
    Incorrect { hearts_left: u32, expected: String },
    /// Wrong and no hearts left; the session is over
    OutOfHearts { expected: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    Completed { time_spent_secs: u64 },
    OutOfHearts,
}

/// Per-visit exercise state
#[derive(Debug, Clone)]
pub struct ExerciseSession {
    questions: Vec<Question>,
    cursor: usize,
    hearts: u32,
    started_at: Instant,
    state: SessionState,
}

impl ExerciseSession {
    pub fn new(questions: Vec<Question>, started_at: Instant) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }

        Ok(Self {
            questions,
            cursor: 0,
            hearts: START_HEARTS,
            started_at,
            state: SessionState::InProgress,
        })
    }

    pub fn current(&self) -> &Question {
        &self.questions[self.cursor]
    }

    pub fn hearts(&self) -> u32 {
        self.hearts
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_last(&self) -> bool {
        self.cursor + 1 == self.questions.len()
    }

    /// Percentage of the way through, counting the current question
    pub fn progress(&self) -> f64 {
        (self.cursor + 1) as f64 / self.questions.len() as f64 * 100.0
    }

    /// Check an answer for the current question
    pub fn submit(&mut self, words: &[String], now: Instant) -> Result<AnswerOutcome, SessionError> {
        if self.state != SessionState::InProgress {
            return Err(SessionError::Ended);
        }

        let question = &self.questions[self.cursor];
        if question.is_correct(words) {
            if self.is_last() {
                let time_spent_secs = now.saturating_duration_since(self.started_at).as_secs();
                self.state = SessionState::Completed { time_spent_secs };
                return Ok(AnswerOutcome::Completed { time_spent_secs });
            }
            self.cursor += 1;
            return Ok(AnswerOutcome::Advanced);
        }

        let expected = question.expected_sentence();
        self.hearts = self.hearts.saturating_sub(1);
        if self.hearts == 0 {
            self.state = SessionState::OutOfHearts;
            return Ok(AnswerOutcome::OutOfHearts { expected });
        }

        Ok(AnswerOutcome::Incorrect {
            hearts_left: self.hearts,
            expected,
        })
    }

    /// Move past the current question. Returns false on the final question,
    /// which cannot be skipped.
    pub fn skip(&mut self) -> bool {
        if self.state != SessionState::InProgress || self.is_last() {
            return false;
        }
        self.cursor += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn question(id: i64, answer: &[&str]) -> Question {
        Question {
            id,
            question_type: "translate".into(),
            instruction: "Write this in English".into(),
            sentence: "Saya makan nasi".into(),
            audio_url: None,
            words: answer.iter().rev().map(|w| w.to_string()).collect(),
            correct_answer: answer.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn words(s: &str) -> Vec<String> {
        s.split(' ').map(String::from).collect()
    }

    #[test]
    fn test_empty_session_rejected() {
        assert_eq!(
            ExerciseSession::new(Vec::new(), Instant::now()).unwrap_err(),
            SessionError::NoQuestions
        );
    }

    #[test]
    fn test_correct_answers_complete_session() {
        let start = Instant::now();
        let mut session = ExerciseSession::new(
            vec![question(1, &["I", "eat", "rice"]), question(2, &["Good", "morning"])],
            start,
        )
        .unwrap();

        assert_eq!(session.progress(), 50.0);
        assert_eq!(
            session.submit(&words("I eat rice"), start).unwrap(),
            AnswerOutcome::Advanced
        );
        assert_eq!(session.progress(), 100.0);

        let outcome = session
            .submit(&words("Good morning"), start + Duration::from_millis(42_500))
            .unwrap();
        assert_eq!(outcome, AnswerOutcome::Completed { time_spent_secs: 42 });
        assert_eq!(session.submit(&words("Good morning"), start), Err(SessionError::Ended));
    }

    #[test]
    fn test_five_wrong_answers_end_session() {
        let start = Instant::now();
        let mut session = ExerciseSession::new(vec![question(1, &["Hello"])], start).unwrap();

        for left in (1..START_HEARTS).rev() {
            assert_eq!(
                session.submit(&words("Bye"), start).unwrap(),
                AnswerOutcome::Incorrect {
                    hearts_left: left,
                    expected: "Hello".into()
                }
            );
        }
        assert_eq!(
            session.submit(&words("Bye"), start).unwrap(),
            AnswerOutcome::OutOfHearts {
                expected: "Hello".into()
            }
        );
        assert_eq!(session.state(), SessionState::OutOfHearts);
        assert!(!session.skip());
    }

    #[test]
    fn test_word_order_matters() {
        let q = question(1, &["I", "eat", "rice"]);
        assert!(!q.is_correct(&words("rice eat I")));
        assert!(q.is_correct(&words("I eat rice")));
    }

    #[test]
    fn test_skip_stops_at_last_question() {
        let mut session = ExerciseSession::new(
            vec![question(1, &["a"]), question(2, &["b"])],
            Instant::now(),
        )
        .unwrap();
        assert!(session.skip());
        assert_eq!(session.current().id, 2);
        assert!(!session.skip());
        assert_eq!(session.current().id, 2);
        assert_eq!(session.hearts(), START_HEARTS);
    }
}
