//! The test session state machine.
//!
//! A [`Session`] owns one attempt at one test: its generated questions, the
//! practice and main response logs, the phase, the cursor into the active
//! list and all timing. Drivers poll it; it never performs I/O.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::config::TestCounts;
use crate::error::SessionError;
use crate::evaluator::evaluate;
use crate::generator::generate_with_rng;
use crate::model::{Answer, Phase, Question, QuestionRuntime, ResponseItem, Stage, TestType};
use crate::report::{RecordMetadata, TestResultRecord};
use crate::statistics::{compute_metrics, Metrics};
use crate::time::{elapsed_secs, Clock};

/// Progress through the active question list, for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub phase: Phase,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
}

/// One attempt at a cognitive test.
pub struct Session {
    test_type: TestType,
    phase: Phase,
    practice_questions: Vec<Question>,
    questions: Vec<Question>,
    practice_responses: Vec<ResponseItem>,
    responses: Vec<ResponseItem>,
    cursor: usize,
    started_at: DateTime<Utc>,
    question_started_at: DateTime<Utc>,
    runtime: QuestionRuntime,
    clock: Clock,
}

impl Session {
    /// Create a session with default question counts and the thread-local RNG.
    pub fn create(test_type: TestType) -> Self {
        Self::create_with(test_type, TestCounts::default_for(test_type), &mut rand::rng())
    }

    /// Create a session, generating both question batches from `rng`.
    pub fn create_with<R: Rng + ?Sized>(test_type: TestType, counts: TestCounts, rng: &mut R) -> Self {
        let practice = generate_with_rng(test_type, counts.practice, rng);
        let main = generate_with_rng(test_type, counts.main, rng);
        Self::from_questions(test_type, practice, main)
    }

    /// Create a session over pre-built question lists.
    pub fn from_questions(
        test_type: TestType,
        practice_questions: Vec<Question>,
        questions: Vec<Question>,
    ) -> Self {
        let clock = Clock::default();
        let now = clock.now();
        tracing::debug!(
            test_type = %test_type,
            practice = practice_questions.len(),
            main = questions.len(),
            "session created"
        );
        Self {
            test_type,
            phase: Phase::Instructions,
            practice_questions,
            questions,
            practice_responses: Vec::new(),
            responses: Vec::new(),
            cursor: 0,
            started_at: now,
            question_started_at: now,
            runtime: QuestionRuntime::default(),
            clock,
        }
    }

    /// Use the given clock for all subsequent timing.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        let now = clock.now();
        self.started_at = now;
        self.question_started_at = now;
        self
    }

    /// Mutable access to the clock, so a fixed clock can be advanced.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Start timing the session. Calling it again resets timing but not the phase.
    pub fn start(&mut self) {
        let now = self.clock.now();
        self.started_at = now;
        self.question_started_at = now;
        self.cursor = 0;
    }

    /// Move to the next phase, resetting the cursor, timer and scratch.
    ///
    /// No-op once `finished`.
    pub fn advance_phase(&mut self) {
        if self.phase == Phase::Finished {
            return;
        }
        let from = self.phase;
        self.phase = from.next();
        self.cursor = 0;
        self.question_started_at = self.clock.now();
        self.runtime = QuestionRuntime::default();
        tracing::debug!(test_type = %self.test_type, %from, to = %self.phase, "phase advanced");
    }

    /// The question awaiting an answer.
    ///
    /// # Errors
    ///
    /// `NotAnswerable` outside practice/main, `Exhausted` when the active
    /// list has been fully answered.
    pub fn current_question(&self) -> Result<&Question, SessionError> {
        if !self.phase.is_answerable() {
            return Err(SessionError::NotAnswerable { phase: self.phase });
        }
        self.active_questions()
            .get(self.cursor)
            .ok_or(SessionError::Exhausted {
                phase: self.phase,
                index: self.cursor,
            })
    }

    /// Hide the stimulus of an encode→recall question and start the recall stage.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Session::current_question`].
    pub fn begin_recall(&mut self) -> Result<(), SessionError> {
        self.current_question()?;
        if self.runtime.stage == Stage::Encode {
            self.runtime = QuestionRuntime {
                stage: Stage::Recall,
                recall_started_at: Some(self.clock.now()),
            };
        }
        Ok(())
    }

    /// Grade `answer` against the current question and advance the cursor.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Session::current_question`]; nothing is
    /// recorded when they fail.
    pub fn record_response(&mut self, answer: Answer) -> Result<&ResponseItem, SessionError> {
        let now = self.clock.now();
        let phase = self.phase;
        let question = self.current_question()?;

        let evaluation = evaluate(self.test_type, question, &answer, &self.runtime);
        let item = ResponseItem {
            question_id: question.id.clone(),
            response: answer,
            correct: evaluation.correct,
            response_time: elapsed_secs(self.question_started_at, now),
            recall_time: self
                .runtime
                .recall_started_at
                .map(|hidden_at| elapsed_secs(hidden_at, now)),
            meta: evaluation.meta,
        };
        tracing::debug!(
            test_type = %self.test_type,
            %phase,
            question = %item.question_id,
            correct = item.correct,
            response_time = item.response_time,
            "response recorded"
        );

        self.cursor += 1;
        if self.cursor < self.active_questions().len() {
            self.question_started_at = now;
            self.runtime = QuestionRuntime::default();
        }

        let log = if phase == Phase::Practice {
            &mut self.practice_responses
        } else {
            &mut self.responses
        };
        let index = log.len();
        log.push(item);
        Ok(&log[index])
    }

    /// True once every question of the active list has been answered.
    ///
    /// Always true in `finished`.
    #[must_use]
    pub fn is_phase_complete(&self) -> bool {
        self.phase == Phase::Finished || self.cursor >= self.active_questions().len()
    }

    /// Metrics over the main-phase log. Practice responses are excluded.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        compute_metrics(self.test_type, &self.responses)
    }

    /// Metrics over the practice log, for feedback between phases.
    #[must_use]
    pub fn practice_metrics(&self) -> Metrics {
        compute_metrics(self.test_type, &self.practice_responses)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.active_questions().len();
        let answered = self.cursor.min(total);
        SessionProgress {
            phase: self.phase,
            total,
            answered,
            remaining: total - answered,
        }
    }

    /// Build the record handed to a persistence sink.
    ///
    /// # Errors
    ///
    /// `NotFinished` unless the session has reached `finished`.
    pub fn finalize(&self, user_id: impl Into<String>) -> Result<TestResultRecord, SessionError> {
        if self.phase != Phase::Finished {
            return Err(SessionError::NotFinished { phase: self.phase });
        }
        let completed_at = self.clock.now();
        let metrics = self.metrics();
        let record = TestResultRecord {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            test_type: self.test_type,
            score: metrics.score,
            accuracy: metrics.accuracy,
            average_response_time: metrics.avg_response_time,
            responses: self.responses.clone(),
            metadata: RecordMetadata {
                started_at: self.started_at,
                completed_at,
                duration_secs: elapsed_secs(self.started_at, completed_at),
            },
            analysis: metrics.stroop,
        };
        tracing::info!(
            id = %record.id,
            test_type = %record.test_type,
            score = record.score,
            accuracy = record.accuracy,
            "session finalized"
        );
        Ok(record)
    }

    #[must_use]
    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn runtime(&self) -> &QuestionRuntime {
        &self.runtime
    }

    #[must_use]
    pub fn practice_questions(&self) -> &[Question] {
        &self.practice_questions
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn practice_responses(&self) -> &[ResponseItem] {
        &self.practice_responses
    }

    #[must_use]
    pub fn responses(&self) -> &[ResponseItem] {
        &self.responses
    }

    fn active_questions(&self) -> &[Question] {
        if self.phase == Phase::Practice {
            &self.practice_questions
        } else {
            &self.questions
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("test_type", &self.test_type)
            .field("phase", &self.phase)
            .field("practice_len", &self.practice_questions.len())
            .field("main_len", &self.questions.len())
            .field("cursor", &self.cursor)
            .field("practice_responses", &self.practice_responses.len())
            .field("responses", &self.responses.len())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, QuestionId, QuestionKind, ResponseMeta, StroopCondition};
    use crate::time::fixed_clock;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stroop_question(id: &str, word: Color, ink: Color) -> Question {
        let condition = if word == ink {
            StroopCondition::Congruent
        } else {
            StroopCondition::Incongruent
        };
        Question {
            id: QuestionId::new(id),
            kind: QuestionKind::Stroop {
                word,
                ink,
                condition,
            },
        }
    }

    fn stroop_session(practice: usize, main: usize) -> Session {
        let make = |prefix: &str, n: usize| {
            (0..n)
                .map(|i| stroop_question(&format!("{prefix}-{i}"), Color::Red, Color::Red))
                .collect::<Vec<_>>()
        };
        let mut session =
            Session::from_questions(TestType::Stroop, make("p", practice), make("m", main))
                .with_clock(fixed_clock());
        session.start();
        session
    }

    #[test]
    fn create_generates_configured_batches() {
        let counts = TestCounts {
            practice: 2,
            main: 6,
        };
        let session = Session::create_with(TestType::Memory, counts, &mut StdRng::seed_from_u64(1));
        assert_eq!(session.practice_questions().len(), 2);
        assert_eq!(session.questions().len(), 6);
        assert_eq!(session.phase(), Phase::Instructions);
        assert!(session.responses().is_empty());
    }

    #[test]
    fn default_create_uses_default_counts() {
        let session = Session::create(TestType::Stroop);
        assert_eq!(session.practice_questions().len(), 5);
        assert_eq!(session.questions().len(), 20);
    }

    #[test]
    fn phases_advance_linearly_and_stop_at_finished() {
        let mut session = stroop_session(1, 1);
        let order = [Phase::Practice, Phase::Main, Phase::Finished, Phase::Finished];
        for expected in order {
            session.advance_phase();
            assert_eq!(session.phase(), expected);
        }
    }

    #[test]
    fn phase_completes_exactly_after_last_response() {
        let (k, m) = (3, 4);
        let mut session = stroop_session(k, m);
        session.advance_phase();

        for i in 0..k {
            assert!(!session.is_phase_complete(), "practice complete early at {i}");
            session.record_response(Answer::choice("red")).unwrap();
        }
        assert!(session.is_phase_complete());

        session.advance_phase();
        for i in 0..m {
            assert!(!session.is_phase_complete(), "main complete early at {i}");
            session.record_response(Answer::choice("red")).unwrap();
        }
        assert!(session.is_phase_complete());
        assert_eq!(session.practice_responses().len(), k);
        assert_eq!(session.responses().len(), m);
    }

    #[test]
    fn recording_past_the_end_fails_loudly() {
        let mut session = stroop_session(1, 1);
        session.advance_phase();
        session.record_response(Answer::choice("red")).unwrap();
        let err = session.record_response(Answer::choice("red")).unwrap_err();
        assert_eq!(
            err,
            SessionError::Exhausted {
                phase: Phase::Practice,
                index: 1
            }
        );
        assert_eq!(session.practice_responses().len(), 1);
    }

    #[test]
    fn instructions_and_finished_have_no_current_question() {
        let mut session = stroop_session(1, 1);
        assert_eq!(
            session.current_question().unwrap_err(),
            SessionError::NotAnswerable {
                phase: Phase::Instructions
            }
        );
        assert!(session.record_response(Answer::choice("red")).is_err());

        session.advance_phase();
        session.advance_phase();
        session.advance_phase();
        assert!(session.is_phase_complete());
        assert!(matches!(
            session.current_question(),
            Err(SessionError::NotAnswerable {
                phase: Phase::Finished
            })
        ));
    }

    #[test]
    fn practice_is_excluded_from_metrics() {
        let mut session = stroop_session(2, 2);
        session.advance_phase();
        session.record_response(Answer::choice("red")).unwrap();
        session.record_response(Answer::choice("red")).unwrap();
        assert_eq!(session.practice_metrics().score, 2);
        assert_eq!(session.metrics().score, 0);

        session.advance_phase();
        session.record_response(Answer::choice("blue")).unwrap();
        session.record_response(Answer::choice("red")).unwrap();
        let metrics = session.metrics();
        assert_eq!(metrics.score, 1);
        assert_eq!(metrics.accuracy, 50.0);
    }

    #[test]
    fn response_time_comes_from_question_timer() {
        let mut session = stroop_session(0, 2);
        session.advance_phase();
        session.advance_phase();

        session.clock_mut().advance(Duration::milliseconds(750));
        let first = session.record_response(Answer::choice("red")).unwrap();
        assert_eq!(first.response_time, 0.75);

        session.clock_mut().advance(Duration::milliseconds(1250));
        let second = session.record_response(Answer::choice("red")).unwrap();
        assert_eq!(second.response_time, 1.25);
        assert_eq!(session.metrics().avg_response_time, 1.0);
    }

    #[test]
    fn stroop_effect_from_recorded_trials() {
        let practice = Vec::new();
        let main = vec![
            stroop_question("c1", Color::Red, Color::Red),
            stroop_question("c2", Color::Blue, Color::Blue),
            stroop_question("i1", Color::Red, Color::Green),
            stroop_question("i2", Color::Black, Color::Yellow),
        ];
        let mut session =
            Session::from_questions(TestType::Stroop, practice, main).with_clock(fixed_clock());
        session.start();
        session.advance_phase();
        session.advance_phase();

        for (ms, answer) in [(500, "red"), (700, "blue"), (900, "green"), (1100, "yellow")] {
            session.clock_mut().advance(Duration::milliseconds(ms));
            session.record_response(Answer::choice(answer)).unwrap();
        }

        let metrics = session.metrics();
        let stroop = metrics.stroop.unwrap();
        assert!((stroop.stroop_effect - 0.4).abs() < 1e-9);
        assert_eq!(metrics.score, 4);
        assert_eq!(stroop.error_rate, 0.0);
        assert_eq!(session.metrics(), metrics);
    }

    #[test]
    fn memory_recall_stage_resets_between_questions() {
        let counts = TestCounts {
            practice: 0,
            main: 2,
        };
        let mut session = Session::create_with(TestType::Memory, counts, &mut StdRng::seed_from_u64(3))
            .with_clock(fixed_clock());
        session.start();
        session.advance_phase();
        session.advance_phase();

        session.begin_recall().unwrap();
        assert_eq!(session.runtime().stage, Stage::Recall);
        let item = session.record_response(Answer::text("nothing")).unwrap();
        assert!(matches!(
            item.meta,
            ResponseMeta::Recall {
                stimulus_hidden: true,
                ..
            }
        ));
        assert_eq!(session.runtime().stage, Stage::Encode);
    }

    fn memory_session(practice: usize, main: usize) -> Session {
        let counts = TestCounts { practice, main };
        let mut session = Session::create_with(TestType::Memory, counts, &mut StdRng::seed_from_u64(5))
            .with_clock(fixed_clock());
        session.start();
        session
    }

    #[test]
    fn restart_resets_timing_and_cursor_but_not_phase() {
        let mut session = stroop_session(2, 2);
        session.advance_phase();
        session.record_response(Answer::choice("red")).unwrap();
        assert_eq!(session.progress().answered, 1);

        session.clock_mut().advance(Duration::seconds(5));
        session.start();
        assert_eq!(session.phase(), Phase::Practice);
        assert_eq!(session.progress().answered, 0);
        assert_eq!(session.started_at(), session.clock_mut().now());

        session.clock_mut().advance(Duration::milliseconds(400));
        let item = session.record_response(Answer::choice("red")).unwrap();
        assert_eq!(item.response_time, 0.4);
        assert_eq!(item.question_id.as_str(), "p-0");
    }

    #[test]
    fn advance_phase_clears_recall_stage_and_restarts_timer() {
        let mut session = memory_session(1, 1);
        session.advance_phase();
        session.begin_recall().unwrap();
        assert!(session.runtime().recall_started_at.is_some());

        session.clock_mut().advance(Duration::seconds(3));
        session.advance_phase();
        assert_eq!(session.phase(), Phase::Main);
        assert_eq!(session.runtime(), &QuestionRuntime::default());

        session.clock_mut().advance(Duration::milliseconds(500));
        let item = session.record_response(Answer::text("")).unwrap();
        assert_eq!(item.response_time, 0.5);
        assert_eq!(item.recall_time, None);
    }

    #[test]
    fn last_response_keeps_timer_and_scratch() {
        let mut session = memory_session(0, 1);
        session.advance_phase();
        session.advance_phase();
        let question_started_at = session.question_started_at;

        session.clock_mut().advance(Duration::seconds(1));
        session.begin_recall().unwrap();
        session.clock_mut().advance(Duration::seconds(2));
        let item = session.record_response(Answer::text("")).unwrap();
        assert_eq!(item.response_time, 3.0);
        assert_eq!(item.recall_time, Some(2.0));

        assert!(session.is_phase_complete());
        assert_eq!(session.question_started_at, question_started_at);
        assert_eq!(session.runtime().stage, Stage::Recall);
        assert!(session.runtime().recall_started_at.is_some());
    }

    #[test]
    fn finalize_requires_finished_and_copies_main_log() {
        let mut session = stroop_session(1, 2);
        assert!(matches!(
            session.finalize("user-1"),
            Err(SessionError::NotFinished { .. })
        ));

        session.advance_phase();
        session.record_response(Answer::choice("red")).unwrap();
        session.advance_phase();
        session.clock_mut().advance(Duration::seconds(2));
        session.record_response(Answer::choice("red")).unwrap();
        session.record_response(Answer::choice("green")).unwrap();
        session.advance_phase();

        let record = session.finalize("user-1").unwrap();
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.test_type, TestType::Stroop);
        assert_eq!(record.responses.len(), 2);
        assert_eq!(record.score, 1);
        assert_eq!(record.accuracy, 50.0);
        assert_eq!(record.metadata.duration_secs, 2.0);
        assert!(record.analysis.is_some());
    }

    #[test]
    fn progress_tracks_active_list() {
        let mut session = stroop_session(2, 3);
        session.advance_phase();
        session.record_response(Answer::choice("red")).unwrap();
        let progress = session.progress();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.remaining, 1);
    }
}
