//! Session error types.
//!
//! These are precondition violations: they signal a driver bug (asking for a
//! question that does not exist, finalizing too early), never bad user input.
//! Malformed answers are graded incorrect by the evaluator instead.

use thiserror::Error;

use crate::model::Phase;

/// Errors returned by [`Session`](crate::session::Session) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    /// The cursor is past the end of the active question list.
    #[error("no question at index {index} in the {phase} phase; check is_phase_complete() first")]
    Exhausted { phase: Phase, index: usize },

    /// The current phase does not present questions.
    #[error("the {phase} phase has no questions to answer")]
    NotAnswerable { phase: Phase },

    /// Results were requested before the session reached `finished`.
    #[error("session is in the {phase} phase; results are only available once finished")]
    NotFinished { phase: Phase },
}
