//! cogtest-core — Cognitive test engine.
//!
//! Generates memory, attention and Stroop questions, grades answers, drives
//! a session through instructions, practice and main phases, and aggregates
//! the results into exportable records.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod model;
pub mod report;
pub mod session;
pub mod statistics;
pub mod time;
pub mod traits;

pub use error::SessionError;
pub use model::{Answer, Phase, Question, QuestionKind, ResponseItem, TestType};
pub use report::TestResultRecord;
pub use session::Session;
pub use statistics::Metrics;
