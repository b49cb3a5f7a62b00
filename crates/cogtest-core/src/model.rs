//! Core data model types for cogtest.
//!
//! Questions are a closed set of tagged variants, one payload shape per
//! subtype. Answers, response items and their grading metadata live here
//! too, so every other module shares one vocabulary.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The cognitive test families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Memory,
    Attention,
    Stroop,
}

impl TestType {
    /// Every test family, in menu order.
    pub const ALL: [TestType; 3] = [TestType::Memory, TestType::Attention, TestType::Stroop];
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestType::Memory => write!(f, "memory"),
            TestType::Attention => write!(f, "attention"),
            TestType::Stroop => write!(f, "stroop"),
        }
    }
}

impl FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(TestType::Memory),
            "attention" => Ok(TestType::Attention),
            "stroop" => Ok(TestType::Stroop),
            other => Err(format!("unknown test type: {other}")),
        }
    }
}

/// Session phases, in their only legal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Instructions,
    Practice,
    Main,
    Finished,
}

impl Phase {
    /// The phase after this one. `Finished` maps to itself.
    #[must_use]
    pub fn next(self) -> Phase {
        match self {
            Phase::Instructions => Phase::Practice,
            Phase::Practice => Phase::Main,
            Phase::Main | Phase::Finished => Phase::Finished,
        }
    }

    /// Whether questions are presented and answered in this phase.
    #[must_use]
    pub fn is_answerable(self) -> bool {
        matches!(self, Phase::Practice | Phase::Main)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Instructions => write!(f, "instructions"),
            Phase::Practice => write!(f, "practice"),
            Phase::Main => write!(f, "main"),
            Phase::Finished => write!(f, "finished"),
        }
    }
}

/// Colors used by Stroop trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Black,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
        Color::Black,
    ];

    /// Semantic (English) color name, used for grading.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Purple => "purple",
            Color::Black => "black",
        }
    }

    /// The word printed on screen: Turkish, folded to ASCII like
    /// [`WORD_POOL`](crate::generator::WORD_POOL).
    #[must_use]
    pub fn word(self) -> &'static str {
        match self {
            Color::Red => "KIRMIZI",
            Color::Blue => "MAVI",
            Color::Green => "YESIL",
            Color::Yellow => "SARI",
            Color::Purple => "MOR",
            Color::Black => "SIYAH",
        }
    }

    /// Hex code for rendering the ink.
    #[must_use]
    pub fn hex(self) -> &'static str {
        match self {
            Color::Red => "#FF0000",
            Color::Blue => "#0000FF",
            Color::Green => "#00FF00",
            Color::Yellow => "#FFFF00",
            Color::Purple => "#800080",
            Color::Black => "#000000",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either the semantic name or the display word, case-insensitively.
impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Color::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(needle) || c.word().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown color: {needle}"))
    }
}

/// Whether a Stroop word matches its ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StroopCondition {
    Congruent,
    Incongruent,
}

impl fmt::Display for StroopCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StroopCondition::Congruent => write!(f, "congruent"),
            StroopCondition::Incongruent => write!(f, "incongruent"),
        }
    }
}

/// Identifier of a question, unique within its batch and across batches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One word → number association shown in a paired-associate question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordNumberPair {
    pub word: String,
    pub number: u32,
}

/// A generated question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// Stimulus payload, one variant per subtype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    WordListRecall {
        words: Vec<String>,
        encode_seconds: u32,
    },
    NumberSequence {
        digits: String,
        encode_seconds: u32,
    },
    #[serde(rename = "pattern_3x3")]
    Pattern3x3 {
        /// Highlighted cells, 1-9, sorted.
        positions: Vec<u8>,
        encode_seconds: u32,
    },
    PairedAssociate {
        pairs: Vec<WordNumberPair>,
        cue: String,
        answer: u32,
        encode_seconds: u32,
    },
    TargetPresent {
        sequence: String,
        target: char,
        present: bool,
    },
    TargetCount {
        sequence: String,
        target: char,
        count: u32,
    },
    Stroop {
        word: Color,
        ink: Color,
        condition: StroopCondition,
    },
}

/// Flat subtype tag, handy for logging and dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subtype {
    WordListRecall,
    NumberSequence,
    #[serde(rename = "pattern_3x3")]
    Pattern3x3,
    PairedAssociate,
    TargetPresent,
    TargetCount,
    Stroop,
}

impl Subtype {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Subtype::WordListRecall => "word_list_recall",
            Subtype::NumberSequence => "number_sequence",
            Subtype::Pattern3x3 => "pattern_3x3",
            Subtype::PairedAssociate => "paired_associate",
            Subtype::TargetPresent => "target_present",
            Subtype::TargetCount => "target_count",
            Subtype::Stroop => "stroop",
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QuestionKind {
    #[must_use]
    pub fn subtype(&self) -> Subtype {
        match self {
            QuestionKind::WordListRecall { .. } => Subtype::WordListRecall,
            QuestionKind::NumberSequence { .. } => Subtype::NumberSequence,
            QuestionKind::Pattern3x3 { .. } => Subtype::Pattern3x3,
            QuestionKind::PairedAssociate { .. } => Subtype::PairedAssociate,
            QuestionKind::TargetPresent { .. } => Subtype::TargetPresent,
            QuestionKind::TargetCount { .. } => Subtype::TargetCount,
            QuestionKind::Stroop { .. } => Subtype::Stroop,
        }
    }

    /// The test family this subtype belongs to.
    #[must_use]
    pub fn test_type(&self) -> TestType {
        match self {
            QuestionKind::WordListRecall { .. }
            | QuestionKind::NumberSequence { .. }
            | QuestionKind::Pattern3x3 { .. }
            | QuestionKind::PairedAssociate { .. } => TestType::Memory,
            QuestionKind::TargetPresent { .. } | QuestionKind::TargetCount { .. } => {
                TestType::Attention
            }
            QuestionKind::Stroop { .. } => TestType::Stroop,
        }
    }

    /// How long the stimulus is meant to stay visible, for encode→recall subtypes.
    #[must_use]
    pub fn encode_seconds(&self) -> Option<u32> {
        match self {
            QuestionKind::WordListRecall { encode_seconds, .. }
            | QuestionKind::NumberSequence { encode_seconds, .. }
            | QuestionKind::Pattern3x3 { encode_seconds, .. }
            | QuestionKind::PairedAssociate { encode_seconds, .. } => Some(*encode_seconds),
            _ => None,
        }
    }

    /// The canonical correct answer, rendered for feedback.
    #[must_use]
    pub fn expected_answer(&self) -> String {
        match self {
            QuestionKind::WordListRecall { words, .. } => words.join(" "),
            QuestionKind::NumberSequence { digits, .. } => digits.clone(),
            QuestionKind::Pattern3x3 { positions, .. } => positions
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            QuestionKind::PairedAssociate { answer, .. } => answer.to_string(),
            QuestionKind::TargetPresent { present, .. } => presence_label(*present).to_string(),
            QuestionKind::TargetCount { count, .. } => count.to_string(),
            QuestionKind::Stroop { ink, .. } => ink.name().to_string(),
        }
    }
}

/// Choice label for "the target appears in the sequence".
pub const PRESENT_LABEL: &str = "present";
/// Choice label for "the target does not appear".
pub const ABSENT_LABEL: &str = "absent";

/// The choice label matching a presence flag.
#[must_use]
pub fn presence_label(present: bool) -> &'static str {
    if present {
        PRESENT_LABEL
    } else {
        ABSENT_LABEL
    }
}

/// Raw user input, shaped by how the question was answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// Free text (recall lists, digits, numbers).
    Text(String),
    /// A multi-selection, e.g. grid cells.
    Selection(Vec<String>),
    /// A single button/option label.
    Choice(String),
}

impl Answer {
    pub fn text(s: impl Into<String>) -> Self {
        Answer::Text(s.into())
    }

    pub fn choice(s: impl Into<String>) -> Self {
        Answer::Choice(s.into())
    }

    pub fn selection<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Answer::Selection(items.into_iter().map(|s| s.to_string()).collect())
    }

    /// The answer flattened to text. Selections are joined with spaces.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Answer::Text(s) | Answer::Choice(s) => Cow::Borrowed(s),
            Answer::Selection(items) => Cow::Owned(items.join(" ")),
        }
    }
}

/// Subtype-specific grading details attached to a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseMeta {
    #[default]
    Empty,
    /// Word-list recall counts.
    Recall {
        recalled: usize,
        total: usize,
        stimulus_hidden: bool,
    },
    /// Grid selection against the presented pattern.
    Pattern {
        selected: Vec<u8>,
        expected: Vec<u8>,
        stimulus_hidden: bool,
    },
    /// Other memory subtypes.
    Memory { stimulus_hidden: bool },
    Stroop { condition: StroopCondition },
}

impl ResponseMeta {
    #[must_use]
    pub fn condition(&self) -> Option<StroopCondition> {
        match self {
            ResponseMeta::Stroop { condition } => Some(*condition),
            _ => None,
        }
    }

    #[must_use]
    pub fn recalled(&self) -> Option<usize> {
        match self {
            ResponseMeta::Recall { recalled, .. } => Some(*recalled),
            _ => None,
        }
    }
}

/// One graded response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseItem {
    pub question_id: QuestionId,
    pub response: Answer,
    pub correct: bool,
    /// Seconds from presentation to submission, never negative.
    pub response_time: f64,
    /// Seconds from hiding the stimulus to submission, for encode→recall questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall_time: Option<f64>,
    #[serde(default)]
    pub meta: ResponseMeta,
}

/// Stage of a multi-stage (encode → recall) question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Encode,
    Recall,
}

/// Per-question scratch state, reset whenever the cursor moves or the phase changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionRuntime {
    pub stage: Stage,
    pub recall_started_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display_and_parse() {
        assert_eq!(TestType::Stroop.to_string(), "stroop");
        assert_eq!("Memory".parse::<TestType>().unwrap(), TestType::Memory);
        assert_eq!(" attention ".parse::<TestType>().unwrap(), TestType::Attention);
        assert!("reaction".parse::<TestType>().is_err());
    }

    #[test]
    fn phase_transitions_are_linear_and_terminal() {
        assert_eq!(Phase::Instructions.next(), Phase::Practice);
        assert_eq!(Phase::Practice.next(), Phase::Main);
        assert_eq!(Phase::Main.next(), Phase::Finished);
        assert_eq!(Phase::Finished.next(), Phase::Finished);
        assert!(!Phase::Instructions.is_answerable());
        assert!(!Phase::Finished.is_answerable());
    }

    #[test]
    fn color_parses_name_and_display_word() {
        assert_eq!("blue".parse::<Color>().unwrap(), Color::Blue);
        assert_eq!("MAVI".parse::<Color>().unwrap(), Color::Blue);
        assert_eq!("  Siyah ".parse::<Color>().unwrap(), Color::Black);
        assert!("teal".parse::<Color>().is_err());
    }

    #[test]
    fn question_serializes_with_subtype_tag() {
        let q = Question {
            id: QuestionId::new("mem_pattern_3-abc"),
            kind: QuestionKind::Pattern3x3 {
                positions: vec![1, 5, 9],
                encode_seconds: 4,
            },
        };
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "pattern_3x3");
        assert_eq!(json["id"], "mem_pattern_3-abc");

        let back: Question = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn stroop_expected_answer_is_ink() {
        let kind = QuestionKind::Stroop {
            word: Color::Red,
            ink: Color::Green,
            condition: StroopCondition::Incongruent,
        };
        assert_eq!(kind.expected_answer(), "green");
        assert_eq!(kind.test_type(), TestType::Stroop);
        assert_eq!(kind.encode_seconds(), None);
    }

    #[test]
    fn selection_flattens_to_text() {
        let answer = Answer::selection([1, 4, 7]);
        assert_eq!(answer.as_text(), "1 4 7");
    }
}
