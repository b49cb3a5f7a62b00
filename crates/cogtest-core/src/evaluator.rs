//! Answer grading.
//!
//! `evaluate` is pure: it never mutates the question and never fails.
//! Unparseable input is graded incorrect through an explicit branch.

use std::collections::HashSet;

use crate::model::{
    Answer, Color, Question, QuestionKind, QuestionRuntime, ResponseMeta, Stage, TestType,
    ABSENT_LABEL, PRESENT_LABEL,
};

/// Result of grading one answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub correct: bool,
    pub meta: ResponseMeta,
}

impl Evaluation {
    fn new(correct: bool, meta: ResponseMeta) -> Self {
        Self { correct, meta }
    }

    fn incorrect() -> Self {
        Self::default()
    }
}

/// Grade `answer` against `question` for a session of `test_type`.
///
/// A question whose subtype does not belong to `test_type` is graded
/// incorrect with empty metadata.
pub fn evaluate(
    test_type: TestType,
    question: &Question,
    answer: &Answer,
    runtime: &QuestionRuntime,
) -> Evaluation {
    if question.kind.test_type() != test_type {
        return Evaluation::incorrect();
    }

    let stimulus_hidden = runtime.stage == Stage::Recall;

    match &question.kind {
        QuestionKind::WordListRecall { words, .. } => {
            let presented: HashSet<String> = words.iter().map(|w| normalize(w)).collect();
            let text = answer.as_text();
            let typed: HashSet<String> = text.split_whitespace().map(normalize).collect();
            let recalled = presented.intersection(&typed).count();
            let total = presented.len();
            let threshold = (total / 3).max(1);
            Evaluation::new(
                recalled >= threshold,
                ResponseMeta::Recall {
                    recalled,
                    total,
                    stimulus_hidden,
                },
            )
        }
        QuestionKind::NumberSequence { digits, .. } => Evaluation::new(
            answer.as_text().trim() == digits.trim(),
            ResponseMeta::Memory { stimulus_hidden },
        ),
        QuestionKind::Pattern3x3 { positions, .. } => {
            let selected = parse_selection(answer).unwrap_or_default();
            let mut expected = positions.clone();
            expected.sort_unstable();
            expected.dedup();
            Evaluation::new(
                selected == expected,
                ResponseMeta::Pattern {
                    selected,
                    expected,
                    stimulus_hidden,
                },
            )
        }
        QuestionKind::PairedAssociate {
            answer: expected, ..
        } => {
            let correct = match parse_integer(&answer.as_text()) {
                Some(n) => n == i64::from(*expected),
                None => false,
            };
            Evaluation::new(correct, ResponseMeta::Memory { stimulus_hidden })
        }
        QuestionKind::TargetPresent { present, .. } => {
            let correct = match parse_presence(&answer.as_text()) {
                Some(choice) => choice == *present,
                None => false,
            };
            Evaluation::new(correct, ResponseMeta::Empty)
        }
        QuestionKind::TargetCount { count, .. } => {
            let correct = match parse_integer(&answer.as_text()) {
                Some(n) => n == i64::from(*count),
                None => false,
            };
            Evaluation::new(correct, ResponseMeta::Empty)
        }
        QuestionKind::Stroop { ink, condition, .. } => {
            let chosen = answer.as_text().parse::<Color>().ok();
            Evaluation::new(
                chosen == Some(*ink),
                ResponseMeta::Stroop {
                    condition: *condition,
                },
            )
        }
    }
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

fn parse_integer(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// Map a choice label to a presence flag.
fn parse_presence(label: &str) -> Option<bool> {
    let label = label.trim();
    if label.eq_ignore_ascii_case(PRESENT_LABEL) || label.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if label.eq_ignore_ascii_case(ABSENT_LABEL) || label.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// Parse grid cells (1-9) into a sorted set. Any malformed or out-of-range
/// value rejects the whole selection.
fn parse_selection(answer: &Answer) -> Option<Vec<u8>> {
    let raw: Vec<&str> = match answer {
        Answer::Selection(items) => items.iter().map(String::as_str).collect(),
        Answer::Text(text) | Answer::Choice(text) => text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect(),
    };

    let mut cells = raw
        .into_iter()
        .map(|s| s.trim().parse::<u8>().ok().filter(|n| (1..=9).contains(n)))
        .collect::<Option<Vec<u8>>>()?;
    cells.sort_unstable();
    cells.dedup();
    Some(cells)
}
