//! Metric aggregation over response logs.
//!
//! Everything here is a pure function of the log, so metrics can be
//! recomputed at any time and never go stale.

use serde::{Deserialize, Serialize};

use crate::model::{ResponseItem, StroopCondition, TestType};

/// Headline metrics for one response log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Number of correct responses.
    pub score: u32,
    /// Percentage correct, 2 decimal places.
    pub accuracy: f64,
    /// Mean response time in seconds, 3 decimal places.
    pub avg_response_time: f64,
    /// Present only for Stroop logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroop: Option<StroopMetrics>,
}

/// Stroop-specific derived metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StroopMetrics {
    /// Mean incongruent RT minus mean congruent RT, in seconds.
    pub stroop_effect: f64,
    /// 100 minus accuracy.
    pub error_rate: f64,
}

/// Compute metrics for a response log.
///
/// An empty log yields zero-valued metrics (including zero Stroop extras).
pub fn compute_metrics(test_type: TestType, responses: &[ResponseItem]) -> Metrics {
    let total = responses.len();
    let correct = responses.iter().filter(|r| r.correct).count();

    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };
    let avg_response_time = mean(responses.iter().map(|r| r.response_time)).unwrap_or(0.0);

    let stroop = (test_type == TestType::Stroop).then(|| StroopMetrics {
        stroop_effect: round_to(stroop_effect(responses), 3),
        error_rate: if total == 0 {
            0.0
        } else {
            round_to(100.0 - accuracy, 2)
        },
    });

    Metrics {
        score: u32::try_from(correct).unwrap_or(u32::MAX),
        accuracy: round_to(accuracy, 2),
        avg_response_time: round_to(avg_response_time, 3),
        stroop,
    }
}

/// Mean incongruent response time minus mean congruent response time.
///
/// Returns 0.0 unless both conditions have at least one response.
pub fn stroop_effect(responses: &[ResponseItem]) -> f64 {
    let by_condition = |condition: StroopCondition| {
        mean(
            responses
                .iter()
                .filter(|r| r.meta.condition() == Some(condition))
                .map(|r| r.response_time),
        )
    };

    match (
        by_condition(StroopCondition::Incongruent),
        by_condition(StroopCondition::Congruent),
    ) {
        (Some(incongruent), Some(congruent)) => incongruent - congruent,
        _ => 0.0,
    }
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
