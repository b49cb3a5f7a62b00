//! Result records with JSON persistence and history summaries.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ResponseItem, TestType};
use crate::statistics::{round_to, StroopMetrics};

/// The exported result of one finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResultRecord {
    /// Unique record identifier.
    pub id: Uuid,
    pub user_id: String,
    pub test_type: TestType,
    /// Correct main-phase responses.
    pub score: u32,
    /// Percentage correct, 2 decimal places.
    pub accuracy: f64,
    /// Mean response time in seconds, 3 decimal places.
    pub average_response_time: f64,
    /// Main-phase responses in answer order.
    pub responses: Vec<ResponseItem>,
    pub metadata: RecordMetadata,
    /// Stroop effect and error rate, Stroop records only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<StroopMetrics>,
}

/// Timing of the session a record came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Wall-clock seconds from start to finalize.
    pub duration_secs: f64,
}

impl TestResultRecord {
    /// File name used when writing the record into a results directory.
    pub fn file_name(&self) -> String {
        format!(
            "result-{}-{}.json",
            self.metadata.completed_at.format("%Y%m%d-%H%M%S"),
            self.id.simple()
        )
    }

    /// Save the record as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize record")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write record to {}", path.display()))?;
        Ok(())
    }

    /// Load a record from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read record from {}", path.display()))?;
        let record: TestResultRecord =
            serde_json::from_str(&content).context("failed to parse record JSON")?;
        Ok(record)
    }
}

/// Load every `*.json` record in a directory, oldest first.
///
/// Unreadable or malformed files are logged and skipped.
pub fn load_records_dir(dir: &Path) -> Result<Vec<TestResultRecord>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut records = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        match TestResultRecord::load_json(&path) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("skipping {}: {:#}", path.display(), e);
            }
        }
    }

    records.sort_by_key(|r| r.metadata.completed_at);
    Ok(records)
}

/// Aggregates over all records of one test type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestTypeSummary {
    pub test_type: TestType,
    pub attempts: usize,
    pub mean_score: f64,
    pub mean_accuracy: f64,
    pub mean_response_time: f64,
    pub best_score: u32,
    /// Completion time of the most recent attempt.
    pub latest: DateTime<Utc>,
}

/// Per-test aggregates plus the strongest and weakest test by mean accuracy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub per_test: Vec<TestTypeSummary>,
    pub strongest: Option<TestType>,
    pub weakest: Option<TestType>,
}

/// Summarize a user's result history.
///
/// With a single test type attempted, it is both strongest and weakest.
pub fn summarize_records(records: &[TestResultRecord]) -> HistorySummary {
    let mut grouped: BTreeMap<TestType, Vec<&TestResultRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.test_type).or_default().push(record);
    }

    let per_test: Vec<TestTypeSummary> = grouped
        .into_iter()
        .filter_map(|(test_type, group)| {
            let n = group.len() as f64;
            let mean_of = |values: Vec<f64>| values.iter().sum::<f64>() / n;
            Some(TestTypeSummary {
                test_type,
                attempts: group.len(),
                mean_score: round_to(mean_of(group.iter().map(|r| f64::from(r.score)).collect()), 2),
                mean_accuracy: round_to(mean_of(group.iter().map(|r| r.accuracy).collect()), 2),
                mean_response_time: round_to(
                    mean_of(group.iter().map(|r| r.average_response_time).collect()),
                    3,
                ),
                best_score: group.iter().map(|r| r.score).max()?,
                latest: group.iter().map(|r| r.metadata.completed_at).max()?,
            })
        })
        .collect();

    let by_accuracy = |a: &&TestTypeSummary, b: &&TestTypeSummary| {
        a.mean_accuracy.total_cmp(&b.mean_accuracy)
    };
    let strongest = per_test.iter().max_by(by_accuracy).map(|s| s.test_type);
    let weakest = per_test.iter().min_by(by_accuracy).map(|s| s.test_type);

    HistorySummary {
        per_test,
        strongest,
        weakest,
    }
}
