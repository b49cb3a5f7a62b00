//! The `cogtest summarize` command.

use std::path::PathBuf;

use anyhow::Result;

use cogtest_core::config::load_config_from;
use cogtest_core::report::{load_records_dir, summarize_records, HistorySummary};

pub fn execute(results: Option<PathBuf>, format: String, config_path: Option<PathBuf>) -> Result<()> {
    let dir = match results {
        Some(dir) => dir,
        None => load_config_from(config_path.as_deref())?.output_dir,
    };

    let records = load_records_dir(&dir)?;
    let summary = summarize_records(&records);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            println!("{} result(s) in {}", records.len(), dir.display());
            if records.is_empty() {
                return Ok(());
            }
            println!("\n{}", summary_table(&summary));
            if let (Some(strongest), Some(weakest)) = (summary.strongest, summary.weakest) {
                println!("\nStrongest: {strongest}");
                println!("Weakest: {weakest}");
            }
        }
    }

    Ok(())
}

fn summary_table(summary: &HistorySummary) -> comfy_table::Table {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Test",
        "Attempts",
        "Mean score",
        "Best",
        "Mean accuracy",
        "Mean RT",
        "Latest",
    ]);

    for s in &summary.per_test {
        table.add_row(vec![
            Cell::new(s.test_type),
            Cell::new(s.attempts),
            Cell::new(format!("{:.2}", s.mean_score)),
            Cell::new(s.best_score),
            Cell::new(format!("{:.2}%", s.mean_accuracy)),
            Cell::new(format!("{:.3}s", s.mean_response_time)),
            Cell::new(s.latest.format("%Y-%m-%d %H:%M")),
        ]);
    }

    table
}
