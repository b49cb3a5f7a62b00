//! The `cogtest generate` command.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cogtest_core::generator::{generate, generate_with_rng};
use cogtest_core::model::TestType;

pub fn execute(test_type: TestType, count: usize, seed: Option<u64>) -> Result<()> {
    anyhow::ensure!(count >= 1, "count must be at least 1");

    let questions = match seed {
        Some(seed) => generate_with_rng(test_type, count, &mut StdRng::seed_from_u64(seed)),
        None => generate(test_type, count),
    };
    tracing::debug!(test_type = %test_type, count = questions.len(), "generated questions");

    println!("{}", serde_json::to_string_pretty(&questions)?);
    Ok(())
}
