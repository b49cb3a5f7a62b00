//! The `cogtest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("cogtest.toml").exists() {
        println!("cogtest.toml already exists, skipping.");
    } else {
        std::fs::write("cogtest.toml", SAMPLE_CONFIG)?;
        println!("Created cogtest.toml");
    }

    println!("\nNext steps:");
    println!("  1. Adjust question counts in cogtest.toml");
    println!("  2. Run: cogtest run --test stroop");
    println!("  3. Run: cogtest summarize");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# cogtest configuration

output_dir = "./cogtest-results"
default_user = "anonymous"

[tests.memory]
practice = 3
main = 20

[tests.attention]
practice = 3
main = 20

[tests.stroop]
practice = 5
main = 20
"#;
