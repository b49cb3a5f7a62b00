//! cogtest CLI — run cognitive tests in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use cogtest_core::model::TestType;

mod commands;

#[derive(Parser)]
#[command(name = "cogtest", version, about = "Memory, attention and Stroop tests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a test interactively
    Run {
        /// Test to run: memory, attention or stroop
        #[arg(long)]
        test: TestType,

        /// User id stamped on the result (default: from config)
        #[arg(long)]
        user: Option<String>,

        /// Output directory (default: from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Seed for reproducible question batches
        #[arg(long)]
        seed: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print a batch of generated questions as JSON
    Generate {
        /// Test to generate for: memory, attention or stroop
        #[arg(long)]
        test: TestType,

        /// Number of questions
        #[arg(long, default_value = "5")]
        count: usize,

        /// Seed for reproducible question batches
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Summarize saved results
    Summarize {
        /// Results directory (default: from config)
        #[arg(long)]
        results: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cogtest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            test,
            user,
            output,
            seed,
            config,
        } => commands::run::execute(test, user, output, seed, config).await,
        Commands::Generate { test, count, seed } => commands::generate::execute(test, count, seed),
        Commands::Summarize {
            results,
            format,
            config,
        } => commands::summarize::execute(results, format, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
