//! adaptest CLI: interactive adaptive multiple-choice assessment.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "adaptest",
    version,
    about = "Adaptive multiple-choice language assessment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive assessment session
    Run {
        /// Path to the JSON question bank
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Number of questions to complete
        #[arg(long)]
        quota: Option<u32>,

        /// Test-taker name, used in export file names
        #[arg(long)]
        name: Option<String>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: csv, json, html, all (comma-separated)
        #[arg(long)]
        format: Option<String>,

        /// Seed for reproducible question selection
        #[arg(long)]
        seed: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a question bank
    Validate {
        /// Path to the JSON question bank
        #[arg(long)]
        bank: PathBuf,

        /// Config file path (for the level ladder)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Summarize a saved JSON session log
    Summary {
        /// Session log JSON
        #[arg(long)]
        log: PathBuf,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path (for the level ladder)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and sample question bank
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        "adaptest=info"
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            bank,
            quota,
            name,
            output,
            format,
            seed,
            config,
        } => {
            commands::run::execute(commands::run::RunArgs {
                bank,
                quota,
                name,
                output,
                format,
                seed,
                config,
            })
            .await
        }
        Commands::Validate { bank, config } => commands::validate::execute(bank, config),
        Commands::Summary {
            log,
            format,
            config,
        } => commands::summary::execute(log, format, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
