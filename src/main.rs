use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Benchmark fuzzy search methods over a product catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register fuzzy functions and rebuild the full-text index
    Prepare {
        /// Path to the run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Run every method against every scenario and record observations
    Run {
        /// Path to the run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Override the configured worker count
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List the search methods a run would benchmark
    Methods {
        /// Path to the run configuration (TOML); built-in methods if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Summarize recorded observations
    Report {
        /// Path to the catalog database holding `search_benchmarks`
        #[arg(long)]
        db: PathBuf,

        /// Only observations from this session
        #[arg(long)]
        session: Option<String>,

        /// Only observations for this method
        #[arg(long)]
        method: Option<String>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare { config, json } => {
            commands::prepare::execute(&config, json)?;
        }
        Commands::Run {
            config,
            workers,
            json,
        } => {
            commands::run::execute(commands::run::RunOptions {
                config,
                workers,
                json,
            })?;
        }
        Commands::Methods { config, json } => {
            commands::methods::execute(config.as_deref(), json)?;
        }
        Commands::Report {
            db,
            session,
            method,
            json,
        } => {
            commands::report::execute(commands::report::ReportOptions {
                db,
                session,
                method,
                json,
            })?;
        }
    }

    Ok(())
}
