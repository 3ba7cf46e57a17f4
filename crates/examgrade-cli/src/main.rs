//! examgrade CLI: grade exam attempts from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use examgrade_store::config::{load_config_from, ExamgradeConfig, StoreConfig};

mod commands;

#[derive(Parser)]
#[command(name = "examgrade", version, about = "Exam auto-grading engine")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store directory (overrides the config file)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one attempt and save the result
    Evaluate {
        /// Attempt id
        #[arg(long)]
        attempt: String,

        /// Print the evaluated attempt as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-grade every finished attempt of an exam
    Regrade {
        /// Exam id
        #[arg(long)]
        exam: String,

        /// Max concurrent attempts (defaults to the config value)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Report output directory (defaults to the config value)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show statistics for an exam's evaluated attempts
    Summary {
        /// Exam id
        #[arg(long)]
        exam: String,
    },

    /// Check stored exams and attempts for grading problems
    Validate,

    /// Create a starter config and sample store
    Init,
}

fn init_tracing(config: &ExamgradeConfig) {
    let directive = config
        .log_filter
        .clone()
        .unwrap_or_else(|| "examgrade=info".to_string());
    let filter = match directive.parse() {
        Ok(d) => tracing_subscriber::EnvFilter::from_default_env().add_directive(d),
        Err(_) => {
            eprintln!("Warning: ignoring invalid log_filter '{directive}'");
            tracing_subscriber::EnvFilter::from_default_env()
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match cli.command {
        Commands::Init => ExamgradeConfig::default(),
        _ => match load_config_from(cli.config.as_deref()) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {e:#}");
                process::exit(1);
            }
        },
    };
    if let Some(path) = cli.store {
        config.store = StoreConfig::JsonDir { path };
    }

    init_tracing(&config);

    let result = match cli.command {
        Commands::Evaluate { attempt, json } => {
            commands::evaluate::execute(&config, &attempt, json).await
        }
        Commands::Regrade {
            exam,
            parallelism,
            output,
        } => commands::regrade::execute(&config, &exam, parallelism, output).await,
        Commands::Summary { exam } => commands::summary::execute(&config, &exam).await,
        Commands::Validate => commands::validate::execute(&config).await,
        Commands::Init => commands::init::execute(&config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
