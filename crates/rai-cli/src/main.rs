//! RAI CLI - terminal front end for the RAI wellness coach.

use clap::{Parser, Subcommand};

mod commands;
mod progress;

/// RAI - a private wellness coach running on your own machine
#[derive(Parser)]
#[command(name = "rai")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a coaching conversation
    Chat {
        /// Model to load (default: RAI_MODEL or the recommended model)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the models in the catalog
    Models {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage model artifacts
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Inspect or clear the model cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show information about the RAI installation
    Info,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download a model into the cache
    Pull {
        /// Model id (default: the recommended model)
        id: Option<String>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cached model size
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every cached model
    Clear,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins over --verbose
    let filter = if cli.verbose { "debug" } else { "warn" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| miette::miette!("Failed to start async runtime: {}", e))?;

    match cli.command {
        Commands::Chat { model } => runtime.block_on(commands::chat::run(model.as_deref())),
        Commands::Models { json } => runtime.block_on(commands::models::run(json)),
        Commands::Model {
            action: ModelAction::Pull { id },
        } => runtime.block_on(commands::model::pull(id.as_deref())),
        Commands::Cache { action } => match action {
            CacheAction::Status { json } => runtime.block_on(commands::cache::status(json)),
            CacheAction::Clear => runtime.block_on(commands::cache::clear()),
        },
        Commands::Info => commands::info::run(),
    }
}
