mod compare;
mod resolve;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::compare::CompareArgs;

#[derive(Debug, Parser)]
#[command(name = "prodcmp")]
#[command(about = "Compare a marketplace product against similar alternatives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Find comparable products and rank them with weighted scores
    Compare(CompareArgs),
    /// Show how an input would be interpreted, without fetching anything
    Resolve {
        /// Product name, ASIN, or marketplace product URL
        input: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = prodcmp_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compare(args) => compare::run_compare(&config, &args).await,
        Commands::Resolve { input } => resolve::run_resolve(&config, &input),
    }
}
