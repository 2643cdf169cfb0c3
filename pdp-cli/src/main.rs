//! The `pdp-extract` binary turns product detail pages into catalog rows.

use clap::{Parser, Subcommand};
use openrouter_adapter::{discover_api_key, OpenRouterClient, OpenRouterConfig};
use pdp_cli::args;
use pdp_cli::commands::{self, Settings};
use pdp_cli::{CliError, OpenRouterGateway};
use pdp_extract::extraction::{ExtractionConfig, DEFAULT_MODEL};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding input pages and the default output CSV
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Newline-delimited category taxonomy
    #[arg(long, global = true, default_value = "categories.txt")]
    categories: PathBuf,

    /// Model id used for extraction
    #[arg(long, global = true, default_value = DEFAULT_MODEL)]
    model: String,

    /// Spend ceiling per page, in USD
    #[arg(long, global = true, default_value_t = 1.0, value_parser = args::parse_budget)]
    budget: f64,

    /// Attempts per phase before giving up
    #[arg(long, global = true, default_value_t = 5, value_parser = args::parse_max_attempts)]
    max_attempts: usize,

    /// Reject products whose category differs from the inferred one
    #[arg(long, global = true)]
    pin_category: bool,

    /// OpenRouter API key (default: `OPEN_ROUTER_API_KEY`)
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one page, or every .html page in the data directory
    Extract {
        /// HTML file name; relative names are looked up in the data directory
        file: Option<PathBuf>,
        /// Output CSV (default: <data-dir>/data_out.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run several models against one page and record time, cost and output
    Compare {
        /// HTML file (default: first .html in the data directory)
        #[arg(long)]
        html: Option<PathBuf>,
        /// Comma-separated model ids
        #[arg(long, value_delimiter = ',', default_values_t = commands::compare::default_models())]
        models: Vec<String>,
        /// Results JSON file
        #[arg(long, default_value = commands::compare::DEFAULT_RESULTS)]
        out: PathBuf,
    },
    /// Show usage and remaining credit for the API key
    Balance,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let api_key = discover_api_key(cli.api_key.clone())?;
    let client = OpenRouterClient::new(api_key, OpenRouterConfig::default())?;

    let settings = Settings {
        data_dir: cli.data_dir,
        categories: cli.categories,
        config: ExtractionConfig::default()
            .with_model(cli.model)
            .with_budget_usd(cli.budget)
            .with_max_attempts(cli.max_attempts)
            .with_pin_category(cli.pin_category),
    };

    match cli.command {
        Commands::Extract { file, out } => {
            let gateway = Arc::new(OpenRouterGateway::new(client));
            let summary = commands::extract::run(&settings, gateway, file.as_deref(), out).await?;
            tracing::info!(
                processed = summary.total(),
                failed = summary.failed.len(),
                spent_usd = summary.spent_usd,
                "Extraction finished"
            );
        }
        Commands::Compare { html, models, out } => {
            let gateway = Arc::new(OpenRouterGateway::new(client));
            commands::compare::run(&settings, gateway, html.as_deref(), &models, &out).await?;
        }
        Commands::Balance => {
            commands::balance::run(&client).await?;
        }
    }

    Ok(())
}
