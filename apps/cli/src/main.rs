//! Dividend Calendar CLI — dividend history lookups.
//!
//! Commands:
//! - `get` — dividend history of one symbol
//! - `batch` — dividend histories of several symbols at once
//! - `stats` — cache, provider health and effective configuration
//! - `sources` — available providers in default priority order
//!
//! Configuration comes from `DIVIDEND_*` environment variables (and `.env`).
//! Output is JSON on stdout; logs go to stderr.

mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dividend_calendar_data::{DividendService, RetrievalError, ServiceConfig};
use output::{print_json, ErrorResponse};

#[derive(Parser)]
#[command(
    name = "dividend-calendar",
    about = "Dividend history from multiple sources with fallback and caching"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the dividend history of one symbol.
    Get {
        /// Ticker symbol (e.g., AAPL, BRK.B).
        symbol: String,

        /// Provider to use, in order of preference. Repeatable.
        #[arg(long = "source")]
        sources: Vec<String>,

        /// Skip the cache for this lookup.
        #[arg(long, default_value_t = false)]
        no_cache: bool,
    },
    /// Fetch the dividend histories of several symbols concurrently.
    Batch {
        /// Ticker symbols.
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Provider to use, in order of preference. Repeatable.
        #[arg(long = "source")]
        sources: Vec<String>,
    },
    /// Show cache, provider health and configuration.
    Stats,
    /// List available providers.
    Sources,
}

#[derive(Serialize)]
struct SourcesResponse {
    available_sources: Vec<String>,
    default_priority: Vec<String>,
}

fn init_tracing() {
    let log_format = std::env::var("DIVIDEND_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn sources_arg(sources: &[String]) -> Option<&[String]> {
    (!sources.is_empty()).then_some(sources)
}

/// Print a retrieval error in the error response shape and fail.
fn report(error: &RetrievalError, symbol: Option<&str>) -> anyhow::Result<ExitCode> {
    tracing::warn!("Command failed: {}", error);
    print_json(&ErrorResponse::from_retrieval(error, symbol))?;
    Ok(ExitCode::FAILURE)
}

async fn run(cli: Cli, service: &DividendService) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Get {
            symbol,
            sources,
            no_cache,
        } => match service.get(&symbol, sources_arg(&sources), !no_cache).await {
            Ok(result) => {
                print_json(&result)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => report(&e, Some(&symbol)),
        },
        Commands::Batch { symbols, sources } => {
            match service.get_batch(&symbols, sources_arg(&sources)).await {
                Ok(results) => {
                    print_json(&results)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => report(&e, None),
            }
        }
        Commands::Stats => {
            print_json(&service.stats())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sources => {
            let default_priority = service.registry().default_priority();
            let mut available_sources = default_priority.clone();
            available_sources.sort();
            print_json(&SourcesResponse {
                available_sources,
                default_priority,
            })?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let config = ServiceConfig::from_env();
    tracing::debug!("Effective configuration: {:?}", config);
    let service = DividendService::with_builtin_providers(config);

    let outcome = tokio::select! {
        outcome = run(cli, &service) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            Ok(ExitCode::from(130))
        }
    };

    service.shutdown();
    outcome
}
