//! fisio-api - Attendance dashboard data service and query tool
//!
//! `serve` loads the bulk CSV and exposes the dashboard query endpoints.
//! `query` initializes a dashboard (remote API first, local CSV as fallback)
//! and prints one query result as JSON.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use fisio_api::{build_router, AppState};
use fisio_common::config::{ConfigOverrides, DashboardConfig};
use fisio_common::model::DEFAULT_TOP_N;
use fisio_common::normalize::normalize_neighborhood;
use fisio_common::source::BulkLocation;
use fisio_common::{Dashboard, LocalSource, YearFilter};

#[derive(Debug, Parser)]
#[command(name = "fisio-api", version, about = "Attendance dashboard data service")]
struct Cli {
    /// TOML config file (default: <config dir>/fisio-dash/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Bulk CSV location, file path or http(s) URL
    #[arg(long, global = true, value_name = "PATH_OR_URL")]
    data_file: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the query endpoints from the bulk CSV
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run one query and print the result as JSON
    Query {
        /// Remote API base URL (falls back to the bulk CSV when unset or unreachable)
        #[arg(long)]
        api_base_url: Option<String>,

        #[command(subcommand)]
        query: QueryCommand,
    },
}

#[derive(Debug, Subcommand)]
enum QueryCommand {
    Years,
    Neighborhoods,
    Summary(FilterArgs),
    /// Visits per year
    Series {
        #[arg(long = "bairro", value_name = "NEIGHBORHOOD")]
        neighborhoods: Vec<String>,
    },
    /// Neighborhoods ranked by visits
    Top {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long, default_value_t = DEFAULT_TOP_N)]
        n: usize,
    },
    Table(FilterArgs),
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Year or ALL_YEARS
    #[arg(long, default_value = "ALL_YEARS")]
    year: YearFilter,

    /// Neighborhood filter, repeatable
    #[arg(long = "bairro", value_name = "NEIGHBORHOOD")]
    neighborhoods: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (api_base_url, bind_address) = match &cli.command {
        Command::Serve { bind } => (None, bind.clone()),
        Command::Query { api_base_url, .. } => (api_base_url.clone(), None),
    };
    let config = DashboardConfig::resolve(&ConfigOverrides {
        config_file: cli.config.clone(),
        api_base_url,
        data_file: cli.data_file.clone(),
        bind_address,
        request_timeout_ms: cli.timeout_ms,
    })?;

    // Logs go to stderr so `query` output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { .. } => serve(config).await,
        Command::Query { query, .. } => run_query(config, query).await,
    }
}

async fn serve(config: DashboardConfig) -> Result<()> {
    info!(
        "Starting fisio-api v{} (data: {})",
        env!("CARGO_PKG_VERSION"),
        config.data_file
    );

    let location = BulkLocation::parse(&config.data_file);
    let source = match LocalSource::open(location, config.request_timeout).await {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to load attendance data: {}", e);
            return Err(e.into());
        }
    };

    let app = build_router(AppState::new(Arc::new(source)));

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("fisio-api listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_query(config: DashboardConfig, query: QueryCommand) -> Result<()> {
    let dashboard = Dashboard::new(config);
    let kind = dashboard.initialize().await?;
    info!("Using {} data source", kind);

    match query {
        QueryCommand::Years => print_json(&dashboard.years().await?),
        QueryCommand::Neighborhoods => print_json(&dashboard.neighborhoods().await?),
        QueryCommand::Summary(filter) => print_json(
            &dashboard
                .summary(filter.year, &canonical(&filter.neighborhoods))
                .await?,
        ),
        QueryCommand::Series { neighborhoods } => {
            print_json(&dashboard.time_series(&canonical(&neighborhoods)).await?)
        }
        QueryCommand::Top { filter, n } => print_json(
            &dashboard
                .top_neighborhoods(filter.year, &canonical(&filter.neighborhoods), n)
                .await?,
        ),
        QueryCommand::Table(filter) => print_json(
            &dashboard
                .table(filter.year, &canonical(&filter.neighborhoods))
                .await?,
        ),
    }
}

/// Labels typed on the command line get the same canonical form as the data
fn canonical(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .map(|label| normalize_neighborhood(Some(label)))
        .filter(|key| !key.is_empty())
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
