//! CLI entry point for the GTFS-RT arrivals tool.
//!
//! Provides subcommands for a single live query, repeated sampling of one
//! stop, and offline inspection of a saved feed.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use gtfs_rt_arrivals::alerts::match_alerts;
use gtfs_rt_arrivals::arrivals::extract_arrivals;
use gtfs_rt_arrivals::config::FeedConfig;
use gtfs_rt_arrivals::fetch::{ApiKey, BasicClient, FeedSource, HttpClient};
use gtfs_rt_arrivals::output::{QueryRecord, append_record, print_json, print_pretty};
use gtfs_rt_arrivals::parser::decode_feed;
use gtfs_rt_arrivals::routes::MtaRouteTable;
use gtfs_rt_arrivals::{FeedQueryEngine, Query, QueryResponse};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gtfs_rt_arrivals")]
#[command(about = "Next arrivals and service alerts from GTFS-RT feeds", long_about = None)]
struct Cli {
    /// JSON config file; defaults to environment variables
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the next arrivals and active alerts for a route at a stop
    Query {
        #[arg(short, long)]
        route: String,

        #[arg(short, long)]
        stop: String,

        /// rail or bus
        #[arg(short = 't', long = "type", default_value = "rail")]
        vehicle_type: String,

        /// Print the response as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Repeat a query at a fixed interval
    Watch {
        #[arg(short, long)]
        route: String,

        #[arg(short, long)]
        stop: String,

        /// rail or bus
        #[arg(short = 't', long = "type", default_value = "rail")]
        vehicle_type: String,

        /// Seconds between samples
        #[arg(short, long, default_value_t = 30)]
        interval: u64,

        /// Number of samples to collect (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        samples: usize,

        /// CSV file to append one row per sample to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Decode a saved feed and run arrival and alert matching on it
    Inspect {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[arg(short, long)]
        route: String,

        #[arg(short, long)]
        stop: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gtfs_rt_arrivals.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_rt_arrivals.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FeedConfig::load(path)?,
        None => FeedConfig::from_env(),
    };

    match cli.command {
        Commands::Query {
            route,
            stop,
            vehicle_type,
            json,
        } => {
            let engine = build_engine(&config)?;
            let response = engine.run_query(&route, &stop, &vehicle_type).await?;
            show(&response, json)?;
        }
        Commands::Watch {
            route,
            stop,
            vehicle_type,
            interval,
            samples,
            output,
        } => {
            let query = Query::parse(&route, &stop, &vehicle_type)?;
            let engine = build_engine(&config)?;
            watch(&engine, &query, interval, samples, output.as_deref()).await?;
        }
        Commands::Inspect {
            source,
            route,
            stop,
        } => {
            inspect(&config, &source, &route, &stop).await?;
        }
    }

    Ok(())
}

fn show(response: &QueryResponse, json: bool) -> Result<()> {
    if json {
        print_json(response)
    } else {
        print_pretty(response);
        Ok(())
    }
}

/// HTTP client for all feed requests, with the API key header when configured.
fn build_client(config: &FeedConfig) -> Result<Box<dyn HttpClient>> {
    let basic = BasicClient::with_connect_timeout(Duration::from_secs(10))?;
    let client: Box<dyn HttpClient> = match &config.api_key {
        Some(key) => Box::new(ApiKey::new(basic, &config.api_key_header, key)?),
        None => Box::new(basic),
    };
    Ok(client)
}

type Engine = FeedQueryEngine<Box<dyn HttpClient>, MtaRouteTable>;

fn build_engine(config: &FeedConfig) -> Result<Engine> {
    Ok(FeedQueryEngine::new(
        build_client(config)?,
        MtaRouteTable::new(config)?,
        config.alert_feed_url.clone(),
    ))
}

/// Runs `query` every `interval` seconds, logging each result and optionally
/// appending it to a CSV file. A failed sample is recorded, not fatal.
#[tracing::instrument(skip(engine, query), fields(route = %query.route, stop = %query.stop))]
async fn watch(
    engine: &Engine,
    query: &Query,
    interval: u64,
    samples: usize,
    output: Option<&str>,
) -> Result<()> {
    if samples == 0 {
        info!(interval, "Sampling infinitely. Press Ctrl+C to stop.");
    } else {
        info!(samples, interval, "Starting sample collection");
    }

    let mut sample_count = 0;
    loop {
        if samples > 0 && sample_count >= samples {
            break;
        }
        sample_count += 1;

        let now = Utc::now();
        let record = match engine.run_query_at(query, now).await {
            Ok(response) => {
                print_pretty(&response);
                QueryRecord::from_response(now, &response)
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Query failed");
                QueryRecord::from_error(now, &query.route, &query.stop, &e)
            }
        };

        if let Some(path) = output {
            if let Err(e) = append_record(path, &record) {
                error!(error = %e, path, "Failed to write sample");
            }
        }

        if samples == 0 || sample_count < samples {
            tokio::time::sleep(Duration::from_secs(interval)).await;
        }
    }

    info!(sample_count, "Finished sampling");
    Ok(())
}

/// Loads feed data from a local file path or fetches it over HTTP, then runs
/// both extractors against it.
#[tracing::instrument(skip(config), fields(source = %source))]
async fn inspect(config: &FeedConfig, source: &str, route: &str, stop: &str) -> Result<()> {
    let bytes = if source.starts_with("http") {
        build_client(config)?.fetch_bytes(source).await?.to_vec()
    } else {
        std::fs::read(source)?
    };

    let feed = decode_feed(&bytes)?;
    let now = Utc::now();
    info!(
        trip_updates = feed.trip_updates().count(),
        alerts = feed.alerts().count(),
        "Feed decoded"
    );

    let response = QueryResponse {
        route: route.to_string(),
        stop: stop.to_string(),
        arrivals: extract_arrivals(&feed, route, stop, now),
        alerts: match_alerts(&feed, route, stop, now),
    };
    print_json(&response)
}
