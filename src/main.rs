//! CLI entry point for the solar dashboard.
//!
//! Provides subcommands for summarizing a readings file, printing the
//! monthly and chart series, checking the weather estimate, and running the
//! periodic refresh loop.

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use solar_dashboard::analyzers::window::TimeWindow;
use solar_dashboard::config::DashboardConfig;
use solar_dashboard::dashboard::Dashboard;
use solar_dashboard::output::{append_record, print_json, print_pretty};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "solar_dashboard")]
#[command(about = "Derives solar production metrics from household energy readings", long_about = None)]
struct Cli {
    /// JSON configuration file (rates, panels, location, locale)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Instant the windows are anchored to, e.g. 2025-06-30T12:00 (default: now)
    #[arg(long, global = true, value_parser = parse_reference)]
    reference: Option<NaiveDateTime>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one fetch cycle and print the dashboard summary
    Summary {
        /// Path to file or URL to fetch
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to append the summary to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print production and expenditure for the last 12 months
    Monthly {
        /// Path to file or URL to fetch
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: String,
    },
    /// Print the production-vs-consumption chart series
    Series {
        /// Path to file or URL to fetch
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: String,

        /// Time range: 1d, 7d, 30d or 365d
        #[arg(short, long, default_value = "7d")]
        range: TimeWindow,
    },
    /// Print the current weather and panel efficiency estimate
    Weather,
    /// Refresh the dashboard periodically
    Watch {
        /// Path to file or URL to fetch
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to append each summary to
        #[arg(short, long, default_value = "dashboard_history.csv")]
        output: String,

        /// Number of refresh cycles (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        num_cycles: usize,
    },
}

fn parse_reference(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| format!("invalid reference '{value}': {e}"))
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/solar_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("solar_dashboard.log"));

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

    let config = DashboardConfig::load(cli.config.as_deref())?;
    info!(
        live_weather = config.weather.api_key.is_some(),
        refresh_interval_secs = config.refresh_interval_secs,
        "Configuration loaded"
    );

    let fixed_reference = cli.reference;
    let dashboard = Dashboard::new(config);

    match cli.command {
        Commands::Summary { source, output } => {
            let reference = fixed_reference.unwrap_or_else(local_now);
            let snapshot = dashboard.load_snapshot(&source, reference).await;
            let stats = dashboard.summarize(&snapshot, reference);

            print_pretty(&snapshot.weather);
            print_json(&stats)?;
            if let Some(output) = output {
                append_record(&output, &stats)?;
            }
        }
        Commands::Monthly { source } => {
            let reference = fixed_reference.unwrap_or_else(local_now);
            let snapshot = dashboard.load_snapshot(&source, reference).await;
            print_json(&dashboard.monthly(&snapshot, reference))?;
        }
        Commands::Series { source, range } => {
            let reference = fixed_reference.unwrap_or_else(local_now);
            let snapshot = dashboard.load_snapshot(&source, reference).await;
            let series = dashboard.series(&snapshot, range, reference);

            info!(points = series.len(), ?range, "Chart series computed");
            print_json(&series)?;
        }
        Commands::Weather => {
            let reference = fixed_reference.unwrap_or_else(local_now);
            let weather = dashboard.weather(reference).await;
            if weather.is_mock {
                info!("Showing mock weather data");
            }
            print_json(&weather)?;
        }
        Commands::Watch {
            source,
            output,
            num_cycles,
        } => {
            if num_cycles == 0 {
                info!(
                    interval_secs = dashboard.config().refresh_interval_secs,
                    "Refreshing indefinitely. Press Ctrl+C to stop."
                );
            }

            let result = dashboard
                .run_refresh_loop(&source, Some(output.as_str()), num_cycles, || {
                    fixed_reference.unwrap_or_else(local_now)
                })
                .await;

            if let Err(e) = &result {
                error!(error = %e, "Refresh loop stopped");
            }
            result?;
        }
    }

    Ok(())
}
