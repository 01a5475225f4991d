//! CLI entry point for the delay insights tool.
//!
//! Provides subcommands for detecting daily delay anomalies at an airport,
//! training the delay-probability model, and scoring a single departure.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use delay_insights::anomaly::{AnomalyParams, detect_anomalies, detect_anomalies_list};
use delay_insights::config::Settings;
use delay_insights::features::PredictionInput;
use delay_insights::model::{TrainOptions, predict_with_input, train_model};
use delay_insights::output::{MetricsLogRow, append_record, print_json, write_records};
use delay_insights::warehouse::CsvWarehouse;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "delay_insights")]
#[command(about = "Airline delay anomaly detection and delay-probability model", long_about = None)]
struct Cli {
    /// Fact-table CSV extract (overrides WAREHOUSE_PATH)
    #[arg(long, global = true)]
    warehouse: Option<PathBuf>,

    /// Model artifact location (overrides MODEL_PATH)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flag days whose mean departure delay deviates from the trailing window
    Anomalies {
        /// Departure airport code, e.g. JFK
        #[arg(short, long)]
        airport: String,

        /// First day of the report (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the report (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Absolute z-score above which a day is anomalous
        #[arg(long, default_value_t = 3.0)]
        threshold: f64,

        /// Trailing window length in observations
        #[arg(long, default_value_t = 30)]
        window: usize,

        /// Observations required before statistics are produced
        #[arg(long, default_value_t = 10)]
        min_periods: usize,

        /// Days with fewer flights are left out of the report
        #[arg(long, default_value_t = 20)]
        min_flights: u32,

        /// Only report the anomalous days
        #[arg(long, default_value_t = false)]
        only_anomalies: bool,

        /// Write the report to this CSV file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Train the delay-probability model on the warehouse extract
    Train {
        /// Fraction of rows held out for validation
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,

        /// Only use the first N extracted rows
        #[arg(long)]
        limit: Option<usize>,

        /// Seed of the stratified split
        #[arg(long, default_value_t = 42)]
        random_state: u64,

        /// CSV file to append the run's metrics to
        #[arg(long)]
        metrics_log: Option<PathBuf>,
    },
    /// Probability that a departure is delayed by 15 minutes or more
    Predict {
        #[arg(long)]
        airport: Option<String>,

        #[arg(long)]
        airline: Option<String>,

        /// Morning, Afternoon, Evening, Night, ...
        #[arg(long)]
        dep_time_label: Option<String>,

        /// Average temperature
        #[arg(long, allow_negative_numbers = true)]
        tavg: Option<f64>,

        /// Precipitation
        #[arg(long)]
        prcp: Option<f64>,

        /// Wind speed
        #[arg(long)]
        wspd: Option<f64>,

        /// Departures from the same airport in the same slot that day
        #[arg(long)]
        num_departures: Option<u32>,

        /// Flight date; calendar features default to a January Monday without it
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Arrival airport; defaults to the departure airport
        #[arg(long)]
        arr_airport: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();
    let settings = Settings::from_env().with_overrides(cli.warehouse, cli.model);

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = settings
        .log_file_path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = settings
        .log_file_path
        .file_name()
        .unwrap_or(OsStr::new("delay_insights.log"));

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

    let warehouse = CsvWarehouse::new(settings.warehouse_path.clone());

    match cli.command {
        Commands::Anomalies {
            airport,
            start,
            end,
            threshold,
            window,
            min_periods,
            min_flights,
            only_anomalies,
            output,
        } => {
            let params = AnomalyParams {
                threshold,
                window,
                min_periods,
                min_flights_per_day: min_flights,
            };

            if only_anomalies {
                let rows = detect_anomalies_list(&warehouse, &airport, start, end, &params).await?;
                info!(anomalies = rows.len(), "Anomalous days found");
                match output {
                    Some(path) => write_records(&path, &rows)?,
                    None => print_json(&rows)?,
                }
            } else {
                let rows = detect_anomalies(&warehouse, &airport, start, end, &params).await?;
                match output {
                    Some(path) => write_records(&path, &rows)?,
                    None => print_json(&rows)?,
                }
            }
        }
        Commands::Train {
            test_size,
            limit,
            random_state,
            metrics_log,
        } => {
            let options = TrainOptions {
                test_size,
                limit,
                random_state,
            };
            let report = train_model(&warehouse, &options, &settings.model_path).await?;

            if let Some(path) = metrics_log {
                append_record(&path, &MetricsLogRow::from_report(&report, Utc::now()))?;
            }
            print_json(&report)?;
        }
        Commands::Predict {
            airport,
            airline,
            dep_time_label,
            tavg,
            prcp,
            wspd,
            num_departures,
            date,
            arr_airport,
        } => {
            let input = PredictionInput {
                airport_id: airport,
                airline_id: airline,
                dep_time_label,
                tavg,
                prcp,
                wspd,
                num_departures_same_slot_airport: num_departures,
                arr_airport_id: arr_airport,
                target_date: date,
            };
            let proba = predict_with_input(&settings.model_path, input)?;

            info!(proba, "Delay probability");
            println!("{proba:.4}");
        }
    }

    Ok(())
}
