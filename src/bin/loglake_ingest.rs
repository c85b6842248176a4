//! loglake ingestion runner.
//!
//! Executes one full ingestion cycle and exits; scheduling repeated cycles
//! (and retrying failed ones) belongs to an external scheduler such as cron
//! or a systemd timer.

use std::sync::Arc;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use loglake::loglake::config::PipelineConfig;
use loglake::loglake::pipeline::{IngestPipeline, ViewOutcome};
use loglake::loglake::sink::ClickHouseHttpClient;

#[derive(Parser)]
#[command(name = "loglake-ingest")]
#[command(about = "Ingest append-only log files into ClickHouse and maintain join views")]
#[command(version)]
struct Cli {
    /// Path to the pipeline configuration file
    #[arg(long, default_value = "loglake.yaml")]
    config: String,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match PipelineConfig::from_yaml_file(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration '{}': {}", cli.config, e);
            std::process::exit(2);
        }
    };
    config.database.apply_env_overrides();

    let client = Arc::new(ClickHouseHttpClient::new(&config.database));
    let pipeline = IngestPipeline::new(config, client);
    let report = pipeline.run().await;

    for outcome in &report.sources {
        match &outcome.error {
            Some(e) => error!("{}: FAILED ({})", outcome.source, e),
            None => info!(
                "{}: {} lines read, {} rows loaded, {} records skipped",
                outcome.source, outcome.lines_read, outcome.rows_loaded, outcome.records_skipped
            ),
        }
    }
    match &report.view {
        ViewOutcome::NotConfigured => {}
        ViewOutcome::Ensured { backing_created } => {
            info!("view asserted (backing table created: {})", backing_created)
        }
        ViewOutcome::Skipped { reason } => info!("view skipped: {}", reason),
        ViewOutcome::Failed(e) => error!("view failed: {}", e),
    }

    if report.all_sources_failed() {
        std::process::exit(1);
    }
}
