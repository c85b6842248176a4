//! # loglake
//!
//! Incrementally ingests append-only, newline-delimited log streams into a
//! ClickHouse column store: offset-tracked reads that consume each file
//! exactly once per byte range, schema synthesis from the observed records,
//! idempotent table creation on a versioned-merge engine, and compiled
//! multi-table join views refreshed on a schedule.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use loglake::loglake::config::PipelineConfig;
//! use loglake::loglake::pipeline::IngestPipeline;
//! use loglake::loglake::sink::ClickHouseHttpClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::from_yaml_file("loglake.yaml".as_ref())?;
//!     let client = Arc::new(ClickHouseHttpClient::new(&config.database));
//!     let report = IngestPipeline::new(config, client).run().await;
//!     println!("loaded {} rows", report.rows_loaded());
//!     Ok(())
//! }
//! ```

pub mod loglake;

// Re-export the main API at crate root for easy access
pub use loglake::config::PipelineConfig;
pub use loglake::ingest::{IncrementalReader, LogSource, OffsetStore};
pub use loglake::pipeline::{IngestPipeline, IngestReport};
pub use loglake::schema::{ColumnSpec, ColumnType, ObservedType, TableSpec};
pub use loglake::sink::{ClickHouseHttpClient, SqlExecutor, TableManager, ViewOrchestrator};
pub use loglake::sql::{JoinEdge, ViewSpec};
