//! The ingestion pipeline: one sequential run over all configured sources.
//!
//! Per source: truncate, read the appended lines, normalize, synthesize the
//! table schema, load. Failures are isolated — a failing source is recorded
//! in the run report and the remaining sources still ingest. After all
//! sources, the materialized view is asserted once, provided every
//! participating table produced a schema this run.
//!
//! Every outcome is a structured value on [`IngestReport`], so callers and
//! tests can assert on results without parsing log output. Retries are the
//! invoking scheduler's concern; nothing here loops.

use std::collections::HashMap;
use std::sync::Arc;

use log::{error, info, warn};

use crate::loglake::config::{PipelineConfig, SourceConfig, ViewConfig};
use crate::loglake::ingest::{IncrementalReader, IngestError};
use crate::loglake::normalize::JsonLineNormalizer;
use crate::loglake::schema::{synthesize, SchemaError, TableSpec};
use crate::loglake::sink::{SinkError, SqlExecutor, TableManager, ViewOrchestrator};
use crate::loglake::sql::ViewSpec;

/// Any failure that aborts a single source's ingestion.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Result of ingesting one source.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: String,
    pub lines_read: usize,
    pub rows_loaded: usize,
    pub records_skipped: usize,
    pub error: Option<PipelineError>,
}

impl SourceOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of the view-orchestration step.
#[derive(Debug)]
pub enum ViewOutcome {
    /// No view configured.
    NotConfigured,
    /// View asserted; `backing_created` says whether this run created the
    /// backing table.
    Ensured { backing_created: bool },
    /// A participating table produced no schema this run.
    Skipped { reason: String },
    Failed(PipelineError),
}

/// Structured result of one full ingestion cycle.
#[derive(Debug)]
pub struct IngestReport {
    pub sources: Vec<SourceOutcome>,
    pub view: ViewOutcome,
}

impl IngestReport {
    pub fn rows_loaded(&self) -> usize {
        self.sources.iter().map(|s| s.rows_loaded).sum()
    }

    pub fn all_sources_failed(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(|s| !s.succeeded())
    }
}

pub struct IngestPipeline<E: SqlExecutor> {
    config: PipelineConfig,
    reader: IncrementalReader,
    tables: TableManager<E>,
    views: ViewOrchestrator<E>,
}

impl<E: SqlExecutor> IngestPipeline<E> {
    pub fn new(config: PipelineConfig, executor: Arc<E>) -> Self {
        let database = config.database.database.clone();
        Self {
            config,
            reader: IncrementalReader::new(),
            tables: TableManager::new(database.clone(), Arc::clone(&executor)),
            views: ViewOrchestrator::new(database, executor),
        }
    }

    /// Run one full ingestion cycle.
    pub async fn run(&self) -> IngestReport {
        // Empty each source table up front so the cycle ends with at most one
        // logical copy of the current window's data. Missing tables (first
        // run) are expected.
        for source in &self.config.sources {
            if let Err(e) = self.tables.truncate(&source.name).await {
                warn!("could not truncate table '{}': {}", source.name, e);
            }
        }

        let mut specs: HashMap<String, TableSpec> = HashMap::new();
        let mut outcomes = Vec::new();
        for source in &self.config.sources {
            let outcome = self.ingest_source(source, &mut specs).await;
            if let Some(e) = &outcome.error {
                error!("source '{}' failed: {}", source.name, e);
            }
            outcomes.push(outcome);
        }

        let view = self.orchestrate_view(&specs).await;

        let report = IngestReport {
            sources: outcomes,
            view,
        };
        info!(
            "ingestion cycle finished: {} rows loaded across {} sources",
            report.rows_loaded(),
            report.sources.len()
        );
        report
    }

    async fn ingest_source(
        &self,
        source: &SourceConfig,
        specs: &mut HashMap<String, TableSpec>,
    ) -> SourceOutcome {
        let mut outcome = SourceOutcome {
            source: source.name.clone(),
            lines_read: 0,
            rows_loaded: 0,
            records_skipped: 0,
            error: None,
        };

        let batch = match self.reader.read_new(&source.log_source()) {
            Ok(batch) => batch,
            Err(e) => {
                outcome.error = Some(e.into());
                return outcome;
            }
        };
        outcome.lines_read = batch.lines.len();
        if batch.is_empty() {
            return outcome;
        }

        let normalizer = match &source.explode {
            Some(rule) => JsonLineNormalizer::with_explode(rule.clone()),
            None => JsonLineNormalizer::new(),
        };
        let staged = normalizer.normalize(&batch.lines);
        outcome.records_skipped = staged.skipped;
        if staged.is_empty() {
            warn!(
                "source '{}': {} lines read, none decodable",
                source.name, outcome.lines_read
            );
            return outcome;
        }

        let columns = synthesize(&staged.fields);
        let spec = match TableSpec::new(&source.name, columns, source.order_by.clone()) {
            Ok(spec) => spec,
            Err(e) => {
                outcome.error = Some(e.into());
                return outcome;
            }
        };

        match self.tables.load(&spec, &staged.rows).await {
            Ok(loaded) => {
                outcome.rows_loaded = loaded;
                specs.insert(source.name.clone(), spec);
            }
            Err(e) => outcome.error = Some(e.into()),
        }
        outcome
    }

    async fn orchestrate_view(&self, specs: &HashMap<String, TableSpec>) -> ViewOutcome {
        let Some(view) = &self.config.view else {
            return ViewOutcome::NotConfigured;
        };

        let participants = view.participant_tables();
        let missing: Vec<&String> = participants
            .iter()
            .filter(|t| !specs.contains_key(*t))
            .collect();
        if !missing.is_empty() {
            let reason = format!(
                "tables without fresh data this run: {}",
                missing
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            warn!("skipping view '{}': {}", view.name, reason);
            return ViewOutcome::Skipped { reason };
        }

        let spec = build_view_spec(view, &participants, specs);
        match self.views.ensure_view(&spec).await {
            Ok(backing_created) => ViewOutcome::Ensured { backing_created },
            Err(e) => {
                error!("view '{}' failed: {}", view.name, e);
                ViewOutcome::Failed(e.into())
            }
        }
    }
}

fn build_view_spec(
    view: &ViewConfig,
    participants: &[String],
    specs: &HashMap<String, TableSpec>,
) -> ViewSpec {
    ViewSpec {
        name: view.name.clone(),
        tables: participants.iter().map(|t| specs[t].clone()).collect(),
        base_table: view.base_table.clone(),
        edges: view.edges.iter().map(|e| e.join_edge()).collect(),
        order_by: view.order_by.clone(),
        refresh_minutes: view.refresh_minutes,
    }
}
