//! Table lifecycle against the column store.
//!
//! `ensure_table` is safe to call every run: creation is `IF NOT EXISTS` and
//! no migration logic exists — the schema model is additive. `load` finishes
//! with an `OPTIMIZE ... FINAL` so the ReplacingMergeTree deduplication is
//! visible to the next read instead of waiting for a background merge.
//!
//! Truncation and reload are deliberately not transactional: a crash between
//! them leaves the table empty until the next successful cycle.

use std::sync::Arc;

use log::info;

use super::client::SqlExecutor;
use super::error::SinkError;
use crate::loglake::normalize::{FieldValue, Row};
use crate::loglake::schema::TableSpec;
use crate::loglake::sql::ddl;

pub struct TableManager<E: SqlExecutor> {
    database: String,
    executor: Arc<E>,
}

impl<E: SqlExecutor> TableManager<E> {
    pub fn new(database: impl Into<String>, executor: Arc<E>) -> Self {
        Self {
            database: database.into(),
            executor,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub async fn ensure_database(&self) -> Result<(), SinkError> {
        self.executor
            .command(&ddl::create_database(&self.database))
            .await
    }

    /// Create the table if absent. Re-invocation with an identical spec is a
    /// no-op on the server side.
    pub async fn ensure_table(&self, spec: &TableSpec) -> Result<(), SinkError> {
        self.ensure_database().await?;
        self.executor
            .command(&ddl::create_table(&self.database, spec))
            .await
    }

    /// Ensure the table, bulk-load the staged rows, and finalize the merge.
    /// Returns the number of rows inserted.
    pub async fn load(&self, spec: &TableSpec, rows: &[Row]) -> Result<usize, SinkError> {
        self.ensure_table(spec).await?;
        if rows.is_empty() {
            return Ok(0);
        }

        let columns: Vec<String> = spec.columns.iter().map(|c| c.name.clone()).collect();
        let body = jsoneachrow_body(spec, rows)?;
        self.executor
            .insert(&ddl::insert_into(&self.database, &spec.name, &columns), body)
            .await?;
        self.executor
            .command(&ddl::optimize_final(&self.database, &spec.name))
            .await?;

        info!(
            "loaded {} rows into {}.{}",
            rows.len(),
            self.database,
            spec.name
        );
        Ok(rows.len())
    }

    /// Remove all rows; used at the start of a full ingestion cycle.
    pub async fn truncate(&self, table: &str) -> Result<(), SinkError> {
        self.executor
            .command(&ddl::truncate_table(&self.database, table))
            .await
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool, SinkError> {
        let result = self
            .executor
            .query_scalar(&ddl::exists_table(&self.database, table))
            .await?;
        Ok(result.trim() == "1")
    }
}

/// One JSON object per line, fields restricted to the spec's columns. Null
/// and absent fields are omitted so the server applies column defaults.
fn jsoneachrow_body(spec: &TableSpec, rows: &[Row]) -> Result<String, SinkError> {
    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        let mut object = serde_json::Map::new();
        for col in &spec.columns {
            match row.get(&col.name) {
                Some(FieldValue::Null) | None => {}
                Some(value) => {
                    object.insert(col.name.clone(), value.to_json());
                }
            }
        }
        lines.push(serde_json::to_string(&serde_json::Value::Object(object))?);
    }
    Ok(lines.join("\n"))
}
