//! Materialized-view orchestration.
//!
//! Combines the backing-table DDL with the compiled join: the backing table
//! is created only when absent (re-invocation is a no-op), while the
//! materialized-view definition is re-issued every time — it is idempotent
//! via `IF NOT EXISTS`. Both statements are built, and therefore validated,
//! before anything is sent: a configuration error emits no SQL at all.

use std::sync::Arc;

use log::info;

use super::client::SqlExecutor;
use super::error::SinkError;
use crate::loglake::sql::ddl;
use crate::loglake::sql::view::{create_backing_table, create_materialized_view};
use crate::loglake::sql::ViewSpec;

pub struct ViewOrchestrator<E: SqlExecutor> {
    database: String,
    executor: Arc<E>,
}

impl<E: SqlExecutor> ViewOrchestrator<E> {
    pub fn new(database: impl Into<String>, executor: Arc<E>) -> Self {
        Self {
            database: database.into(),
            executor,
        }
    }

    /// Ensure the backing table and (re-)assert the materialized view.
    /// Returns whether the backing table was created by this call.
    pub async fn ensure_view(&self, spec: &ViewSpec) -> Result<bool, SinkError> {
        let backing = create_backing_table(&self.database, spec)?;
        let materialized = create_materialized_view(&self.database, spec)?;

        let exists = self
            .executor
            .query_scalar(&ddl::exists_table(&self.database, &spec.name))
            .await?
            .trim()
            == "1";

        let mut created = false;
        if !exists {
            self.executor.command(&backing).await?;
            created = true;
            info!("created backing table {}.{}", self.database, spec.name);
        }
        self.executor.command(&materialized).await?;
        info!(
            "asserted materialized view {}.{}_mv (refresh every {} minutes)",
            self.database, spec.name, spec.refresh_minutes
        );
        Ok(created)
    }
}
