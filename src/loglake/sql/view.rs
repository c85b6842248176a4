//! Backing-table and materialized-view statement builders.
//!
//! A view is stored as a plain MergeTree backing table holding one column per
//! flattened projection, plus a periodically refreshed materialized view that
//! re-runs the compiled join and writes into the backing table.

use super::ddl::{qualified, quote_ident};
use super::error::SqlBuildError;
use super::join::{compile_join, ViewSpec};
use crate::loglake::schema::ColumnSpec;

/// Column definitions of the view's backing table: every source column,
/// alias-prefixed, carrying the storage type already synthesized for it.
pub fn backing_columns(spec: &ViewSpec) -> Result<Vec<ColumnSpec>, SqlBuildError> {
    let flattened = spec.flattened_columns()?;
    Ok(flattened
        .into_iter()
        .map(|(name, table, idx)| ColumnSpec::new(name, table.columns[idx].column_type.clone()))
        .collect())
}

/// CREATE TABLE for the view's backing store.
///
/// The view's ordering key must name flattened (alias-prefixed) columns;
/// anything else is a configuration error and no SQL is emitted.
pub fn create_backing_table(database: &str, spec: &ViewSpec) -> Result<String, SqlBuildError> {
    spec.validate()?;
    if spec.order_by.is_empty() {
        return Err(SqlBuildError::EmptyViewOrderingKey {
            view: spec.name.clone(),
        });
    }
    let columns = backing_columns(spec)?;
    for key in &spec.order_by {
        if !columns.iter().any(|c| &c.name == key) {
            return Err(SqlBuildError::UnknownViewOrderingColumn {
                view: spec.name.clone(),
                column: key.clone(),
            });
        }
    }
    let fields: Vec<String> = columns
        .iter()
        .map(|col| format!("{} {}", quote_ident(&col.name), col.column_type))
        .collect();
    let order_by: Vec<String> = spec.order_by.iter().map(|c| quote_ident(c)).collect();
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({}) ENGINE = MergeTree() ORDER BY ({})",
        qualified(database, &spec.name),
        fields.join(", "),
        order_by.join(", ")
    ))
}

/// CREATE MATERIALIZED VIEW that refreshes the backing table periodically.
pub fn create_materialized_view(database: &str, spec: &ViewSpec) -> Result<String, SqlBuildError> {
    let select = compile_join(database, spec)?;
    let mv_name = format!("{}_mv", spec.name);
    Ok(format!(
        "CREATE MATERIALIZED VIEW IF NOT EXISTS {} REFRESH EVERY {} MINUTE TO {} AS {}",
        qualified(database, &mv_name),
        spec.refresh_minutes,
        qualified(database, &spec.name),
        select
    ))
}
