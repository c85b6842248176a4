//! Multi-table join compilation.
//!
//! Builds a single SELECT over a declarative graph of table relationships:
//! a base table plus an ordered list of pairwise LEFT JOIN edges. Aliases are
//! derived deterministically from table names and every projected column is
//! renamed `{alias}_{column}`, so the joined result has globally unique
//! column names even when source tables share column names.
//!
//! Join order is caller-specified and never reordered; each edge's source
//! table must already be reachable (the base table, or a prior edge's target)
//! because construction is sequential and left-associative.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::ddl::{qualified, quote_ident};
use super::error::SqlBuildError;
use crate::loglake::schema::TableSpec;

/// Default refresh interval for periodically refreshed views.
pub const DEFAULT_REFRESH_MINUTES: u32 = 30;

/// One pairwise equality join: `from_table.column = to_table.column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinEdge {
    pub from_table: String,
    pub to_table: String,
    pub column: String,
}

impl JoinEdge {
    pub fn new(
        from_table: impl Into<String>,
        to_table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            to_table: to_table.into(),
            column: column.into(),
        }
    }
}

/// Short table alias: first letter of each underscore-separated word, so
/// `course_info` becomes `ci`. A collision between two participating tables
/// is a configuration error, never silently resolved.
pub fn derive_alias(table: &str) -> String {
    table
        .split('_')
        .filter_map(|word| word.chars().next())
        .collect()
}

/// A materialized join view: contributing tables, the base table, the join
/// edges in traversal order, the view's own ordering key, and its refresh
/// interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    pub name: String,
    pub tables: Vec<TableSpec>,
    pub base_table: String,
    pub edges: Vec<JoinEdge>,
    pub order_by: Vec<String>,
    pub refresh_minutes: u32,
}

impl ViewSpec {
    /// Derive the alias for every participating table, failing on collision.
    pub fn aliases(&self) -> Result<HashMap<String, String>, SqlBuildError> {
        let mut by_alias: HashMap<String, &str> = HashMap::new();
        let mut aliases = HashMap::new();
        for table in &self.tables {
            let alias = derive_alias(&table.name);
            if let Some(first) = by_alias.insert(alias.clone(), table.name.as_str()) {
                return Err(SqlBuildError::AliasCollision {
                    alias,
                    first: first.to_string(),
                    second: table.name.clone(),
                });
            }
            aliases.insert(table.name.clone(), alias);
        }
        Ok(aliases)
    }

    /// Flattened projection names in table order: `{alias}_{column}`.
    pub fn flattened_columns(&self) -> Result<Vec<(String, &TableSpec, usize)>, SqlBuildError> {
        let aliases = self.aliases()?;
        let mut out = Vec::new();
        for table in &self.tables {
            let alias = &aliases[&table.name];
            for (idx, col) in table.columns.iter().enumerate() {
                out.push((format!("{}_{}", alias, col.name), table, idx));
            }
        }
        Ok(out)
    }

    fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Validate the join graph without emitting any SQL.
    pub fn validate(&self) -> Result<(), SqlBuildError> {
        if self.tables.len() < 2 {
            return Err(SqlBuildError::NotEnoughTables {
                count: self.tables.len(),
            });
        }
        if self.table(&self.base_table).is_none() {
            return Err(SqlBuildError::UnknownBaseTable {
                table: self.base_table.clone(),
            });
        }
        self.aliases()?;

        let mut reachable: HashSet<&str> = HashSet::new();
        reachable.insert(self.base_table.as_str());
        for edge in &self.edges {
            for endpoint in [&edge.from_table, &edge.to_table] {
                let table = self.table(endpoint).ok_or_else(|| {
                    SqlBuildError::UnknownJoinTable {
                        table: endpoint.clone(),
                    }
                })?;
                if !table.has_column(&edge.column) {
                    return Err(SqlBuildError::MissingJoinColumn {
                        table: endpoint.clone(),
                        column: edge.column.clone(),
                    });
                }
            }
            if !reachable.contains(edge.from_table.as_str()) {
                return Err(SqlBuildError::UnreachableJoinSource {
                    from_table: edge.from_table.clone(),
                    to_table: edge.to_table.clone(),
                });
            }
            reachable.insert(edge.to_table.as_str());
        }
        Ok(())
    }
}

/// Compile the view's defining SELECT.
///
/// Projects every column of every table as `{alias}_{column}`, selects from
/// the base table, and appends one LEFT JOIN per edge in the given order.
/// Validation failures return an error with no SQL emitted.
pub fn compile_join(database: &str, spec: &ViewSpec) -> Result<String, SqlBuildError> {
    spec.validate()?;
    let aliases = spec.aliases()?;

    let mut projections = Vec::new();
    for table in &spec.tables {
        let alias = &aliases[&table.name];
        for col in &table.columns {
            projections.push(format!(
                "{}.{} AS {}",
                quote_ident(alias),
                quote_ident(&col.name),
                quote_ident(&format!("{}_{}", alias, col.name))
            ));
        }
    }

    let base_alias = &aliases[&spec.base_table];
    let mut query = format!(
        "SELECT {} FROM {} AS {}",
        projections.join(", "),
        qualified(database, &spec.base_table),
        quote_ident(base_alias)
    );

    for edge in &spec.edges {
        let from_alias = &aliases[&edge.from_table];
        let to_alias = &aliases[&edge.to_table];
        query.push_str(&format!(
            " LEFT JOIN {} AS {} ON {}.{} = {}.{}",
            qualified(database, &edge.to_table),
            quote_ident(to_alias),
            quote_ident(from_alias),
            quote_ident(&edge.column),
            quote_ident(to_alias),
            quote_ident(&edge.column)
        ));
    }

    Ok(query)
}
