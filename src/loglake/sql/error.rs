//! Validation errors for SQL statement construction.
//!
//! These are configuration errors: when one is raised, no SQL has been
//! emitted for the failing statement.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlBuildError {
    #[error("a join requires at least two tables, got {count}")]
    NotEnoughTables { count: usize },

    #[error("base table '{table}' is not among the view's tables")]
    UnknownBaseTable { table: String },

    #[error("join edge references unknown table '{table}'")]
    UnknownJoinTable { table: String },

    #[error(
        "join edge from '{from_table}' to '{to_table}' is not reachable yet; \
         edges must be listed in traversal order starting from the base table"
    )]
    UnreachableJoinSource {
        from_table: String,
        to_table: String,
    },

    #[error("tables '{first}' and '{second}' both abbreviate to alias '{alias}'")]
    AliasCollision {
        alias: String,
        first: String,
        second: String,
    },

    #[error("view '{view}' has an empty ordering key")]
    EmptyViewOrderingKey { view: String },

    #[error(
        "ordering-key column '{column}' of view '{view}' is not among the flattened columns"
    )]
    UnknownViewOrderingColumn { view: String, column: String },

    #[error("join column '{column}' is not a column of table '{table}'")]
    MissingJoinColumn { table: String, column: String },
}
