//! Core schema types: observed field types, storage column types, and table
//! specifications.
//!
//! An `ObservedType` is what the normalizer saw in the data; a `ColumnType`
//! is what the column store will be told to create. The two are connected by
//! [`crate::loglake::schema::synthesize`], which is total over any observed
//! label so schema synthesis can never fail on unexpected input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Field type as observed by the record normalizer (or supplied by an
/// external staging layer using its own dtype labels).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservedType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
    /// Date/datetime values
    Timestamp,
    /// Elapsed-time values, stored as integer ticks
    Duration,
    /// Free-form text
    Text,
    /// Low-cardinality text
    Category,
    /// Any label we do not recognize; degrades to text storage
    Other(String),
}

impl FromStr for ObservedType {
    type Err = std::convert::Infallible;

    /// Accepts the dtype labels produced by common staging layers. Unknown
    /// labels are preserved as [`ObservedType::Other`], never rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = match s.trim().to_ascii_lowercase().as_str() {
            "int8" => ObservedType::Int8,
            "int16" => ObservedType::Int16,
            "int32" => ObservedType::Int32,
            "int64" | "int" => ObservedType::Int64,
            "uint8" => ObservedType::UInt8,
            "uint16" => ObservedType::UInt16,
            "uint32" => ObservedType::UInt32,
            "uint64" => ObservedType::UInt64,
            "float32" => ObservedType::Float32,
            "float64" | "float" => ObservedType::Float64,
            "bool" | "boolean" => ObservedType::Bool,
            "datetime" | "datetime64[ns]" | "datetime64[ns, utc]" | "timestamp" => {
                ObservedType::Timestamp
            }
            "timedelta" | "timedelta64[ns]" => ObservedType::Duration,
            "string" | "str" | "text" | "object" => ObservedType::Text,
            "category" => ObservedType::Category,
            other => ObservedType::Other(other.to_string()),
        };
        Ok(t)
    }
}

impl fmt::Display for ObservedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservedType::Int8 => write!(f, "int8"),
            ObservedType::Int16 => write!(f, "int16"),
            ObservedType::Int32 => write!(f, "int32"),
            ObservedType::Int64 => write!(f, "int64"),
            ObservedType::UInt8 => write!(f, "uint8"),
            ObservedType::UInt16 => write!(f, "uint16"),
            ObservedType::UInt32 => write!(f, "uint32"),
            ObservedType::UInt64 => write!(f, "uint64"),
            ObservedType::Float32 => write!(f, "float32"),
            ObservedType::Float64 => write!(f, "float64"),
            ObservedType::Bool => write!(f, "bool"),
            ObservedType::Timestamp => write!(f, "datetime"),
            ObservedType::Duration => write!(f, "timedelta"),
            ObservedType::Text => write!(f, "string"),
            ObservedType::Category => write!(f, "category"),
            ObservedType::Other(label) => write!(f, "{}", label),
        }
    }
}

/// Storage column type, rendered as a ClickHouse type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
    DateTime,
    NullableDateTime,
    String,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int8 => write!(f, "Int8"),
            ColumnType::Int16 => write!(f, "Int16"),
            ColumnType::Int32 => write!(f, "Int32"),
            ColumnType::Int64 => write!(f, "Int64"),
            ColumnType::UInt8 => write!(f, "UInt8"),
            ColumnType::UInt16 => write!(f, "UInt16"),
            ColumnType::UInt32 => write!(f, "UInt32"),
            ColumnType::UInt64 => write!(f, "UInt64"),
            ColumnType::Float32 => write!(f, "Float32"),
            ColumnType::Float64 => write!(f, "Float64"),
            ColumnType::Bool => write!(f, "Bool"),
            ColumnType::DateTime => write!(f, "DateTime"),
            ColumnType::NullableDateTime => write!(f, "Nullable(DateTime)"),
            ColumnType::String => write!(f, "String"),
        }
    }
}

/// A single column definition: name plus storage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Schema-level validation errors. These are configuration/programmer errors
/// and fail the operation before any DDL is produced.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("table '{table}' has no columns")]
    EmptyColumns { table: String },

    #[error("table '{table}' defines column '{column}' more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("table '{table}' has an empty ordering key")]
    EmptyOrderingKey { table: String },

    #[error("ordering-key column '{column}' is not a column of table '{table}'")]
    MissingOrderingColumn { table: String, column: String },

    #[error("version column '{column}' is not a column of table '{table}'")]
    MissingVersionColumn { table: String, column: String },
}

/// A table definition: name, ordered columns, clustering/dedup key, and the
/// version column driving ReplacingMergeTree deduplication.
///
/// Construction validates the invariants up front so downstream SQL builders
/// can assume a well-formed spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    pub order_by: Vec<String>,
    pub version_column: String,
}

/// Column every ingested row is stamped with; doubles as the merge version.
pub const UPDATE_TIME_COLUMN: &str = "update_time";

impl TableSpec {
    /// Build a spec with the default version column (`update_time`).
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnSpec>,
        order_by: Vec<String>,
    ) -> Result<Self, SchemaError> {
        Self::with_version_column(name, columns, order_by, UPDATE_TIME_COLUMN)
    }

    pub fn with_version_column(
        name: impl Into<String>,
        columns: Vec<ColumnSpec>,
        order_by: Vec<String>,
        version_column: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let spec = Self {
            name: name.into(),
            columns,
            order_by,
            version_column: version_column.into(),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::EmptyColumns {
                table: self.name.clone(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for col in &self.columns {
            if !seen.insert(col.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.name.clone(),
                    column: col.name.clone(),
                });
            }
        }
        if self.order_by.is_empty() {
            return Err(SchemaError::EmptyOrderingKey {
                table: self.name.clone(),
            });
        }
        for key in &self.order_by {
            if !self.has_column(key) {
                return Err(SchemaError::MissingOrderingColumn {
                    table: self.name.clone(),
                    column: key.clone(),
                });
            }
        }
        if !self.has_column(&self.version_column) {
            return Err(SchemaError::MissingVersionColumn {
                table: self.name.clone(),
                column: self.version_column.clone(),
            });
        }
        Ok(())
    }
}
