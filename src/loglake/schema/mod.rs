//! Schema synthesis: observed field types in, storage column definitions out.

pub mod synthesize;
pub mod types;

pub use synthesize::{storage_type, synthesize, TEMPORAL_NAME_OVERRIDES};
pub use types::{ColumnSpec, ColumnType, ObservedType, SchemaError, TableSpec, UPDATE_TIME_COLUMN};
