//! Observed-type to storage-type synthesis.
//!
//! Maps each observed field type to its canonical storage column type via a
//! fixed lookup, with a name-based override: fields named like ingestion
//! timestamps are always stored as `DateTime` regardless of what the
//! normalizer inferred. That guarantees the merge/version key is well-typed
//! even when the upstream stage saw the value as text.

use super::types::{ColumnSpec, ColumnType, ObservedType, UPDATE_TIME_COLUMN};

/// Field names that are always stored as `DateTime`.
pub const TEMPORAL_NAME_OVERRIDES: [&str; 2] = [UPDATE_TIME_COLUMN, "timestamp"];

/// Storage type for one field, applying the temporal-name override first.
///
/// Total over any observed type: unrecognized labels degrade to `String`.
pub fn storage_type(name: &str, observed: &ObservedType) -> ColumnType {
    if TEMPORAL_NAME_OVERRIDES.contains(&name) {
        return ColumnType::DateTime;
    }
    match observed {
        ObservedType::Int8 => ColumnType::Int8,
        ObservedType::Int16 => ColumnType::Int16,
        ObservedType::Int32 => ColumnType::Int32,
        ObservedType::Int64 => ColumnType::Int64,
        ObservedType::UInt8 => ColumnType::UInt8,
        ObservedType::UInt16 => ColumnType::UInt16,
        ObservedType::UInt32 => ColumnType::UInt32,
        ObservedType::UInt64 => ColumnType::UInt64,
        ObservedType::Float32 => ColumnType::Float32,
        ObservedType::Float64 => ColumnType::Float64,
        ObservedType::Bool => ColumnType::Bool,
        ObservedType::Timestamp => ColumnType::NullableDateTime,
        ObservedType::Duration => ColumnType::Int64,
        ObservedType::Text => ColumnType::String,
        ObservedType::Category => ColumnType::String,
        ObservedType::Other(_) => ColumnType::String,
    }
}

/// Synthesize column specs for a whole field mapping, preserving field order.
pub fn synthesize(fields: &[(String, ObservedType)]) -> Vec<ColumnSpec> {
    fields
        .iter()
        .map(|(name, observed)| ColumnSpec::new(name.clone(), storage_type(name, observed)))
        .collect()
}
