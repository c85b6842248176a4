//! Record normalization: raw log lines in, flat typed rows out.
//!
//! Each line is expected to carry one serialized JSON object, possibly
//! preceded by free-form prefix text (timestamps, level markers); the payload
//! starts at the first `{`. Nested objects are flattened into
//! `parent_child` column names, every row is stamped with an `update_time`
//! ingestion timestamp, and a per-column observed type is inferred across the
//! whole batch.
//!
//! Undecodable records are skipped and counted, never fatal: one bad line
//! must not abort its source's ingestion.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::loglake::schema::{ObservedType, UPDATE_TIME_COLUMN};

/// A single normalized field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Timestamp(NaiveDateTime),
    Null,
}

impl FieldValue {
    /// JSON representation for a JSONEachRow insert body.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Integer(i) => Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Timestamp(ts) => {
                Value::String(ts.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            FieldValue::Null => Value::Null,
        }
    }
}

/// One flat record: field name to value.
pub type Row = HashMap<String, FieldValue>;

/// Expansion rule for records that carry an array of sub-records: each array
/// element becomes its own row, inheriting the named carry-over fields from
/// the enclosing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplodeRule {
    /// Field holding the array of objects to expand.
    pub field: String,
    /// Parent fields copied onto every expanded row.
    #[serde(default)]
    pub carry: Vec<String>,
}

/// Normalizer output: flat rows, the per-column observed types in first-seen
/// column order, and how many records were skipped as undecodable.
#[derive(Debug, Default)]
pub struct StagedBatch {
    pub rows: Vec<Row>,
    pub fields: Vec<(String, ObservedType)>,
    pub skipped: usize,
}

impl StagedBatch {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Turns newline-delimited JSON-bearing log lines into staged tabular data.
#[derive(Debug, Default, Clone)]
pub struct JsonLineNormalizer {
    explode: Option<ExplodeRule>,
}

impl JsonLineNormalizer {
    pub fn new() -> Self {
        Self { explode: None }
    }

    pub fn with_explode(rule: ExplodeRule) -> Self {
        Self {
            explode: Some(rule),
        }
    }

    /// Normalize a batch of raw lines. Never fails; bad records are counted
    /// in [`StagedBatch::skipped`].
    pub fn normalize(&self, lines: &[String]) -> StagedBatch {
        let mut batch = StagedBatch::default();
        let mut order: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut inferred: HashMap<String, ObservedType> = HashMap::new();

        for line in lines {
            let object = match decode_payload(line) {
                Some(object) => object,
                None => {
                    batch.skipped += 1;
                    continue;
                }
            };

            let update_time = chrono::Local::now().naive_local();
            let rows = match &self.explode {
                Some(rule) => explode_record(&object, rule, update_time, &mut batch.skipped),
                None => {
                    let mut fields = flatten_object(&object, "");
                    fields.push((
                        UPDATE_TIME_COLUMN.to_string(),
                        FieldValue::Timestamp(update_time),
                    ));
                    vec![fields]
                }
            };

            for fields in rows {
                let mut row = Row::new();
                for (name, value) in fields {
                    if seen.insert(name.clone()) {
                        order.push(name.clone());
                    }
                    merge_observed(&mut inferred, &name, &value);
                    row.insert(name, value);
                }
                batch.rows.push(row);
            }
        }

        batch.fields = order
            .into_iter()
            .map(|name| {
                let observed = inferred.remove(&name).unwrap_or(ObservedType::Text);
                (name, observed)
            })
            .collect();
        batch
    }
}

/// Expand one record's configured array field into per-element rows.
fn explode_record(
    object: &serde_json::Map<String, Value>,
    rule: &ExplodeRule,
    update_time: NaiveDateTime,
    skipped: &mut usize,
) -> Vec<Vec<(String, FieldValue)>> {
    let elements = match object.get(&rule.field) {
        Some(Value::Array(elements)) => elements,
        _ => {
            warn!("record has no '{}' array to expand, skipping", rule.field);
            *skipped += 1;
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for element in elements {
        let nested = match element {
            Value::Object(nested) => nested,
            _ => {
                *skipped += 1;
                continue;
            }
        };
        let mut fields = flatten_object(nested, "");
        for carry in &rule.carry {
            if let Some(value) = object.get(carry) {
                fields.push((carry.clone(), json_to_field(carry, value)));
            }
        }
        fields.push((
            UPDATE_TIME_COLUMN.to_string(),
            FieldValue::Timestamp(update_time),
        ));
        rows.push(fields);
    }
    rows
}

/// Locate and decode the JSON object embedded in a raw log line.
fn decode_payload(line: &str) -> Option<serde_json::Map<String, Value>> {
    let start = line.find('{')?;
    match serde_json::from_str::<Value>(&line[start..]) {
        Ok(Value::Object(object)) => Some(object),
        Ok(_) => {
            warn!("record payload is not a JSON object, skipping");
            None
        }
        Err(e) => {
            warn!("skipping undecodable record: {}", e);
            None
        }
    }
}

/// Flatten a JSON object into `parent_child`-named leaf fields.
fn flatten_object(object: &serde_json::Map<String, Value>, prefix: &str) -> Vec<(String, FieldValue)> {
    let mut fields = Vec::new();
    for (key, value) in object {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}_{}", prefix, key)
        };
        match value {
            Value::Object(nested) => fields.extend(flatten_object(nested, &name)),
            other => fields.push((name.clone(), json_to_field(&name, other))),
        }
    }
    fields
}

/// Convert one JSON leaf to a field value. String fields whose column name
/// looks temporal are parsed as timestamps where possible; arrays are kept as
/// their JSON text.
fn json_to_field(name: &str, value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else {
                FieldValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => {
            if is_temporal_name(name) {
                if let Some(ts) = parse_timestamp(s) {
                    return FieldValue::Timestamp(ts);
                }
            }
            FieldValue::String(s.clone())
        }
        Value::Array(_) | Value::Object(_) => FieldValue::String(value.to_string()),
    }
}

fn is_temporal_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("date") || lower.contains("time")
}

/// Accepts the common ISO-ish formats seen in application logs.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for format in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Fold one value into the running observed type for its column. Conflicting
/// observations degrade to text; integers widen to float.
fn merge_observed(inferred: &mut HashMap<String, ObservedType>, name: &str, value: &FieldValue) {
    let observed = match value {
        FieldValue::Null => return,
        FieldValue::Integer(_) => ObservedType::Int64,
        FieldValue::Float(_) => ObservedType::Float64,
        FieldValue::Boolean(_) => ObservedType::Bool,
        FieldValue::Timestamp(_) => ObservedType::Timestamp,
        FieldValue::String(_) => ObservedType::Text,
    };
    let merged = match inferred.get(name) {
        None => Some(observed),
        Some(current) if *current == observed => None,
        Some(ObservedType::Int64) if observed == ObservedType::Float64 => {
            Some(ObservedType::Float64)
        }
        Some(ObservedType::Float64) if observed == ObservedType::Int64 => None,
        Some(_) => Some(ObservedType::Text),
    };
    if let Some(merged) = merged {
        inferred.insert(name.to_string(), merged);
    }
}
