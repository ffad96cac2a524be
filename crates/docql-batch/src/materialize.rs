//! Normalizes raw engine results into an ordered record sequence

use docql_core::{RawResult, Record, ScriptEngine, Value};

/// Field name of the synthetic row produced for a bare count
pub const VALUE_FIELD: &str = "VALUE";

/// Turn whatever the engine returned into rows.
///
/// - count: one row with a single `VALUE` field
/// - record: one row
/// - records: passed through in engine order
/// - link: resolved through the engine, then one row
///
/// Anything else yields no rows. A link that cannot be resolved also yields
/// no rows; the engine has already committed by the time it is resolved.
pub async fn materialize(engine: &dyn ScriptEngine, raw: RawResult) -> Vec<Record> {
    match raw {
        RawResult::Count(count) => vec![Record::new().field(VALUE_FIELD, Value::Int64(count))],
        RawResult::Record(record) => vec![record],
        RawResult::Records(records) => records,
        RawResult::Link(rid) => match engine.load_record(rid).await {
            Ok(Some(record)) => vec![record],
            Ok(None) => {
                tracing::warn!(rid = %rid, "linked record not found, returning no rows");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(rid = %rid, error = %err, "failed to resolve linked record");
                Vec::new()
            }
        },
        RawResult::Unrecognized(value) => {
            tracing::warn!(kind = json_kind(&value), "dropping unrecognized result shape");
            Vec::new()
        }
        RawResult::Empty => Vec::new(),
    }
}

/// Affected-record count carried by a raw result, if it is a count
pub fn affected_rows(raw: &RawResult) -> u64 {
    match raw {
        RawResult::Count(count) => u64::try_from(*count).unwrap_or(0),
        _ => 0,
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
