//! Core value and result types for DocQL

use crate::{Record, RecordId};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A field value as stored by the document engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// Decimal (stored as string for precision)
    Decimal(String),
    /// UTF-8 string
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date (year, month, day)
    Date(NaiveDate),
    /// Date and time without timezone
    DateTime(NaiveDateTime),
    /// Reference to another stored record
    Link(RecordId),
    /// Document embedded inside its owner
    Embedded(Box<Record>),
    /// Ordered collection of values
    Array(Vec<Value>),
    /// Free-form JSON
    Json(serde_json::Value),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Date(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::Link(v) => write!(f, "{}", v),
            Value::Embedded(v) => write!(f, "{{{} fields}}", v.len()),
            Value::Array(v) => write!(f, "[{} items]", v.len()),
            Value::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<RecordId> for Value {
    fn from(v: RecordId) -> Self {
        Value::Link(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A row from a query result
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values
    pub values: Vec<Value>,
    columns: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }
}

/// Column metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnMeta {
    /// Column name
    pub name: String,
    /// Data type (engine-specific string)
    pub data_type: String,
    /// Whether the column can be NULL
    pub nullable: bool,
    /// Column ordinal position (0-based)
    pub ordinal: usize,
}

/// Query result
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Unique query ID
    pub id: Uuid,
    /// Column metadata
    pub columns: Vec<ColumnMeta>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Records the rows were built from, in row order
    pub records: Vec<Record>,
    /// Rows affected (for DML statements)
    pub affected_rows: u64,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a new empty query result
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            columns: Vec::new(),
            rows: Vec::new(),
            records: Vec::new(),
            affected_rows: 0,
            execution_time_ms: 0,
        }
    }

    /// Build a tabular result from an ordered record sequence.
    ///
    /// Columns are the union of field names in first-seen order. A record
    /// that lacks one of the columns gets `Value::Null` in that position.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut names: IndexSet<String> = IndexSet::new();
        for record in &records {
            for name in record.field_names() {
                if !names.contains(name) {
                    names.insert(name.to_string());
                }
            }
        }

        let column_names: Vec<String> = names.into_iter().collect();
        let columns = column_names
            .iter()
            .enumerate()
            .map(|(ordinal, name)| ColumnMeta {
                name: name.clone(),
                data_type: "any".to_string(),
                nullable: true,
                ordinal,
            })
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                let values = column_names
                    .iter()
                    .map(|name| record.get(name).cloned().unwrap_or(Value::Null))
                    .collect();
                Row::new(column_names.clone(), values)
            })
            .collect();

        Self {
            columns,
            rows,
            records,
            ..Self::empty()
        }
    }

    /// Set the number of affected rows
    pub fn with_affected_rows(mut self, affected_rows: u64) -> Self {
        self.affected_rows = affected_rows;
        self
    }

    /// Set the execution time
    pub fn with_execution_time_ms(mut self, execution_time_ms: u64) -> Self {
        self.execution_time_ms = execution_time_ms;
        self
    }

    /// Check if the result has rows
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Collect one column's values across all rows
    pub fn column_values(&self, name: &str) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| row.get_by_name(name).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

/// Result of submitting a single command through a connection
#[derive(Debug, Clone)]
pub struct StatementResult {
    /// Whether the command produced a row set
    pub is_query: bool,
    /// Rows produced by the command, if it ran
    pub result: Option<QueryResult>,
    /// Rows affected (0 when the command was only queued)
    pub affected_rows: u64,
    /// The command was appended to an open transaction rather than executed
    pub queued: bool,
}

impl StatementResult {
    /// Result for a command that was appended to the open batch
    pub fn queued() -> Self {
        Self {
            is_query: false,
            result: None,
            affected_rows: 0,
            queued: true,
        }
    }

    /// Result for a command that was executed right away
    pub fn executed(result: QueryResult) -> Self {
        Self {
            is_query: result.has_rows(),
            affected_rows: result.affected_rows,
            result: Some(result),
            queued: false,
        }
    }

    /// Result for input that was ignored (empty command text)
    pub fn ignored() -> Self {
        Self {
            is_query: false,
            result: None,
            affected_rows: 0,
            queued: false,
        }
    }
}
