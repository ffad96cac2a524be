//! Records and record identities

use crate::{DocqlError, Result, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identity of a stored record, written `#cluster:position`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId {
    pub cluster: i32,
    pub position: i64,
}

impl RecordId {
    pub fn new(cluster: i32, position: i64) -> Self {
        Self { cluster, position }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.cluster, self.position)
    }
}

impl FromStr for RecordId {
    type Err = DocqlError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DocqlError::Configuration(format!("Invalid record id: {}", s));
        let body = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        let (cluster, position) = body.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            cluster: cluster.parse().map_err(|_| invalid())?,
            position: position.parse().map_err(|_| invalid())?,
        })
    }
}

/// A document: optional class, optional identity, and ordered named fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub rid: Option<RecordId>,
    pub class_name: Option<String>,
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record of the given class
    pub fn of_class(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    pub fn with_rid(mut self, rid: RecordId) -> Self {
        self.rid = Some(rid);
        self
    }

    /// Builder form of [`Record::set`]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, keeping its original position if it already exists
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in insertion order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Embedded(Box::new(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_id_display_and_parse() {
        let rid = RecordId::new(9, 42);
        assert_eq!(rid.to_string(), "#9:42");
        assert_eq!("#9:42".parse::<RecordId>().ok(), Some(rid));
        assert_eq!(" #-1:-2 ".parse::<RecordId>().ok(), Some(RecordId::new(-1, -2)));
    }

    #[test]
    fn test_record_id_parse_rejects_malformed() {
        assert!("9:42".parse::<RecordId>().is_err());
        assert!("#9".parse::<RecordId>().is_err());
        assert!("#a:b".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_record_keeps_insertion_order() {
        let mut record = Record::of_class("Item")
            .field("b", 1)
            .field("a", 2);
        record.set("b", 3);

        let names: Vec<&str> = record.field_names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(record.get("b"), Some(&Value::Int32(3)));
        assert_eq!(record.class_name.as_deref(), Some("Item"));
        assert_eq!(record.len(), 2);
    }
}
