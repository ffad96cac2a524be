//! Engine catalog model and metadata discovery

use crate::{QueryResult, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Fixed-shape metadata discovery over an engine catalog.
///
/// Every listing returns a [`QueryResult`] whose columns carry the exact
/// names the SQL client interface expects (`TABLE_NAME`, `COLUMN_NAME`, ...).
#[async_trait]
pub trait DatabaseMetadata: Send + Sync {
    fn product_name(&self) -> &str;

    fn product_version(&self) -> String;

    fn driver_name(&self) -> &str;

    fn driver_version(&self) -> &str;

    fn url(&self) -> String;

    fn user_name(&self) -> Option<String>;

    /// Comma-separated engine keywords that are not SQL:2003 keywords
    fn sql_keywords(&self) -> &str;

    /// Comma-separated time and date functions
    fn time_date_functions(&self) -> &str;

    /// Table kinds, one row per `TABLE_TYPE`
    async fn table_types(&self) -> Result<QueryResult>;

    async fn catalogs(&self) -> Result<QueryResult>;

    async fn schemas(&self) -> Result<QueryResult>;

    /// List classes. `types = None` means every kind; an empty slice matches nothing.
    async fn tables(&self, name_pattern: Option<&str>, types: Option<&[&str]>)
    -> Result<QueryResult>;

    async fn columns(
        &self,
        table_pattern: Option<&str>,
        column_pattern: Option<&str>,
    ) -> Result<QueryResult>;

    async fn primary_keys(&self, table: &str) -> Result<QueryResult>;

    async fn index_info(&self, table: &str, unique_only: bool) -> Result<QueryResult>;

    async fn procedures(&self, name_pattern: Option<&str>) -> Result<QueryResult>;

    async fn procedure_columns(&self, name_pattern: Option<&str>) -> Result<QueryResult>;

    async fn super_tables(&self, table: &str) -> Result<QueryResult>;

    async fn type_info(&self) -> Result<QueryResult>;

    async fn user_types(&self) -> Result<QueryResult>;
}

/// Snapshot of the engine's schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineCatalog {
    pub classes: Vec<ClassDef>,
    pub indexes: Vec<IndexDef>,
    pub functions: Vec<FunctionDef>,
}

impl EngineCatalog {
    /// Look up a class by name, ignoring case
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Indexes defined on the named class
    pub fn class_indexes<'a>(&'a self, class_name: &'a str) -> impl Iterator<Item = &'a IndexDef> {
        self.indexes
            .iter()
            .filter(move |i| i.class_name.eq_ignore_ascii_case(class_name))
    }
}

/// A class (the engine's notion of a table)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub super_class: Option<String>,
    pub properties: Vec<PropertyDef>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_super_class(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }
}

/// A declared property of a class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub property_type: PropertyType,
    pub not_null: bool,
    pub description: Option<String>,
    pub default_value: Option<String>,
    /// Engine-assigned property id, reported as the column ordinal
    pub id: i32,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            not_null: false,
            description: None,
            default_value: None,
            id: 0,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}

/// Engine property types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropertyType {
    Binary,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Decimal,
    String,
    Date,
    DateTime,
    Embedded,
    EmbeddedList,
    EmbeddedSet,
    EmbeddedMap,
    Link,
    LinkList,
    LinkSet,
    LinkMap,
    Any,
}

impl PropertyType {
    /// Engine type name as reported in `TYPE_NAME`
    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::Binary => "BINARY",
            PropertyType::Boolean => "BOOLEAN",
            PropertyType::Byte => "BYTE",
            PropertyType::Short => "SHORT",
            PropertyType::Integer => "INTEGER",
            PropertyType::Long => "LONG",
            PropertyType::Float => "FLOAT",
            PropertyType::Double => "DOUBLE",
            PropertyType::Decimal => "DECIMAL",
            PropertyType::String => "STRING",
            PropertyType::Date => "DATE",
            PropertyType::DateTime => "DATETIME",
            PropertyType::Embedded => "EMBEDDED",
            PropertyType::EmbeddedList => "EMBEDDEDLIST",
            PropertyType::EmbeddedSet => "EMBEDDEDSET",
            PropertyType::EmbeddedMap => "EMBEDDEDMAP",
            PropertyType::Link => "LINK",
            PropertyType::LinkList => "LINKLIST",
            PropertyType::LinkSet => "LINKSET",
            PropertyType::LinkMap => "LINKMAP",
            PropertyType::Any => "ANY",
        }
    }

    /// Parse an engine type name, ignoring case
    pub fn parse(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let ty = match upper.as_str() {
            "BINARY" => PropertyType::Binary,
            "BOOLEAN" => PropertyType::Boolean,
            "BYTE" => PropertyType::Byte,
            "SHORT" => PropertyType::Short,
            "INTEGER" => PropertyType::Integer,
            "LONG" => PropertyType::Long,
            "FLOAT" => PropertyType::Float,
            "DOUBLE" => PropertyType::Double,
            "DECIMAL" => PropertyType::Decimal,
            "STRING" => PropertyType::String,
            "DATE" => PropertyType::Date,
            "DATETIME" => PropertyType::DateTime,
            "EMBEDDED" => PropertyType::Embedded,
            "EMBEDDEDLIST" => PropertyType::EmbeddedList,
            "EMBEDDEDSET" => PropertyType::EmbeddedSet,
            "EMBEDDEDMAP" => PropertyType::EmbeddedMap,
            "LINK" => PropertyType::Link,
            "LINKLIST" => PropertyType::LinkList,
            "LINKSET" => PropertyType::LinkSet,
            "LINKMAP" => PropertyType::LinkMap,
            "ANY" => PropertyType::Any,
            _ => return None,
        };
        Some(ty)
    }

    /// SQL type code (`java.sql.Types` numbering) for this engine type
    pub fn sql_type(&self) -> i32 {
        match self {
            PropertyType::Binary => sql_types::BINARY,
            PropertyType::Boolean => sql_types::BOOLEAN,
            PropertyType::Byte => sql_types::TINYINT,
            PropertyType::Short => sql_types::SMALLINT,
            PropertyType::Integer => sql_types::INTEGER,
            PropertyType::Long => sql_types::BIGINT,
            PropertyType::Float => sql_types::FLOAT,
            PropertyType::Double => sql_types::DOUBLE,
            PropertyType::Decimal => sql_types::DECIMAL,
            PropertyType::String => sql_types::VARCHAR,
            PropertyType::Date => sql_types::DATE,
            PropertyType::DateTime => sql_types::TIMESTAMP,
            PropertyType::Embedded => sql_types::STRUCT,
            PropertyType::EmbeddedList
            | PropertyType::EmbeddedSet
            | PropertyType::LinkList
            | PropertyType::LinkSet => sql_types::ARRAY,
            PropertyType::EmbeddedMap
            | PropertyType::Link
            | PropertyType::LinkMap
            | PropertyType::Any => sql_types::JAVA_OBJECT,
        }
    }
}

/// SQL type codes shared with JDBC-style clients
pub mod sql_types {
    pub const BINARY: i32 = -2;
    pub const BOOLEAN: i32 = 16;
    pub const TINYINT: i32 = -6;
    pub const SMALLINT: i32 = 5;
    pub const INTEGER: i32 = 4;
    pub const BIGINT: i32 = -5;
    pub const FLOAT: i32 = 6;
    pub const DOUBLE: i32 = 8;
    pub const DECIMAL: i32 = 3;
    pub const VARCHAR: i32 = 12;
    pub const DATE: i32 = 91;
    pub const TIMESTAMP: i32 = 93;
    pub const OTHER: i32 = 1111;
    pub const JAVA_OBJECT: i32 = 2000;
    pub const STRUCT: i32 = 2002;
    pub const ARRAY: i32 = 2003;
}

/// Index kinds known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexKind {
    Unique,
    NotUnique,
    FullText,
    Dictionary,
}

impl IndexKind {
    pub fn name(&self) -> &'static str {
        match self {
            IndexKind::Unique => "UNIQUE",
            IndexKind::NotUnique => "NOTUNIQUE",
            IndexKind::FullText => "FULLTEXT",
            IndexKind::Dictionary => "DICTIONARY",
        }
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, IndexKind::Unique)
    }
}

/// An index over one or more fields of a class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub class_name: String,
    pub kind: IndexKind,
    pub fields: Vec<String>,
}

impl IndexDef {
    pub fn new(
        name: impl Into<String>,
        class_name: impl Into<String>,
        kind: IndexKind,
        fields: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            kind,
            fields,
        }
    }
}

/// A stored function, exposed to clients as a procedure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub parameters: Vec<String>,
    pub language: Option<String>,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, parameters: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parameters,
            language: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_property_type_name_roundtrip() {
        for ty in [
            PropertyType::Binary,
            PropertyType::DateTime,
            PropertyType::EmbeddedList,
            PropertyType::LinkMap,
        ] {
            assert_eq!(PropertyType::parse(ty.name()), Some(ty));
        }
        assert_eq!(PropertyType::parse("string"), Some(PropertyType::String));
        assert_eq!(PropertyType::parse("varchar"), None);
    }

    #[test]
    fn test_property_type_sql_codes() {
        assert_eq!(PropertyType::String.sql_type(), sql_types::VARCHAR);
        assert_eq!(PropertyType::Long.sql_type(), sql_types::BIGINT);
        assert_eq!(PropertyType::DateTime.sql_type(), sql_types::TIMESTAMP);
        assert_eq!(PropertyType::LinkList.sql_type(), sql_types::ARRAY);
        assert_eq!(PropertyType::Link.sql_type(), sql_types::JAVA_OBJECT);
    }

    #[test]
    fn test_catalog_lookup_ignores_case() {
        let catalog = EngineCatalog {
            classes: vec![ClassDef::new("Item")],
            indexes: vec![
                IndexDef::new("Item.id", "Item", IndexKind::Unique, vec!["id".into()]),
                IndexDef::new("Other.x", "Other", IndexKind::NotUnique, vec!["x".into()]),
            ],
            functions: Vec::new(),
        };

        assert!(catalog.class("item").is_some());
        assert!(catalog.class("missing").is_none());
        assert_eq!(catalog.class_indexes("ITEM").count(), 1);
    }
}
