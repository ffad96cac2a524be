//! Metadata discovery over the engine catalog
//!
//! Translates classes, properties, indexes and functions into the fixed-shape
//! rows SQL tooling expects. Classes are tables, properties are columns,
//! unique indexes are primary keys and stored functions are procedures.

use async_trait::async_trait;
use docql_core::{
    ClassDef, DatabaseMetadata, EngineCatalog, PropertyDef, QueryResult, Record, Result,
    ScriptEngine, Value, sql_types,
};
use regex::Regex;
use std::sync::Arc;

pub const PRODUCT_NAME: &str = "OrientDB";

pub const SQL_KEYWORDS: &str = "@rid,@class,@version,@size,@type,@this,CONTAINS,CONTAINSALL,CONTAINSKEY,CONTAINSVALUE,CONTAINSTEXT,MATCHES,TRAVERSE";

pub const TIME_DATE_FUNCTIONS: &str = "date,sysdate";

pub const TABLE: &str = "TABLE";
pub const SYSTEM_TABLE: &str = "SYSTEM TABLE";

/// Table kinds in reporting order
pub const TABLE_TYPES: [&str; 2] = [TABLE, SYSTEM_TABLE];

/// Lower-cased names of classes the engine creates for itself
pub const SYSTEM_CLASSES: [&str; 12] = [
    "ouser",
    "orole",
    "oidentity",
    "ofunction",
    "osequence",
    "oschedule",
    "otriggered",
    "orestricted",
    "oshape",
    "v",
    "e",
    "_studio",
];

// DatabaseMetaData procedure constants
const PROCEDURE_RESULT_UNKNOWN: i32 = 0;
const PROCEDURE_COLUMN_IN: i32 = 1;
const PROCEDURE_COLUMN_RETURN: i32 = 5;
const TYPE_NULLABLE: i32 = 1;

/// Metadata discovery for one engine session
#[derive(Clone)]
pub struct DocqlMetadata {
    engine: Arc<dyn ScriptEngine>,
}

impl std::fmt::Debug for DocqlMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocqlMetadata")
            .field("database", &self.engine.database_name())
            .finish()
    }
}

impl DocqlMetadata {
    pub fn new(engine: Arc<dyn ScriptEngine>) -> Self {
        Self { engine }
    }

    async fn catalog(&self) -> Result<EngineCatalog> {
        Ok(self.engine.catalog().await?)
    }

    fn database(&self) -> Value {
        Value::String(self.engine.database_name())
    }

    fn column_row(&self, class: &ClassDef, property: &PropertyDef) -> Record {
        Record::new()
            .field("TABLE_CAT", self.database())
            .field("TABLE_SCHEM", self.database())
            .field("TABLE_NAME", class.name.as_str())
            .field("COLUMN_NAME", property.name.as_str())
            .field("DATA_TYPE", property.property_type.sql_type())
            .field("TYPE_NAME", property.property_type.name())
            .field("COLUMN_SIZE", 1)
            .field("NUM_PREC_RADIX", 10)
            .field("NULLABLE", if property.not_null { 0 } else { 1 })
            .field("REMARKS", property.description.clone())
            .field("COLUMN_DEF", property.default_value.clone())
            .field("ORDINAL_POSITION", property.id)
            .field("IS_NULLABLE", if property.not_null { "NO" } else { "YES" })
    }
}

/// Whether a class is one of the engine's own
pub fn is_system_class(name: &str) -> bool {
    SYSTEM_CLASSES.contains(&name.to_lowercase().as_str())
}

/// Table kind reported for a class
pub fn table_type(name: &str) -> &'static str {
    if is_system_class(name) {
        SYSTEM_TABLE
    } else {
        TABLE
    }
}

/// A compiled SQL `LIKE` pattern, ignoring case. `%` matches any run, `_`
/// any single char. A missing pattern matches everything.
#[derive(Debug, Clone)]
pub enum LikePattern {
    Any,
    Regex(Regex),
    Unusable,
}

impl LikePattern {
    pub fn compile(pattern: Option<&str>) -> Self {
        let Some(pattern) = pattern else {
            return LikePattern::Any;
        };

        let mut expr = String::from("(?is)^");
        let mut buf = [0u8; 4];
        for c in pattern.chars() {
            match c {
                '%' => expr.push_str(".*"),
                '_' => expr.push('.'),
                other => expr.push_str(&regex::escape(other.encode_utf8(&mut buf))),
            }
        }
        expr.push('$');

        match Regex::new(&expr) {
            Ok(re) => LikePattern::Regex(re),
            Err(err) => {
                tracing::warn!(pattern, error = %err, "unusable LIKE pattern");
                LikePattern::Unusable
            }
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            LikePattern::Any => true,
            LikePattern::Regex(re) => re.is_match(value),
            LikePattern::Unusable => false,
        }
    }
}

fn matches_table_name(name: &str, pattern: Option<&str>) -> bool {
    match pattern {
        None | Some("%") => true,
        Some(pattern) => pattern.eq_ignore_ascii_case(name),
    }
}

#[async_trait]
impl DatabaseMetadata for DocqlMetadata {
    fn product_name(&self) -> &str {
        PRODUCT_NAME
    }

    fn product_version(&self) -> String {
        self.engine.product_version()
    }

    fn driver_name(&self) -> &str {
        crate::DRIVER_NAME
    }

    fn driver_version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn url(&self) -> String {
        self.engine.url()
    }

    fn user_name(&self) -> Option<String> {
        self.engine.user_name()
    }

    fn sql_keywords(&self) -> &str {
        SQL_KEYWORDS
    }

    fn time_date_functions(&self) -> &str {
        TIME_DATE_FUNCTIONS
    }

    async fn table_types(&self) -> Result<QueryResult> {
        let records = TABLE_TYPES
            .iter()
            .map(|t| Record::new().field("TABLE_TYPE", *t))
            .collect();
        Ok(QueryResult::from_records(records))
    }

    async fn catalogs(&self) -> Result<QueryResult> {
        Ok(QueryResult::from_records(vec![
            Record::new().field("TABLE_CAT", self.database()),
        ]))
    }

    async fn schemas(&self) -> Result<QueryResult> {
        Ok(QueryResult::from_records(vec![
            Record::new()
                .field("TABLE_SCHEM", self.database())
                .field("TABLE_CATALOG", self.database()),
        ]))
    }

    #[tracing::instrument(skip(self))]
    async fn tables(
        &self,
        name_pattern: Option<&str>,
        types: Option<&[&str]>,
    ) -> Result<QueryResult> {
        let catalog = self.catalog().await?;
        let wanted = |kind: &str| match types {
            None => true,
            Some(types) => types.iter().any(|t| t.eq_ignore_ascii_case(kind)),
        };

        let records = catalog
            .classes
            .iter()
            .filter(|class| matches_table_name(&class.name, name_pattern))
            .filter_map(|class| {
                let kind = table_type(&class.name);
                wanted(kind).then(|| {
                    Record::new()
                        .field("TABLE_CAT", self.database())
                        .field("TABLE_SCHEM", self.database())
                        .field("TABLE_NAME", class.name.as_str())
                        .field("TABLE_TYPE", kind)
                        .field("REMARKS", Value::Null)
                        .field("TYPE_NAME", Value::Null)
                        .field("REF_GENERATION", Value::Null)
                })
            })
            .collect();

        Ok(QueryResult::from_records(records))
    }

    #[tracing::instrument(skip(self))]
    async fn columns(
        &self,
        table_pattern: Option<&str>,
        column_pattern: Option<&str>,
    ) -> Result<QueryResult> {
        let catalog = self.catalog().await?;
        let tables = LikePattern::compile(table_pattern);
        let columns = LikePattern::compile(column_pattern);
        let mut records = Vec::new();
        for class in catalog.classes.iter().filter(|c| tables.matches(&c.name)) {
            for property in class
                .properties
                .iter()
                .filter(|p| columns.matches(&p.name))
            {
                records.push(self.column_row(class, property));
            }
        }
        Ok(QueryResult::from_records(records))
    }

    async fn primary_keys(&self, table: &str) -> Result<QueryResult> {
        let catalog = self.catalog().await?;
        let mut records = Vec::new();
        for index in catalog.class_indexes(table).filter(|i| i.kind.is_unique()) {
            for (seq, field) in index.fields.iter().enumerate() {
                records.push(
                    Record::new()
                        .field("TABLE_CAT", self.database())
                        .field("TABLE_SCHEM", self.database())
                        .field("TABLE_NAME", table)
                        .field("COLUMN_NAME", field.as_str())
                        .field("KEY_SEQ", (seq + 1) as i32)
                        .field("PK_NAME", index.name.as_str()),
                );
            }
        }
        Ok(QueryResult::from_records(records))
    }

    async fn index_info(&self, table: &str, unique_only: bool) -> Result<QueryResult> {
        let catalog = self.catalog().await?;
        let mut indexes: Vec<_> = catalog
            .class_indexes(table)
            .filter(|i| !unique_only || i.kind.is_unique())
            .collect();
        indexes.sort_by(|a, b| a.name.cmp(&b.name));

        let records = indexes
            .into_iter()
            .map(|index| {
                Record::new()
                    .field("TABLE_CAT", self.database())
                    .field("TABLE_SCHEM", self.database())
                    .field("TABLE_NAME", table)
                    .field("NON_UNIQUE", !index.kind.is_unique())
                    .field("INDEX_QUALIFIER", Value::Null)
                    .field("INDEX_NAME", index.name.as_str())
                    .field("TYPE", index.kind.name())
                    .field("ORDINAL_POSITION", 0)
                    .field("COLUMN_NAME", index.fields.join(", "))
                    .field("ASC_OR_DESC", "ASC")
            })
            .collect();
        Ok(QueryResult::from_records(records))
    }

    async fn procedures(&self, name_pattern: Option<&str>) -> Result<QueryResult> {
        let catalog = self.catalog().await?;
        let names = LikePattern::compile(name_pattern);
        let records = catalog
            .functions
            .iter()
            .filter(|f| names.matches(&f.name))
            .map(|f| {
                Record::new()
                    .field("PROCEDURE_CAT", Value::Null)
                    .field("PROCEDURE_SCHEM", Value::Null)
                    .field("PROCEDURE_NAME", f.name.as_str())
                    .field("REMARKS", "")
                    .field("PROCEDURE_TYPE", PROCEDURE_RESULT_UNKNOWN)
                    .field("SPECIFIC_NAME", f.name.as_str())
            })
            .collect();
        Ok(QueryResult::from_records(records))
    }

    async fn procedure_columns(&self, name_pattern: Option<&str>) -> Result<QueryResult> {
        let catalog = self.catalog().await?;
        let column = |function: &str, name: &str, kind: i32| {
            Record::new()
                .field("PROCEDURE_CAT", self.database())
                .field("PROCEDURE_SCHEM", self.database())
                .field("PROCEDURE_NAME", function)
                .field("COLUMN_NAME", name)
                .field("COLUMN_TYPE", kind)
                .field("DATA_TYPE", sql_types::OTHER)
                .field("SPECIFIC_NAME", function)
        };

        let names = LikePattern::compile(name_pattern);
        let mut records = Vec::new();
        for function in catalog.functions.iter().filter(|f| names.matches(&f.name)) {
            for parameter in &function.parameters {
                records.push(column(function.name.as_str(), parameter.as_str(), PROCEDURE_COLUMN_IN));
            }
            records.push(column(function.name.as_str(), "return", PROCEDURE_COLUMN_RETURN));
        }
        Ok(QueryResult::from_records(records))
    }

    async fn super_tables(&self, table: &str) -> Result<QueryResult> {
        let catalog = self.catalog().await?;
        let records = catalog
            .class(table)
            .and_then(|class| {
                let parent = class.super_class.as_deref()?;
                Some(
                    Record::new()
                        .field("TABLE_CAT", self.database())
                        .field("TABLE_SCHEM", self.database())
                        .field("TABLE_NAME", class.name.as_str())
                        .field("SUPERTABLE_NAME", parent),
                )
            })
            .into_iter()
            .collect();
        Ok(QueryResult::from_records(records))
    }

    async fn type_info(&self) -> Result<QueryResult> {
        // (engine type, sql type, signedness where it applies)
        let types: [(&str, i32, Option<bool>); 15] = [
            ("BINARY", sql_types::BINARY, None),
            ("BOOLEAN", sql_types::BOOLEAN, None),
            ("BYTE", sql_types::TINYINT, Some(true)),
            ("DATE", sql_types::DATE, None),
            ("DATETIME", sql_types::DATE, None),
            ("DECIMAL", sql_types::DECIMAL, Some(false)),
            ("FLOAT", sql_types::FLOAT, Some(false)),
            ("DOUBLE", sql_types::DOUBLE, Some(false)),
            ("EMBEDDED", sql_types::STRUCT, None),
            ("EMBEDDEDLIST", sql_types::ARRAY, None),
            ("INTEGER", sql_types::INTEGER, Some(false)),
            ("LINKLIST", sql_types::ARRAY, None),
            ("LONG", sql_types::BIGINT, Some(false)),
            ("STRING", sql_types::VARCHAR, None),
            ("SHORT", sql_types::SMALLINT, Some(false)),
        ];

        let records = types
            .iter()
            .map(|(name, code, unsigned)| {
                let mut record = Record::new()
                    .field("TYPE_NAME", *name)
                    .field("DATA_TYPE", *code)
                    .field("NULLABLE", TYPE_NULLABLE)
                    .field("CASE_SENSITIVE", true)
                    .field("SEARCHABLE", true);
                if let Some(unsigned) = unsigned {
                    record.set("UNSIGNED_ATTRIBUTE", *unsigned);
                }
                record
            })
            .collect();
        Ok(QueryResult::from_records(records))
    }

    async fn user_types(&self) -> Result<QueryResult> {
        let catalog = self.catalog().await?;
        let records = catalog
            .classes
            .iter()
            .map(|class| {
                Record::new()
                    .field("TYPE_CAT", Value::Null)
                    .field("TYPE_SCHEM", Value::Null)
                    .field("TYPE_NAME", class.name.as_str())
                    .field("CLASS_NAME", class.name.as_str())
                    .field("DATA_TYPE", sql_types::STRUCT)
                    .field("REMARKS", Value::Null)
            })
            .collect();
        Ok(QueryResult::from_records(records))
    }
}
