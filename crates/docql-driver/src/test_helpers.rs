//! Engine doubles shared by the driver unit tests

use async_trait::async_trait;
use docql_core::{
    ClassDef, ConnectionConfig, EngineCatalog, EngineConnector, EngineError, FunctionDef,
    IndexDef, IndexKind, PropertyDef, PropertyType, RawResult, Record, RecordId, Result,
    ScriptEngine,
};
use std::sync::{Arc, Mutex};

/// Engine that records what it is asked to run.
///
/// Scripts answer with the number of command lines between the markers,
/// `SELECT` commands answer with one record, anything else with a count of 1.
/// Text containing `BadClass` fails with an execution error.
#[derive(Default)]
pub struct RecordingEngine {
    pub scripts: Mutex<Vec<String>>,
    pub commands: Mutex<Vec<String>>,
    pub closed: Mutex<bool>,
    pub catalog: EngineCatalog,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_catalog(catalog: EngineCatalog) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            ..Self::default()
        })
    }

    pub fn script_calls(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }

    pub fn command_calls(&self) -> usize {
        self.commands.lock().unwrap().len()
    }
}

#[async_trait]
impl ScriptEngine for RecordingEngine {
    async fn execute_script(
        &self,
        _language: &str,
        script: &str,
    ) -> std::result::Result<RawResult, EngineError> {
        self.scripts.lock().unwrap().push(script.to_string());
        if script.contains("BadClass") {
            return Err(EngineError::Execution("Class 'BadClass' not found".into()));
        }
        Ok(RawResult::Count(script.lines().count() as i64 - 2))
    }

    async fn execute_command(&self, command: &str) -> std::result::Result<RawResult, EngineError> {
        self.commands.lock().unwrap().push(command.to_string());
        if command.contains("BadClass") {
            return Err(EngineError::Execution("Class 'BadClass' not found".into()));
        }
        if command.trim_start().to_uppercase().starts_with("SELECT") {
            return Ok(RawResult::Records(vec![
                Record::of_class("Item")
                    .with_rid(RecordId::new(10, 0))
                    .field("name", "a"),
            ]));
        }
        Ok(RawResult::Count(1))
    }

    async fn load_record(&self, _rid: RecordId) -> std::result::Result<Option<Record>, EngineError> {
        Ok(None)
    }

    async fn catalog(&self) -> std::result::Result<EngineCatalog, EngineError> {
        Ok(self.catalog.clone())
    }

    fn database_name(&self) -> String {
        "demo".to_string()
    }

    fn url(&self) -> String {
        "docql:memory:demo".to_string()
    }

    fn user_name(&self) -> Option<String> {
        Some("admin".to_string())
    }

    fn product_version(&self) -> String {
        "3.0.0-test".to_string()
    }

    async fn close(&self) -> std::result::Result<(), EngineError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// Connector that always hands out the same engine
pub struct FixedConnector {
    pub engine: Arc<RecordingEngine>,
}

#[async_trait]
impl EngineConnector for FixedConnector {
    async fn open(&self, _config: &ConnectionConfig) -> Result<Arc<dyn ScriptEngine>> {
        Ok(self.engine.clone())
    }
}

/// A small schema: two user classes, one system class, indexes and functions
pub fn sample_catalog() -> EngineCatalog {
    EngineCatalog {
        classes: vec![
            ClassDef::new("Item")
                .with_property(PropertyDef::new("name", PropertyType::String).with_id(1).not_null())
                .with_property(
                    PropertyDef::new("price", PropertyType::Double)
                        .with_id(2)
                        .with_description("unit price")
                        .with_default("0.0"),
                )
                .with_property(PropertyDef::new("tags", PropertyType::EmbeddedList).with_id(3)),
            ClassDef::new("Book")
                .with_super_class("Item")
                .with_property(PropertyDef::new("isbn", PropertyType::String).with_id(4)),
            ClassDef::new("OUser")
                .with_property(PropertyDef::new("name", PropertyType::String).with_id(0)),
        ],
        indexes: vec![
            IndexDef::new("Item.name", "Item", IndexKind::Unique, vec!["name".into()]),
            IndexDef::new(
                "Item.composite",
                "Item",
                IndexKind::Unique,
                vec!["name".into(), "price".into()],
            ),
            IndexDef::new("Item.tags", "Item", IndexKind::NotUnique, vec!["tags".into()]),
        ],
        functions: vec![
            FunctionDef::new("sum", vec!["a".into(), "b".into()]),
            FunctionDef::new("now", Vec::new()),
        ],
    }
}
