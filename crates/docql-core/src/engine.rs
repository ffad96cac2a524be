//! Boundary to the underlying document/graph engine

use crate::{ConnectionConfig, DocqlError, EngineCatalog, Record, RecordId, Result};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by the engine itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The script or command could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// The script parsed but failed while running (constraint violation, missing class, ...)
    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Raw result shape returned by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// A bare count (typically affected records)
    Count(i64),
    /// A single record
    Record(Record),
    /// An ordered sequence of records
    Records(Vec<Record>),
    /// A reference that must be resolved to its record
    Link(RecordId),
    /// A value of a shape the driver does not understand
    Unrecognized(serde_json::Value),
    /// Nothing was returned
    Empty,
}

/// A session-bound handle onto the engine.
///
/// Calls are awaited on the caller's task; implementations decide how the
/// work reaches the engine (in-process, remote protocol, ...).
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    /// Run a whole script in the given script language
    async fn execute_script(
        &self,
        language: &str,
        script: &str,
    ) -> std::result::Result<RawResult, EngineError>;

    /// Run a single command outside any script
    async fn execute_command(&self, command: &str) -> std::result::Result<RawResult, EngineError>;

    /// Resolve a record reference. `Ok(None)` when nothing is stored at `rid`.
    async fn load_record(&self, rid: RecordId) -> std::result::Result<Option<Record>, EngineError>;

    /// Snapshot of classes, indexes and functions
    async fn catalog(&self) -> std::result::Result<EngineCatalog, EngineError>;

    fn database_name(&self) -> String;

    fn url(&self) -> String;

    fn user_name(&self) -> Option<String> {
        None
    }

    fn product_version(&self) -> String;

    /// Release the engine session
    async fn close(&self) -> std::result::Result<(), EngineError> {
        Ok(())
    }
}

/// Opens engine sessions for a connection configuration
#[async_trait]
pub trait EngineConnector: Send + Sync {
    async fn open(&self, config: &ConnectionConfig) -> Result<Arc<dyn ScriptEngine>>;
}

impl From<EngineError> for DocqlError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Parse(msg) => DocqlError::Syntax(msg),
            EngineError::Execution(msg) | EngineError::Connection(msg) => {
                DocqlError::Execution(msg)
            }
        }
    }
}
