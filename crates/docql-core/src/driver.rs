//! Database driver trait definition

use crate::{Connection, DocqlError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Capabilities that a driver may support
#[derive(Debug, Clone, Default)]
pub struct DriverCapabilities {
    /// Supports transactions
    pub supports_transactions: bool,
    /// Supports savepoints
    pub supports_savepoints: bool,
    /// Supports JDBC-style batch updates (`addBatch`/`executeBatch`)
    pub supports_batch_updates: bool,
    /// Supports named parameters in commands
    pub supports_named_parameters: bool,
    /// Supports stored procedures (engine functions)
    pub supports_stored_procedures: bool,
    /// Supports schemas (namespaces)
    pub supports_schemas: bool,
    /// Supports multiple databases
    pub supports_multiple_databases: bool,
    /// Supports query cancellation
    pub supports_cancellation: bool,
    /// Supports JSON operations
    pub supports_json: bool,
}

/// Core driver trait
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique identifier for this driver
    fn id(&self) -> &'static str {
        self.name()
    }

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Display name for UI
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Driver version
    fn version(&self) -> &'static str {
        "0.1.0"
    }

    /// Supported features/capabilities
    fn capabilities(&self) -> DriverCapabilities;

    /// Default connection port (None for in-process engines)
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Connection string format help text
    fn connection_string_help(&self) -> &'static str {
        ""
    }

    /// Create a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Test connection without keeping it open
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()>;

    /// Parse a connection string into a configuration
    fn parse_connection_string(&self, _conn_str: &str) -> Result<ConnectionConfig> {
        Err(DocqlError::NotSupported(
            "Connection string parsing not implemented for this driver".into(),
        ))
    }

    /// Build a connection string from configuration
    fn build_connection_string(&self, config: &ConnectionConfig) -> String;

    /// Get default connection parameters
    fn default_params(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Unique identifier
    pub id: uuid::Uuid,
    /// Display name
    pub name: String,
    /// Driver ID (e.g., "docql")
    pub driver: String,
    /// Host address (empty for in-process engines)
    pub host: String,
    /// Port number (0 for default or in-process)
    pub port: u16,
    /// Database name
    pub database: Option<String>,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Additional connection parameters
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str, name: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.to_string(),
            driver: driver.to_string(),
            host: String::new(),
            port: 0,
            database: None,
            username: None,
            password: None,
            params: HashMap::new(),
        }
    }

    pub fn with_database(mut self, database: &str) -> Self {
        self.database = Some(database.to_string());
        self
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let val = value.into();
        let str_val = match val {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        self.params.insert(key.to_string(), str_val);
        self
    }

    /// Get a string parameter
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Some(val) = self.params.get(key) {
            return Some(val.clone());
        }
        match key {
            "host" => Some(self.host.clone()),
            "database" => self.database.clone(),
            "username" | "user" => self.username.clone(),
            "password" => self.password.clone(),
            _ => None,
        }
    }

    /// Get a boolean parameter. Accepts `true/false`, `1/0`, `yes/no`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let raw = self.params.get(key)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }

    /// Get port
    pub fn get_port(&self) -> u16 {
        self.port
    }
}
