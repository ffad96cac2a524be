//! Driver settings loaded from TOML
//!
//! ```toml
//! [transaction]
//! script_language = "sql"
//! begin_marker = "BEGIN"
//! commit_marker = "COMMIT"
//!
//! [connection]
//! auto_commit = true
//! ```
//!
//! Any missing key falls back to its default.

use crate::{ConnectionConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Connection parameter that overrides [`ConnectionSettings::auto_commit`]
pub const AUTO_COMMIT_PARAM: &str = "autoCommit";
/// Connection parameter that overrides [`TransactionSettings::script_language`]
pub const SCRIPT_LANGUAGE_PARAM: &str = "scriptLanguage";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DriverSettings {
    pub transaction: TransactionSettings,
    pub connection: ConnectionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransactionSettings {
    /// Script language passed to the engine alongside the transaction script
    pub script_language: String,
    pub begin_marker: String,
    pub commit_marker: String,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            script_language: "sql".to_string(),
            begin_marker: "BEGIN".to_string(),
            commit_marker: "COMMIT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Initial autocommit mode of new connections
    pub auto_commit: bool,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self { auto_commit: true }
    }
}

impl DriverSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded driver settings");
        Self::from_toml_str(&content)
    }

    /// Apply per-connection parameter overrides
    pub fn with_overrides(mut self, config: &ConnectionConfig) -> Self {
        if let Some(auto_commit) = config.get_bool(AUTO_COMMIT_PARAM) {
            self.connection.auto_commit = auto_commit;
        }
        if let Some(language) = config.params.get(SCRIPT_LANGUAGE_PARAM) {
            self.transaction.script_language = language.clone();
        }
        self
    }
}
