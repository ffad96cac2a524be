//! Driver entry point and connection URL handling

use crate::DRIVER_NAME;
use crate::connection::DocqlConnection;
use async_trait::async_trait;
use docql_core::{
    Connection, ConnectionConfig, DatabaseDriver, DocqlError, DriverCapabilities, DriverSettings,
    EngineConnector, Result,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub const URL_PREFIX: &str = "docql:";
pub const DEFAULT_PORT: u16 = 2424;

/// Connection parameter holding the storage mode (`memory`, `plocal`, `remote`)
pub const MODE_PARAM: &str = "mode";

/// Driver that opens engine sessions through an [`EngineConnector`]
pub struct DocqlDriver {
    connector: Arc<dyn EngineConnector>,
    settings: DriverSettings,
}

impl DocqlDriver {
    pub fn new(connector: Arc<dyn EngineConnector>) -> Self {
        tracing::debug!("DocQL driver initialized");
        Self {
            connector,
            settings: DriverSettings::default(),
        }
    }

    /// Use these settings as the base for every connection
    pub fn with_settings(mut self, settings: DriverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    /// Connect and return the concrete connection type
    #[tracing::instrument(skip(self, config), fields(database = config.database.as_deref()))]
    pub async fn open(&self, config: &ConnectionConfig) -> Result<DocqlConnection> {
        let settings = self.settings.clone().with_overrides(config);
        let engine = self.connector.open(config).await?;
        tracing::info!(
            database = %engine.database_name(),
            auto_commit = settings.connection.auto_commit,
            "connected"
        );
        Ok(DocqlConnection::new(engine, settings, config.clone()))
    }
}

#[async_trait]
impl DatabaseDriver for DocqlDriver {
    fn id(&self) -> &'static str {
        DRIVER_NAME
    }

    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn display_name(&self) -> &'static str {
        "DocQL"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn default_port(&self) -> Option<u16> {
        Some(DEFAULT_PORT)
    }

    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities {
            supports_transactions: true,
            supports_savepoints: false,
            supports_batch_updates: false,
            supports_named_parameters: true,
            supports_stored_procedures: true, // engine functions
            supports_schemas: false,
            supports_multiple_databases: false,
            supports_cancellation: false,
            supports_json: true,
        }
    }

    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(self.open(config).await?))
    }

    #[tracing::instrument(skip(self, config))]
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        tracing::debug!("testing DocQL connection");
        let conn = self.open(config).await?;
        conn.close().await
    }

    /// Parse `docql:<mode>:<location>[?key=value&...]`.
    ///
    /// For `remote` the location is `host[:port]/database`; for other modes
    /// it is the database name or path.
    fn parse_connection_string(&self, conn_str: &str) -> Result<ConnectionConfig> {
        let invalid = |reason: &str| {
            DocqlError::Configuration(format!("Invalid DocQL URL '{}': {}", conn_str, reason))
        };

        let rest = conn_str
            .trim()
            .strip_prefix(URL_PREFIX)
            .ok_or_else(|| invalid("missing 'docql:' prefix"))?;
        let (mode, rest) = rest
            .split_once(':')
            .ok_or_else(|| invalid("missing storage mode"))?;
        if mode.is_empty() {
            return Err(invalid("empty storage mode"));
        }
        let (location, query) = match rest.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (rest, None),
        };
        if location.is_empty() {
            return Err(invalid("missing database location"));
        }

        let mut config = ConnectionConfig::new(DRIVER_NAME, location).with_param(MODE_PARAM, mode);

        if mode.eq_ignore_ascii_case("remote") {
            let (authority, database) = location
                .split_once('/')
                .ok_or_else(|| invalid("remote location needs host/database"))?;
            let (host, port) = match authority.split_once(':') {
                Some((host, port)) => (
                    host,
                    port.parse::<u16>().map_err(|_| invalid("invalid port"))?,
                ),
                None => (authority, DEFAULT_PORT),
            };
            config.host = host.to_string();
            config.port = port;
            config.database = Some(database.to_string());
        } else {
            config.database = Some(location.to_string());
        }

        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "user" | "username" => config.username = Some(value.to_string()),
                "password" => config.password = Some(value.to_string()),
                _ => {
                    config.params.insert(key.to_string(), value.to_string());
                }
            }
        }

        Ok(config)
    }

    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        let mode = config.get_string(MODE_PARAM).unwrap_or_else(|| {
            if config.host.is_empty() {
                "memory".to_string()
            } else {
                "remote".to_string()
            }
        });
        let database = config.database.clone().unwrap_or_default();

        let mut url = if mode.eq_ignore_ascii_case("remote") {
            let port = if config.port > 0 {
                config.port
            } else {
                DEFAULT_PORT
            };
            format!("{}{}:{}:{}/{}", URL_PREFIX, mode, config.host, port, database)
        } else {
            format!("{}{}:{}", URL_PREFIX, mode, database)
        };

        // credentials first, then the remaining params by key
        let params: BTreeMap<&str, &str> = config
            .params
            .iter()
            .filter(|(key, _)| key.as_str() != MODE_PARAM)
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        let query: Vec<String> = config
            .username
            .as_deref()
            .map(|user| ("user", user))
            .into_iter()
            .chain(config.password.as_deref().map(|p| ("password", p)))
            .chain(params)
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    fn connection_string_help(&self) -> &'static str {
        "DocQL URL format: docql:<mode>:<location>[?key=value&...]\n\
         Examples:\n\
         - docql:memory:demo\n\
         - docql:plocal:/var/db/demo\n\
         - docql:remote:localhost:2424/demo?user=admin&password=admin&autoCommit=false"
    }

    fn default_params(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                docql_core::settings::AUTO_COMMIT_PARAM.to_string(),
                self.settings.connection.auto_commit.to_string(),
            ),
            (
                docql_core::settings::SCRIPT_LANGUAGE_PARAM.to_string(),
                self.settings.transaction.script_language.clone(),
            ),
        ])
    }
}
