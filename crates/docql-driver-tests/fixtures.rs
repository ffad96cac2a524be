//! Test fixtures shared by the scenario tests.
//!
//! Every test gets its own in-memory database, named with a fresh UUID, so
//! tests never see each other's records. Connections are opened through the
//! real [`DocqlDriver`] so URL handling, settings overrides and the
//! connection state machine are exercised exactly as a client would use them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use docql_driver_tests::fixtures::{CommitMode, test_database};
//! use rstest::rstest;
//!
//! #[rstest]
//! #[case::auto(CommitMode::Auto)]
//! #[case::manual(CommitMode::Manual)]
//! #[tokio::test]
//! async fn test_insert(#[case] mode: CommitMode) -> anyhow::Result<()> {
//!     let db = test_database().await?;
//!     let conn = db.connect(mode).await?;
//!     conn.execute("INSERT INTO Item SET name = 'a'").await?;
//!     Ok(())
//! }
//! ```

use crate::memory_engine::{MemoryConnector, MemoryEngine};
use anyhow::{Context, Result};
use docql_core::settings::AUTO_COMMIT_PARAM;
use docql_core::{Connection, DatabaseDriver};
use docql_driver::{DocqlConnection, DocqlDriver};
use std::sync::Arc;

/// Class created in every test database
pub const ITEM_CLASS: &str = "Item";

/// Commit mode a connection is opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitMode {
    /// Every command runs on its own
    Auto,
    /// Commands are batched until commit
    Manual,
}

impl CommitMode {
    pub fn is_auto(&self) -> bool {
        matches!(self, CommitMode::Auto)
    }
}

/// One isolated database plus the driver that reaches it
pub struct TestDatabase {
    name: String,
    connector: Arc<MemoryConnector>,
    driver: DocqlDriver,
}

impl TestDatabase {
    /// Create an empty database with a unique name
    pub fn new() -> Self {
        initialize_logging();

        let connector = Arc::new(MemoryConnector::new());
        Self {
            name: format!("test_{}", uuid::Uuid::new_v4().simple()),
            driver: DocqlDriver::new(connector.clone()),
            connector,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver(&self) -> &DocqlDriver {
        &self.driver
    }

    pub fn url(&self) -> String {
        format!("docql:memory:{}", self.name)
    }

    /// The engine behind this database, for inspecting stored state
    pub async fn engine(&self) -> Arc<MemoryEngine> {
        self.connector.database(&self.name).await
    }

    /// Open a connection in the given commit mode
    pub async fn connect(&self, mode: CommitMode) -> Result<DocqlConnection> {
        let url = format!("{}?{}={}", self.url(), AUTO_COMMIT_PARAM, mode.is_auto());
        let config = self
            .driver
            .parse_connection_string(&url)
            .with_context(|| format!("failed to parse {}", url))?;
        let conn = self
            .driver
            .open(&config)
            .await
            .context("failed to open connection")?;
        Ok(conn)
    }

    /// Records currently stored for a class, as seen by a fresh connection
    pub async fn count(&self, class: &str) -> Result<usize> {
        let conn = self.connect(CommitMode::Auto).await?;
        let result = conn
            .query(&format!("SELECT FROM {}", class))
            .await
            .with_context(|| format!("failed to count {}", class))?;
        Ok(result.row_count())
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh database with the `Item` class in place
pub async fn test_database() -> Result<TestDatabase> {
    let db = TestDatabase::new();
    let conn = db.connect(CommitMode::Auto).await?;
    conn.execute(&format!("CREATE CLASS {}", ITEM_CLASS))
        .await
        .context("failed to create Item class")?;
    conn.close().await?;
    Ok(db)
}

fn initialize_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("docql=debug".parse().unwrap())
                    .add_directive("docql_batch=debug".parse().unwrap())
                    .add_directive("docql_driver_tests=debug".parse().unwrap()),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_databases_are_isolated() -> Result<()> {
        let first = test_database().await?;
        let second = test_database().await?;

        first
            .connect(CommitMode::Auto)
            .await?
            .execute("INSERT INTO Item SET name = 'only here'")
            .await?;

        assert_ne!(first.name(), second.name());
        assert_eq!(first.count(ITEM_CLASS).await?, 1);
        assert_eq!(second.count(ITEM_CLASS).await?, 0);
        Ok(())
    }
}
