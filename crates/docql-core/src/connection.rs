//! Connection trait

use crate::{DatabaseMetadata, QueryResult, Result, StatementResult};
use async_trait::async_trait;

/// A client connection onto a document engine
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "docql")
    fn driver_name(&self) -> &str;

    /// Submit a command that modifies data.
    ///
    /// With autocommit off the command may be queued into the open
    /// transaction instead of executed (`StatementResult::queued`).
    async fn execute(&self, command: &str) -> Result<StatementResult>;

    /// Execute a command right away and return its rows.
    ///
    /// Meant for reads. The text is not classified and never joins an open
    /// transaction, even with autocommit off, so a write or schema command
    /// passed here takes effect immediately.
    async fn query(&self, command: &str) -> Result<QueryResult>;

    /// Whether every command commits on its own
    fn auto_commit(&self) -> bool;

    /// Toggle autocommit. Turning it on abandons any open transaction.
    async fn set_auto_commit(&self, enabled: bool) -> Result<()>;

    /// Commit the open transaction and return the rows it produced
    async fn commit(&self) -> Result<QueryResult>;

    /// Discard the open transaction
    async fn rollback(&self) -> Result<()>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;

    /// Get the metadata discovery interface if supported
    fn metadata(&self) -> Option<&dyn DatabaseMetadata> {
        None
    }
}
