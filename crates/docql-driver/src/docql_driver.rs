//! DocQL driver
//!
//! Lets SQL-oriented tooling talk to a document/graph engine through the
//! `docql-core` connection contract.
//!
//! # Features
//!
//! - Autocommit and manual-commit modes
//! - Manual-commit batches submitted as one begin/commit script
//! - Metadata discovery (tables, columns, indexes, procedures, types)
//! - `docql:<mode>:<location>` connection URLs
//!
//! # Example
//!
//! ```ignore
//! use docql_core::{Connection, DatabaseDriver};
//! use docql_driver::DocqlDriver;
//!
//! let driver = DocqlDriver::new(connector);
//! let config = driver.parse_connection_string("docql:memory:demo")?;
//! let conn = driver.connect(&config).await?;
//!
//! conn.set_auto_commit(false).await?;
//! conn.execute("INSERT INTO Item SET name = 'a'").await?;
//! conn.execute("INSERT INTO Item SET name = 'b'").await?;
//! let result = conn.commit().await?;
//! ```

mod connection;
mod driver;
#[cfg(test)]
mod driver_tests;
pub mod metadata;
#[cfg(test)]
mod metadata_tests;
#[cfg(test)]
mod test_helpers;

pub use connection::DocqlConnection;
pub use driver::*;
pub use metadata::DocqlMetadata;

/// Name the driver registers under
pub const DRIVER_NAME: &str = "docql";
