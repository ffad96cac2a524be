//! DocQL Core - Core abstractions for the document engine SQL driver
//!
//! This crate provides the contract that the batch executor and the driver
//! are written against. It defines:
//!
//! - `Connection` - Trait for SQL-style client connections
//! - `DatabaseDriver` - Trait for driver entry points
//! - `ScriptEngine` - The boundary to the underlying document/graph engine
//! - `DatabaseMetadata` - Fixed-shape metadata discovery
//! - Common types like `Value`, `Record`, `Row`, `QueryResult`, etc.

mod connection;
mod driver;
mod engine;
mod error;
mod record;
mod schema;
pub mod settings;
mod types;

pub use connection::*;
pub use driver::*;
pub use engine::*;
pub use error::*;
pub use record::*;
pub use schema::*;
pub use settings::DriverSettings;
pub use types::*;
