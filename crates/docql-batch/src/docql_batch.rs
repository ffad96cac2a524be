//! Transactional batch-statement execution
//!
//! While a connection is in manual-commit mode, commands are collected into a
//! [`BatchSession`] instead of being run one by one. On commit the session
//! renders every accepted command into a single script framed by begin/commit
//! markers and hands it to the engine exactly once, so the engine applies the
//! whole batch or nothing.
//!
//! ```text
//! command ─▶ classify ─▶ CommandBatch ─▶ ScriptBuilder ─▶ ScriptExecutor ─▶ materialize
//! ```
//!
//! Structural schema commands (`CREATE CLASS`, `DROP INDEX`, ...) are refused
//! at submission time and never reach the batch.

mod batch;
mod classifier;
mod executor;
mod materialize;
mod script;
mod session;

pub use batch::CommandBatch;
pub use classifier::{Classification, classify, ensure_transactional};
pub use executor::ScriptExecutor;
pub use materialize::{VALUE_FIELD, affected_rows, materialize};
pub use script::{ScriptBuilder, normalize_line_breaks};
pub use session::{BatchSession, BatchState};

#[cfg(test)]
mod tests;
