//! Batch session lifecycle

use crate::{
    CommandBatch, ScriptBuilder, ScriptExecutor, affected_rows, ensure_transactional, materialize,
};
use docql_core::settings::TransactionSettings;
use docql_core::{DocqlError, QueryResult, Record, Result, ScriptEngine};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Lifecycle of a [`BatchSession`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Accepting commands
    Accumulating,
    /// Script ran successfully; commands and rows are fixed
    Committed,
    /// Released, abandoned, or spent by a failed commit
    Closed,
}

/// Commands collected for one manual-commit transaction.
///
/// A session commits at most once. A failed commit spends it: the session
/// moves to [`BatchState::Closed`] and every later `commit` or `append`
/// fails with [`DocqlError::ProtocolMisuse`] without contacting the engine.
#[derive(Debug)]
pub struct BatchSession {
    id: Uuid,
    batch: CommandBatch,
    state: BatchState,
    result: Option<QueryResult>,
    builder: ScriptBuilder,
    executor: ScriptExecutor,
}

impl BatchSession {
    pub fn new(engine: Arc<dyn ScriptEngine>, settings: &TransactionSettings) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session_id = %id, "batch session created");
        Self {
            id,
            batch: CommandBatch::new(),
            state: BatchState::Accumulating,
            result: None,
            builder: ScriptBuilder::from_settings(settings),
            executor: ScriptExecutor::new(engine, settings.script_language.clone()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn is_committed(&self) -> bool {
        self.state == BatchState::Committed
    }

    /// Commands accepted so far, in submission order
    pub fn commands(&self) -> &[String] {
        self.batch.commands()
    }

    /// Result of the successful commit, if any
    pub fn result(&self) -> Option<&QueryResult> {
        self.result.as_ref()
    }

    /// Rows produced by the successful commit; empty before that
    pub fn rows(&self) -> &[Record] {
        self.result
            .as_ref()
            .map(|r| r.records.as_slice())
            .unwrap_or(&[])
    }

    /// Add a command to the open transaction.
    ///
    /// Returns `Ok(false)` when the text is blank and nothing was stored.
    pub fn append(&mut self, command: &str) -> Result<bool> {
        self.ensure_accumulating()?;
        if command.trim().is_empty() {
            return Ok(false);
        }
        ensure_transactional(command)?;

        let stored = self.batch.push(command);
        tracing::debug!(
            session_id = %self.id,
            len = command.len(),
            pending = self.batch.len(),
            "command queued"
        );
        Ok(stored)
    }

    /// Run every queued command as one script and fix the result.
    ///
    /// The engine is contacted exactly once. An empty batch commits without
    /// an engine call and yields no rows.
    #[tracing::instrument(skip(self), fields(session_id = %self.id, commands = self.batch.len()))]
    pub async fn commit(&mut self) -> Result<QueryResult> {
        self.ensure_accumulating()?;
        let start = Instant::now();

        if self.batch.is_empty() {
            tracing::debug!("empty batch, nothing to submit");
            return Ok(self.finish(QueryResult::empty()).clone());
        }

        let script = self.builder.build(self.batch.commands());
        let raw = match self.executor.execute(&script).await {
            Ok(raw) => raw,
            Err(err) => {
                self.state = BatchState::Closed;
                tracing::info!(error = %err, "batch commit failed, session spent");
                return Err(err);
            }
        };

        let affected = affected_rows(&raw);
        let records = materialize(self.executor.engine().as_ref(), raw).await;
        let result = QueryResult::from_records(records)
            .with_affected_rows(affected)
            .with_execution_time_ms(start.elapsed().as_millis() as u64);

        tracing::info!(rows = result.row_count(), affected, "batch committed");
        Ok(self.finish(result).clone())
    }

    /// Release a committed session.
    ///
    /// Only takes effect when the owning connection is in autocommit mode;
    /// otherwise the rows stay readable. Returns whether the session closed.
    pub fn close(&mut self, auto_commit: bool) -> bool {
        if self.state != BatchState::Committed || !auto_commit {
            return false;
        }
        self.state = BatchState::Closed;
        self.result = None;
        tracing::debug!(session_id = %self.id, "batch session closed");
        true
    }

    /// Drop the session without committing. No engine call is made.
    pub fn abandon(&mut self) {
        if self.state == BatchState::Closed {
            return;
        }
        tracing::info!(
            session_id = %self.id,
            discarded = self.batch.len(),
            committed = self.is_committed(),
            "batch session discarded"
        );
        self.state = BatchState::Closed;
        self.result = None;
    }

    fn finish(&mut self, result: QueryResult) -> &QueryResult {
        self.state = BatchState::Committed;
        self.result.insert(result)
    }

    fn ensure_accumulating(&self) -> Result<()> {
        match self.state {
            BatchState::Accumulating => Ok(()),
            BatchState::Committed | BatchState::Closed => Err(DocqlError::ProtocolMisuse(
                "session already committed".to_string(),
            )),
        }
    }
}
