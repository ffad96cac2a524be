//! Connection owning the optional batch session

use crate::DRIVER_NAME;
use crate::metadata::DocqlMetadata;
use async_trait::async_trait;
use docql_batch::{BatchSession, BatchState, affected_rows, materialize};
use docql_core::{
    Connection, ConnectionConfig, DatabaseMetadata, DocqlError, DriverSettings, QueryResult,
    Result, ScriptEngine, StatementResult,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;

/// A connection onto one engine session.
///
/// In autocommit mode every command runs on its own. With autocommit off,
/// data commands are queued into a [`BatchSession`] and sent to the engine
/// as one script on [`Connection::commit`]. Read queries always run
/// immediately.
pub struct DocqlConnection {
    engine: Arc<dyn ScriptEngine>,
    settings: DriverSettings,
    config: ConnectionConfig,
    metadata: DocqlMetadata,
    auto_commit: AtomicBool,
    session: Mutex<Option<BatchSession>>,
    closed: AtomicBool,
}

impl DocqlConnection {
    pub fn new(
        engine: Arc<dyn ScriptEngine>,
        settings: DriverSettings,
        config: ConnectionConfig,
    ) -> Self {
        let auto_commit = settings.connection.auto_commit;
        Self {
            metadata: DocqlMetadata::new(engine.clone()),
            engine,
            settings,
            config,
            auto_commit: AtomicBool::new(auto_commit),
            session: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn engine(&self) -> &Arc<dyn ScriptEngine> {
        &self.engine
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Commands queued in the open transaction
    pub async fn pending_commands(&self) -> Vec<String> {
        let slot = self.session.lock().await;
        match slot.as_ref() {
            Some(session) if session.state() == BatchState::Accumulating => {
                session.commands().to_vec()
            }
            _ => Vec::new(),
        }
    }

    /// State of the held session, if there is one
    pub async fn session_state(&self) -> Option<BatchState> {
        self.session.lock().await.as_ref().map(BatchSession::state)
    }

    pub async fn has_session(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Rows of the last successful commit, while its session is still held
    pub async fn transaction_result(&self) -> Option<QueryResult> {
        self.session
            .lock()
            .await
            .as_ref()
            .and_then(|s| s.result().cloned())
    }

    /// Release a committed session.
    ///
    /// Follows statement-close semantics: only has an effect in autocommit
    /// mode. Returns whether a session was released.
    pub async fn close_batch(&self) -> bool {
        let mut slot = self.session.lock().await;
        let released = slot
            .as_mut()
            .is_some_and(|s| s.close(self.auto_commit.load(Ordering::SeqCst)));
        if released {
            *slot = None;
        }
        released
    }

    fn ensure_not_closed(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DocqlError::Connection("connection is closed".to_string()));
        }
        Ok(())
    }

    /// Run one command outside any batch
    async fn run_immediate(&self, command: &str) -> Result<QueryResult> {
        let start = Instant::now();
        let raw = self.engine.execute_command(command).await?;
        let affected = affected_rows(&raw);
        let records = materialize(self.engine.as_ref(), raw).await;

        Ok(QueryResult::from_records(records)
            .with_affected_rows(affected)
            .with_execution_time_ms(start.elapsed().as_millis() as u64))
    }

    /// Queue a command into the held session, opening a fresh one when the
    /// slot is empty or its session can no longer accept commands
    async fn enqueue(&self, command: &str) -> Result<StatementResult> {
        let mut slot = self.session.lock().await;
        let reusable = slot
            .as_ref()
            .is_some_and(|s| s.state() == BatchState::Accumulating);
        if !reusable {
            if let Some(previous) = slot.as_ref() {
                tracing::debug!(
                    previous = %previous.id(),
                    state = ?previous.state(),
                    "replacing finished batch session"
                );
            }
            *slot = Some(BatchSession::new(
                self.engine.clone(),
                &self.settings.transaction,
            ));
        }

        match slot.as_mut() {
            Some(session) => {
                session.append(command)?;
                Ok(StatementResult::queued())
            }
            None => Err(DocqlError::ProtocolMisuse(
                "no batch session available".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Connection for DocqlConnection {
    fn driver_name(&self) -> &str {
        DRIVER_NAME
    }

    #[tracing::instrument(skip(self, command), fields(len = command.len()))]
    async fn execute(&self, command: &str) -> Result<StatementResult> {
        self.ensure_not_closed()?;
        if command.trim().is_empty() {
            return Ok(StatementResult::ignored());
        }

        if self.auto_commit() {
            let result = self.run_immediate(command).await?;
            tracing::debug!(affected = result.affected_rows, "command executed");
            Ok(StatementResult::executed(result))
        } else {
            self.enqueue(command).await
        }
    }

    /// Runs on the engine at once in either mode, bypassing the classifier
    /// and any held batch.
    #[tracing::instrument(skip(self, command), fields(len = command.len()))]
    async fn query(&self, command: &str) -> Result<QueryResult> {
        self.ensure_not_closed()?;
        if command.trim().is_empty() {
            return Ok(QueryResult::empty());
        }
        let result = self.run_immediate(command).await?;
        tracing::debug!(rows = result.row_count(), "query executed");
        Ok(result)
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit.load(Ordering::SeqCst)
    }

    async fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        self.ensure_not_closed()?;
        let mut slot = self.session.lock().await;
        if enabled {
            if let Some(mut session) = slot.take() {
                session.abandon();
            }
        }
        self.auto_commit.store(enabled, Ordering::SeqCst);
        tracing::debug!(auto_commit = enabled, "autocommit changed");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn commit(&self) -> Result<QueryResult> {
        self.ensure_not_closed()?;
        if self.auto_commit() {
            return Ok(QueryResult::empty());
        }

        let mut slot = self.session.lock().await;
        match slot.as_mut() {
            Some(session) => session.commit().await,
            None => Ok(QueryResult::empty()),
        }
    }

    async fn rollback(&self) -> Result<()> {
        self.ensure_not_closed()?;
        let mut slot = self.session.lock().await;
        if slot
            .as_ref()
            .is_some_and(|s| s.state() == BatchState::Accumulating)
        {
            if let Some(mut session) = slot.take() {
                session.abandon();
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(mut session) = self.session.lock().await.take() {
            session.abandon();
        }
        self.engine.close().await?;
        tracing::info!(database = %self.engine.database_name(), "connection closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn metadata(&self) -> Option<&dyn DatabaseMetadata> {
        Some(&self.metadata)
    }
}
