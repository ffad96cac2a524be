//! Submits a rendered script to the engine

use docql_core::{DocqlError, RawResult, Result, ScriptEngine};
use std::sync::Arc;
use std::time::Instant;

/// Runs scripts against one engine session in a fixed script language
#[derive(Clone)]
pub struct ScriptExecutor {
    engine: Arc<dyn ScriptEngine>,
    language: String,
}

impl std::fmt::Debug for ScriptExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptExecutor")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl ScriptExecutor {
    pub fn new(engine: Arc<dyn ScriptEngine>, language: impl Into<String>) -> Self {
        Self {
            engine,
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn engine(&self) -> &Arc<dyn ScriptEngine> {
        &self.engine
    }

    /// Submit the script as a single unit.
    ///
    /// Parse failures become [`DocqlError::Syntax`]; every other engine
    /// failure becomes [`DocqlError::Execution`].
    #[tracing::instrument(skip(self, script), fields(language = %self.language, script_len = script.len()))]
    pub async fn execute(&self, script: &str) -> Result<RawResult> {
        let start = Instant::now();
        let outcome = self.engine.execute_script(&self.language, script).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(raw) => {
                tracing::debug!(elapsed_ms, "script executed");
                Ok(raw)
            }
            Err(err) => {
                let err = DocqlError::from(err);
                tracing::warn!(elapsed_ms, error = %err, "script failed");
                Err(err)
            }
        }
    }
}
