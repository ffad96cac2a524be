//! Decides whether a command may take part in an atomic script

use docql_core::{DocqlError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Structural schema mutations: `<CREATE|DROP|ALTER> <CLASS|PROPERTY|INDEX|DATABASE> ...`
static NON_TRANSACTIONAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(CREATE|DROP|ALTER)\s+(CLASS|PROPERTY|INDEX|DATABASE)(\s|$)")
        .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The command can be wrapped in a begin/commit script
    Accept,
    /// The command mutates schema and must not appear inside a transaction
    Reject,
}

/// Classify a command by its literal text. Matching is purely lexical.
pub fn classify(command: &str) -> Classification {
    if NON_TRANSACTIONAL_REGEX.is_match(command.trim()) {
        Classification::Reject
    } else {
        Classification::Accept
    }
}

/// Fail with [`DocqlError::RejectedCommand`] if the command cannot join a transaction
pub fn ensure_transactional(command: &str) -> Result<()> {
    match classify(command) {
        Classification::Accept => Ok(()),
        Classification::Reject => {
            tracing::debug!(len = command.len(), "rejected structural command");
            Err(DocqlError::RejectedCommand(command.trim().to_string()))
        }
    }
}
