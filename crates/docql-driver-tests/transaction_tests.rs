//! Transaction Tests
//!
//! Manual-commit batches against the in-memory engine: commands queue up,
//! reach the engine as one begin/commit script on commit, and either all
//! take effect or none do.

use crate::fixtures::{CommitMode, ITEM_CLASS, TestDatabase, test_database};
use anyhow::{Context, Result};
use docql_batch::{BatchState, VALUE_FIELD};
use docql_core::{Connection, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Two inserts committed together both land, in one script
#[tokio::test]
async fn test_commit_applies_all_commands() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;

    conn.execute("INSERT INTO Item SET name = 'n1'").await?;
    conn.execute("INSERT INTO Item SET name = 'n2'").await?;
    assert_eq!(db.count(ITEM_CLASS).await?, 0, "nothing is written before commit");

    let result = conn.commit().await.context("commit failed")?;

    assert_eq!(result.affected_rows, 2);
    assert_eq!(
        result.rows[0].get_by_name(VALUE_FIELD),
        Some(&Value::Int64(2))
    );
    assert_eq!(conn.session_state().await, Some(BatchState::Committed));
    assert_eq!(db.count(ITEM_CLASS).await?, 2);
    assert_eq!(db.engine().await.script_count(), 1);
    Ok(())
}

/// Structural commands are refused while autocommit is off
#[rstest]
#[case::create_class("CREATE CLASS T")]
#[case::create_property("CREATE PROPERTY Item.name STRING")]
#[case::create_index("CREATE INDEX Item.name ON Item (name) UNIQUE")]
#[case::drop_class("drop class Item")]
#[case::alter_property("ALTER PROPERTY Item.name NOTNULL true")]
#[tokio::test]
async fn test_structural_command_rejected(#[case] command: &str) -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;

    let err = conn.execute(command).await.unwrap_err();

    assert!(err.is_rejected(), "unexpected error: {err}");
    assert!(conn.pending_commands().await.is_empty());
    assert_eq!(db.engine().await.script_count(), 0);
    Ok(())
}

/// A rejected command leaves earlier queued commands alone
#[tokio::test]
async fn test_rejection_keeps_queued_commands() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;

    conn.execute("INSERT INTO Item SET name = 'kept'").await?;
    assert!(conn.execute("CREATE CLASS Other").await.is_err());
    conn.commit().await?;

    assert_eq!(db.count(ITEM_CLASS).await?, 1);
    assert!(db.count("Other").await.is_err(), "class was never created");
    Ok(())
}

/// A failing command rolls back the whole batch
#[tokio::test]
async fn test_failed_commit_writes_nothing() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;

    conn.execute("INSERT INTO Item SET name = 'n1'").await?;
    conn.execute("INSERT INTO BadClass SET x = 1").await?;

    let err = conn.commit().await.unwrap_err();

    assert!(err.is_execution(), "unexpected error: {err}");
    assert!(err.to_string().contains("BadClass"));
    assert_eq!(db.count(ITEM_CLASS).await?, 0);
    Ok(())
}

/// A unique-index violation part way through the batch undoes earlier writes
#[tokio::test]
async fn test_constraint_violation_rolls_back() -> Result<()> {
    let db = test_database().await?;
    let setup = db.connect(CommitMode::Auto).await?;
    setup
        .execute("CREATE INDEX Item.name ON Item (name) UNIQUE")
        .await?;

    let conn = db.connect(CommitMode::Manual).await?;
    conn.execute("INSERT INTO Item SET name = 'a'").await?;
    conn.execute("INSERT INTO Item SET name = 'b'").await?;
    conn.execute("INSERT INTO Item SET name = 'a'").await?;

    let err = conn.commit().await.unwrap_err();

    assert!(err.is_execution());
    assert_eq!(db.count(ITEM_CLASS).await?, 0);
    Ok(())
}

/// Malformed commands surface as syntax errors at commit
#[tokio::test]
async fn test_unparseable_command_is_syntax_error() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;

    conn.execute("INSERT INTO Item SET name = 'ok'").await?;
    conn.execute("INSRT INTO Item SET name = 'typo'").await?;

    let err = conn.commit().await.unwrap_err();

    assert!(err.is_syntax(), "unexpected error: {err}");
    assert_eq!(db.count(ITEM_CLASS).await?, 0);
    Ok(())
}

/// Committing twice is a protocol error and does not reach the engine again
#[tokio::test]
async fn test_second_commit_is_protocol_misuse() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;
    conn.execute("INSERT INTO Item SET name = 'n1'").await?;
    conn.commit().await?;

    let err = conn.commit().await.unwrap_err();

    assert!(err.is_protocol_misuse());
    assert_eq!(db.engine().await.script_count(), 1);
    assert_eq!(db.count(ITEM_CLASS).await?, 1);
    Ok(())
}

/// A failed commit spends the session; a new command starts a fresh one
#[tokio::test]
async fn test_retry_after_failure_needs_new_commands() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;
    conn.execute("INSERT INTO BadClass SET x = 1").await?;
    assert!(conn.commit().await.is_err());

    assert!(conn.commit().await.unwrap_err().is_protocol_misuse());

    conn.execute("INSERT INTO Item SET name = 'retry'").await?;
    conn.commit().await?;
    assert_eq!(db.count(ITEM_CLASS).await?, 1);
    Ok(())
}

/// Empty and whitespace-only commands are ignored
#[rstest]
#[case::empty("")]
#[case::spaces("   ")]
#[case::newline("\n")]
#[tokio::test]
async fn test_blank_command_is_noop(#[case] command: &str) -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;
    conn.execute("INSERT INTO Item SET name = 'n1'").await?;

    let result = conn.execute(command).await?;

    assert!(!result.queued);
    assert_eq!(conn.pending_commands().await.len(), 1);
    Ok(())
}

/// Executing the same command twice queues it twice
#[tokio::test]
async fn test_same_command_twice() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;

    conn.execute("INSERT INTO Item SET name = 'dup'").await?;
    conn.execute("INSERT INTO Item SET name = 'dup'").await?;

    assert_eq!(conn.pending_commands().await.len(), 2);
    let result = conn.commit().await?;
    assert_eq!(result.affected_rows, 2);
    assert_eq!(db.count(ITEM_CLASS).await?, 2);
    Ok(())
}

/// A command issued after commit opens a new transaction
#[tokio::test]
async fn test_new_command_after_commit() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;
    conn.execute("INSERT INTO Item SET name = 'first'").await?;
    conn.commit().await?;

    conn.execute("INSERT INTO Item SET name = 'second'").await?;

    assert_eq!(conn.session_state().await, Some(BatchState::Accumulating));
    assert_eq!(db.count(ITEM_CLASS).await?, 1);
    conn.commit().await?;
    assert_eq!(db.count(ITEM_CLASS).await?, 2);
    assert_eq!(db.engine().await.script_count(), 2);
    Ok(())
}

/// Switching autocommit back on drops the open transaction
#[tokio::test]
async fn test_enabling_autocommit_discards_batch() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;
    conn.execute("INSERT INTO Item SET name = 'lost'").await?;

    conn.set_auto_commit(true).await?;

    assert!(!conn.has_session().await);
    conn.execute("INSERT INTO Item SET name = 'kept'").await?;
    let stored = db.engine().await.records_of(ITEM_CLASS).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].get("name"), Some(&Value::String("kept".into())));
    Ok(())
}

/// Rollback discards queued commands without contacting the engine
#[tokio::test]
async fn test_rollback_discards_batch() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;
    conn.execute("INSERT INTO Item SET name = 'n1'").await?;

    conn.rollback().await?;

    assert!(conn.pending_commands().await.is_empty());
    assert_eq!(db.engine().await.script_count(), 0);
    assert_eq!(db.count(ITEM_CLASS).await?, 0);
    Ok(())
}

/// Reads run immediately and do not see uncommitted writes
#[tokio::test]
async fn test_query_bypasses_batch() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Manual).await?;
    conn.execute("INSERT INTO Item SET name = 'pending'").await?;

    let before = conn.query("SELECT FROM Item").await?;
    conn.commit().await?;
    let after = conn.query("SELECT FROM Item WHERE name = 'pending'").await?;

    assert_eq!(before.row_count(), 0);
    assert_eq!(after.row_count(), 1);
    assert_eq!(
        after.rows[0].get_by_name("name"),
        Some(&Value::String("pending".into()))
    );
    Ok(())
}

/// The same writes give the same stored state in either mode
#[rstest]
#[case::auto(CommitMode::Auto)]
#[case::manual(CommitMode::Manual)]
#[tokio::test]
async fn test_mode_independent_outcome(#[case] mode: CommitMode) -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(mode).await?;

    conn.execute("INSERT INTO Item SET name = 'a', price = 1").await?;
    conn.execute("INSERT INTO Item SET name = 'b', price = 2").await?;
    conn.execute("UPDATE Item SET price = 5 WHERE name = 'a'").await?;
    conn.execute("DELETE FROM Item WHERE name = 'b'").await?;
    conn.commit().await?;

    let stored = db.engine().await.records_of(ITEM_CLASS).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].get("price"), Some(&Value::Int64(5)));
    Ok(())
}

/// Separate connections to one database see committed work only
#[tokio::test]
async fn test_other_connection_sees_commit() -> Result<()> {
    let db = test_database().await?;
    let writer = db.connect(CommitMode::Manual).await?;
    let reader = db.connect(CommitMode::Auto).await?;

    writer.execute("INSERT INTO Item SET name = 'shared'").await?;
    assert_eq!(reader.query("SELECT FROM Item").await?.row_count(), 0);

    writer.commit().await?;
    assert_eq!(reader.query("SELECT FROM Item").await?.row_count(), 1);
    Ok(())
}

/// A database without the class rejects writes to it in autocommit mode too
#[tokio::test]
async fn test_autocommit_error_is_immediate() -> Result<()> {
    let db = TestDatabase::new();
    let conn = db.connect(CommitMode::Auto).await?;

    let err = conn
        .execute("INSERT INTO Item SET name = 'x'")
        .await
        .unwrap_err();

    assert!(err.is_execution());
    Ok(())
}
