//! Metadata Tests
//!
//! Schema built through the driver, then read back through
//! `Connection::metadata()`.

use crate::fixtures::{CommitMode, TestDatabase, test_database};
use anyhow::{Context, Result};
use docql_core::{Connection, DatabaseMetadata, FunctionDef, QueryResult, Value};
use docql_driver::DocqlConnection;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn names(result: &QueryResult, column: &str) -> Vec<String> {
    result
        .column_values(column)
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn metadata(conn: &DocqlConnection) -> Result<&dyn DatabaseMetadata> {
    conn.metadata().context("connection exposes no metadata")
}

/// `Item` with two properties and a unique index, `Book` extending it
async fn schema_database() -> Result<TestDatabase> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Auto).await?;
    for command in [
        "CREATE PROPERTY Item.name STRING",
        "CREATE PROPERTY Item.price DOUBLE",
        "CREATE INDEX Item.name ON Item (name) UNIQUE",
        "CREATE CLASS Book EXTENDS Item",
        "CREATE PROPERTY Book.isbn STRING",
        "CREATE CLASS OUser",
    ] {
        conn.execute(command)
            .await
            .with_context(|| format!("failed to run {}", command))?;
    }
    db.engine()
        .await
        .define_function(FunctionDef::new("discount", vec!["price".into()]))
        .await;
    Ok(db)
}

#[tokio::test]
async fn test_session_details() -> Result<()> {
    let db = schema_database().await?;
    let conn = db.connect(CommitMode::Auto).await?;
    let meta = metadata(&conn)?;

    assert_eq!(meta.product_name(), "OrientDB");
    assert_eq!(meta.url(), db.url());
    assert_eq!(
        names(&meta.catalogs().await?, "TABLE_CAT"),
        vec![db.name().to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_tables_reflect_created_classes() -> Result<()> {
    let db = schema_database().await?;
    let conn = db.connect(CommitMode::Auto).await?;
    let meta = metadata(&conn)?;

    let all = meta.tables(None, None).await?;
    let user = meta.tables(None, Some(&["TABLE"][..])).await?;

    assert_eq!(names(&all, "TABLE_NAME"), vec!["Item", "Book", "OUser"]);
    assert_eq!(names(&user, "TABLE_NAME"), vec!["Item", "Book"]);
    Ok(())
}

#[rstest]
#[case::all_of_item(Some("Item"), None, vec!["name", "price"])]
#[case::by_prefix(None, Some("pr%"), vec!["price"])]
#[case::single_char(Some("B__k"), None, vec!["isbn"])]
#[case::nothing(Some("Missing"), None, vec![])]
#[tokio::test]
async fn test_columns(
    #[case] table: Option<&str>,
    #[case] column: Option<&str>,
    #[case] expected: Vec<&str>,
) -> Result<()> {
    let db = schema_database().await?;
    let conn = db.connect(CommitMode::Auto).await?;

    let result = metadata(&conn)?.columns(table, column).await?;

    assert_eq!(names(&result, "COLUMN_NAME"), expected);
    Ok(())
}

#[tokio::test]
async fn test_keys_and_indexes() -> Result<()> {
    let db = schema_database().await?;
    let conn = db.connect(CommitMode::Auto).await?;
    let meta = metadata(&conn)?;

    let keys = meta.primary_keys("Item").await?;
    let indexes = meta.index_info("Item", false).await?;

    assert_eq!(names(&keys, "COLUMN_NAME"), vec!["name"]);
    assert_eq!(names(&indexes, "INDEX_NAME"), vec!["Item.name"]);
    assert_eq!(names(&indexes, "TYPE"), vec!["UNIQUE"]);
    Ok(())
}

#[tokio::test]
async fn test_super_tables_follow_extends() -> Result<()> {
    let db = schema_database().await?;
    let conn = db.connect(CommitMode::Auto).await?;

    let result = metadata(&conn)?.super_tables("book").await?;

    assert_eq!(names(&result, "SUPERTABLE_NAME"), vec!["Item"]);
    Ok(())
}

#[tokio::test]
async fn test_functions_as_procedures() -> Result<()> {
    let db = schema_database().await?;
    let conn = db.connect(CommitMode::Auto).await?;
    let meta = metadata(&conn)?;

    let procedures = meta.procedures(Some("disc%")).await?;
    let columns = meta.procedure_columns(None).await?;

    assert_eq!(names(&procedures, "PROCEDURE_NAME"), vec!["discount"]);
    assert_eq!(names(&columns, "COLUMN_NAME"), vec!["price", "return"]);
    assert_eq!(
        columns.column_values("COLUMN_TYPE"),
        vec![Value::Int32(1), Value::Int32(5)]
    );
    Ok(())
}

#[tokio::test]
async fn test_schema_changes_are_visible_immediately() -> Result<()> {
    let db = test_database().await?;
    let conn = db.connect(CommitMode::Auto).await?;
    let meta = metadata(&conn)?;
    assert_eq!(meta.user_types().await?.row_count(), 1);

    conn.execute("CREATE CLASS Order").await?;

    assert_eq!(
        names(&meta.user_types().await?, "TYPE_NAME"),
        vec!["Item", "Order"]
    );
    Ok(())
}
