//! Tests for the table manager against a recording executor.

use std::collections::HashMap;
use std::sync::Arc;

use loglake::loglake::normalize::{FieldValue, Row};
use loglake::loglake::schema::{ColumnSpec, ColumnType, TableSpec};
use loglake::loglake::sink::TableManager;

use super::mock_executor::RecordingExecutor;

fn enrollment_spec() -> TableSpec {
    TableSpec::new(
        "enrollment",
        vec![
            ColumnSpec::new("user_id", ColumnType::Int64),
            ColumnSpec::new("course_id", ColumnType::Int64),
            ColumnSpec::new("update_time", ColumnType::DateTime),
        ],
        vec!["user_id".to_string(), "course_id".to_string()],
    )
    .unwrap()
}

fn row(user_id: i64, course_id: i64) -> Row {
    let mut row = HashMap::new();
    row.insert("user_id".to_string(), FieldValue::Integer(user_id));
    row.insert("course_id".to_string(), FieldValue::Integer(course_id));
    row.insert(
        "update_time".to_string(),
        FieldValue::Timestamp(
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        ),
    );
    row
}

fn manager() -> (Arc<RecordingExecutor>, TableManager<RecordingExecutor>) {
    let executor = Arc::new(RecordingExecutor::new());
    let manager = TableManager::new("logs", Arc::clone(&executor));
    (executor, manager)
}

#[tokio::test]
async fn test_ensure_table_is_idempotent() {
    let (executor, manager) = manager();
    let spec = enrollment_spec();

    manager.ensure_table(&spec).await.unwrap();
    manager.ensure_table(&spec).await.unwrap();

    let statements = executor.statements();
    // Identical statements both times; IF NOT EXISTS makes the second a
    // server-side no-op.
    assert_eq!(statements.len(), 4);
    assert_eq!(statements[0], statements[2]);
    assert_eq!(statements[1], statements[3]);
    assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS `logs`.`enrollment`"));
}

#[tokio::test]
async fn test_load_ensures_inserts_then_finalizes_merge() {
    let (executor, manager) = manager();
    let spec = enrollment_spec();

    let loaded = manager.load(&spec, &[row(1, 10), row(2, 20)]).await.unwrap();
    assert_eq!(loaded, 2);

    let statements = executor.statements();
    assert_eq!(statements.len(), 4);
    assert!(statements[0].starts_with("CREATE DATABASE"));
    assert!(statements[1].starts_with("CREATE TABLE"));
    assert!(statements[2].starts_with("INSERT INTO `logs`.`enrollment`"));
    assert_eq!(statements[3], "OPTIMIZE TABLE `logs`.`enrollment` FINAL");

    let bodies = executor.insert_bodies();
    assert_eq!(bodies.len(), 1);
    let lines: Vec<&str> = bodies[0].lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"user_id\":1"));
    assert!(lines[0].contains("\"update_time\":\"2024-03-01 12:00:00\""));
}

#[tokio::test]
async fn test_load_of_empty_batch_only_ensures_table() {
    let (executor, manager) = manager();

    let loaded = manager.load(&enrollment_spec(), &[]).await.unwrap();

    assert_eq!(loaded, 0);
    let statements = executor.statements();
    assert!(statements.iter().all(|s| !s.starts_with("INSERT")));
    assert!(statements.iter().all(|s| !s.starts_with("OPTIMIZE")));
}

#[tokio::test]
async fn test_null_fields_are_omitted_from_insert_body() {
    let (executor, manager) = manager();
    let mut sparse = row(1, 10);
    sparse.insert("course_id".to_string(), FieldValue::Null);

    manager.load(&enrollment_spec(), &[sparse]).await.unwrap();

    let bodies = executor.insert_bodies();
    assert!(!bodies[0].contains("course_id"));
}

#[tokio::test]
async fn test_truncate_then_failed_load_leaves_table_empty() {
    let (executor, manager) = manager();
    let spec = enrollment_spec();
    executor.fail_when_contains("INSERT");

    manager.truncate("enrollment").await.unwrap();
    let result = manager.load(&spec, &[row(1, 10)]).await;

    // The documented (lossy) boundary: truncation happened, the reload did
    // not, and nothing recovers the truncated rows.
    assert!(result.is_err());
    let statements = executor.statements();
    assert_eq!(statements[0], "TRUNCATE TABLE `logs`.`enrollment`");
    assert!(statements.iter().all(|s| !s.starts_with("INSERT")));
    assert!(statements.iter().all(|s| !s.starts_with("OPTIMIZE")));
}

#[tokio::test]
async fn test_failed_insert_skips_merge_finalization() {
    let (executor, manager) = manager();
    executor.fail_when_contains("INSERT");

    let result = manager.load(&enrollment_spec(), &[row(1, 10)]).await;

    assert!(result.is_err());
    assert!(executor
        .statements()
        .iter()
        .all(|s| !s.starts_with("OPTIMIZE")));
}
