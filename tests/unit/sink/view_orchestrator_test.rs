//! Tests for materialized-view orchestration.

use std::sync::Arc;

use loglake::loglake::schema::{ColumnSpec, ColumnType, TableSpec};
use loglake::loglake::sink::{SinkError, ViewOrchestrator};
use loglake::loglake::sql::{JoinEdge, ViewSpec};

use super::mock_executor::RecordingExecutor;

fn view_spec() -> ViewSpec {
    ViewSpec {
        name: "course_enrollment".to_string(),
        tables: vec![
            TableSpec {
                name: "enrollment".to_string(),
                columns: vec![
                    ColumnSpec::new("user_id", ColumnType::Int64),
                    ColumnSpec::new("course_id", ColumnType::Int64),
                ],
                order_by: vec!["user_id".to_string()],
                version_column: "update_time".to_string(),
            },
            TableSpec {
                name: "course".to_string(),
                columns: vec![
                    ColumnSpec::new("course_id", ColumnType::Int64),
                    ColumnSpec::new("course_name", ColumnType::String),
                ],
                order_by: vec!["course_id".to_string()],
                version_column: "update_time".to_string(),
            },
        ],
        base_table: "enrollment".to_string(),
        edges: vec![JoinEdge::new("enrollment", "course", "course_id")],
        order_by: vec!["e_user_id".to_string()],
        refresh_minutes: 30,
    }
}

fn orchestrator() -> (Arc<RecordingExecutor>, ViewOrchestrator<RecordingExecutor>) {
    let executor = Arc::new(RecordingExecutor::new());
    let views = ViewOrchestrator::new("logs", Arc::clone(&executor));
    (executor, views)
}

#[tokio::test]
async fn test_first_run_creates_backing_table_and_view() {
    let (executor, views) = orchestrator();

    let created = views.ensure_view(&view_spec()).await.unwrap();

    assert!(created);
    let statements = executor.statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0], "EXISTS TABLE `logs`.`course_enrollment`");
    assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS `logs`.`course_enrollment`"));
    assert!(statements[2]
        .starts_with("CREATE MATERIALIZED VIEW IF NOT EXISTS `logs`.`course_enrollment_mv`"));
}

#[tokio::test]
async fn test_existing_backing_table_still_reasserts_view() {
    let (executor, views) = orchestrator();
    executor.set_exists(true);

    let created = views.ensure_view(&view_spec()).await.unwrap();

    assert!(!created);
    let statements = executor.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("EXISTS TABLE"));
    assert!(statements[1].starts_with("CREATE MATERIALIZED VIEW IF NOT EXISTS"));
}

#[tokio::test]
async fn test_validation_failure_emits_no_sql() {
    let (executor, views) = orchestrator();
    let mut spec = view_spec();
    spec.base_table = "unknown".to_string();

    let result = views.ensure_view(&spec).await;

    assert!(matches!(result, Err(SinkError::Statement(_))));
    assert!(executor.statements().is_empty());
}

#[tokio::test]
async fn test_alias_collision_emits_no_sql() {
    let (executor, views) = orchestrator();
    let mut spec = view_spec();
    spec.tables[0].name = "course_info".to_string();
    spec.tables[1].name = "course_internal".to_string();
    spec.base_table = "course_info".to_string();
    spec.edges = vec![JoinEdge::new("course_info", "course_internal", "course_id")];

    let result = views.ensure_view(&spec).await;

    assert!(result.is_err());
    assert!(executor.statements().is_empty());
}
