//! Tests for DDL statement construction.

use loglake::loglake::schema::{ColumnSpec, ColumnType, TableSpec};
use loglake::loglake::sql::ddl;

fn enrollment() -> TableSpec {
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

#[test]
fn test_create_database() {
    assert_eq!(
        ddl::create_database("logs"),
        "CREATE DATABASE IF NOT EXISTS `logs`"
    );
}

#[test]
fn test_create_table_uses_versioned_merge_engine_and_ordering_key() {
    assert_eq!(
        ddl::create_table("logs", &enrollment()),
        "CREATE TABLE IF NOT EXISTS `logs`.`enrollment` \
         (`user_id` Int64, `course_id` Int64, `update_time` DateTime) \
         ENGINE = ReplacingMergeTree(`update_time`) \
         ORDER BY (`user_id`, `course_id`)"
    );
}

#[test]
fn test_column_order_follows_spec_order() {
    let mut spec = enrollment();
    spec.columns.swap(0, 1);
    let sql = ddl::create_table("logs", &spec);
    let user_idx = sql.find("`user_id`").unwrap();
    let course_idx = sql.find("`course_id`").unwrap();
    assert!(course_idx < user_idx);
}

#[test]
fn test_maintenance_statements() {
    assert_eq!(
        ddl::truncate_table("logs", "enrollment"),
        "TRUNCATE TABLE `logs`.`enrollment`"
    );
    assert_eq!(
        ddl::optimize_final("logs", "enrollment"),
        "OPTIMIZE TABLE `logs`.`enrollment` FINAL"
    );
    assert_eq!(
        ddl::exists_table("logs", "enrollment"),
        "EXISTS TABLE `logs`.`enrollment`"
    );
}

#[test]
fn test_insert_statement_lists_columns_in_order() {
    let columns = vec!["user_id".to_string(), "update_time".to_string()];
    assert_eq!(
        ddl::insert_into("logs", "enrollment", &columns),
        "INSERT INTO `logs`.`enrollment` (`user_id`, `update_time`) FORMAT JSONEachRow"
    );
}

#[test]
fn test_identifiers_are_quoted_consistently() {
    let sql = ddl::create_table("logs", &enrollment());
    // Every identifier position is backtick-quoted; none appear bare.
    assert!(!sql.contains(" user_id "));
    assert!(sql.contains("`logs`.`enrollment`"));
}
