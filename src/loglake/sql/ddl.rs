//! DDL and maintenance statement builders for the column store.
//!
//! All statements are idempotent (`IF NOT EXISTS`) or safely re-issuable
//! (`TRUNCATE`, `OPTIMIZE ... FINAL`). Identifiers are backtick-quoted
//! consistently across every statement; column order in emitted DDL equals
//! the order in the table spec.

use crate::loglake::schema::TableSpec;

/// Backtick-quote a single identifier.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "\\`"))
}

/// `db`.`name` qualified identifier.
pub fn qualified(database: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(database), quote_ident(name))
}

pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", quote_ident(database))
}

/// CREATE TABLE with a ReplacingMergeTree engine keyed on the spec's version
/// column, so repeated loads of the same ordering key collapse to the row
/// with the latest version after a merge.
pub fn create_table(database: &str, spec: &TableSpec) -> String {
    let fields: Vec<String> = spec
        .columns
        .iter()
        .map(|col| format!("{} {}", quote_ident(&col.name), col.column_type))
        .collect();
    let order_by: Vec<String> = spec.order_by.iter().map(|c| quote_ident(c)).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({}) ENGINE = ReplacingMergeTree({}) ORDER BY ({})",
        qualified(database, &spec.name),
        fields.join(", "),
        quote_ident(&spec.version_column),
        order_by.join(", ")
    )
}

pub fn truncate_table(database: &str, table: &str) -> String {
    format!("TRUNCATE TABLE {}", qualified(database, table))
}

/// Forces the ReplacingMergeTree merge so deduplication is visible to the
/// next read instead of waiting for a background merge.
pub fn optimize_final(database: &str, table: &str) -> String {
    format!("OPTIMIZE TABLE {} FINAL", qualified(database, table))
}

pub fn exists_table(database: &str, table: &str) -> String {
    format!("EXISTS TABLE {}", qualified(database, table))
}

/// INSERT prefix for a JSONEachRow-formatted body.
pub fn insert_into(database: &str, table: &str, columns: &[String]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    format!(
        "INSERT INTO {} ({}) FORMAT JSONEachRow",
        qualified(database, table),
        cols.join(", ")
    )
}
