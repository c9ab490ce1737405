//! DDL/DML text generation

use super::types::TableRef;
use crate::schema::{ColumnType, MasterSchema};

/// Quote an identifier for DuckDB
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal for DuckDB
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Qualified, quoted `"NAMESPACE"."NAME"`
pub(crate) fn qualified(namespace: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(namespace), quote_ident(name))
}

/// SQL type of an inferred column
pub fn sql_type(column_type: ColumnType, char_limit: usize) -> String {
    match column_type {
        ColumnType::String => format!("VARCHAR({char_limit})"),
        ColumnType::Int32 => "INTEGER".to_string(),
        ColumnType::Int64 => "BIGINT".to_string(),
        ColumnType::Decimal => "DECIMAL(18,2)".to_string(),
        ColumnType::Bool => "BOOLEAN".to_string(),
        ColumnType::Timestamp => "TIMESTAMP".to_string(),
    }
}

/// `CREATE SEQUENCE` for the surrogate key
pub(crate) fn create_sequence_sql(table: &TableRef) -> String {
    format!(
        "CREATE SEQUENCE IF NOT EXISTS {}",
        qualified(table.namespace(), &table.sequence())
    )
}

/// `CREATE TABLE` with one column per schema entry plus the system columns
pub fn create_table_sql(table: &TableRef, schema: &MasterSchema, char_limit: usize) -> String {
    let sequence = qualified(table.namespace(), &table.sequence());

    let mut columns: Vec<String> = schema
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), sql_type(c.column_type, char_limit)))
        .collect();

    columns.push(format!(
        "{} BIGINT PRIMARY KEY DEFAULT nextval({})",
        quote_ident(&table.id_column()),
        quote_literal(&sequence)
    ));
    columns.push(format!(
        "{} TIMESTAMP NOT NULL DEFAULT current_timestamp",
        quote_ident(&table.updated_column())
    ));

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified(table.namespace(), table.table()),
        columns.join(", ")
    )
}

/// All-VARCHAR staging table mirroring the schema's columns
pub(crate) fn create_staging_sql(namespace: &str, stage: &str, schema: &MasterSchema) -> String {
    let columns: Vec<String> = schema
        .names()
        .map(|name| format!("{} VARCHAR", quote_ident(name)))
        .collect();

    format!(
        "CREATE TABLE {} ({})",
        qualified(namespace, stage),
        columns.join(", ")
    )
}

/// Move staged rows into the destination, casting each column to its type
pub(crate) fn insert_from_staging_sql(
    table: &TableRef,
    stage: &str,
    schema: &MasterSchema,
    char_limit: usize,
) -> String {
    let targets: Vec<String> = schema.names().map(quote_ident).collect();
    let casts: Vec<String> = schema
        .columns()
        .iter()
        .map(|c| {
            format!(
                "CAST({} AS {})",
                quote_ident(&c.name),
                sql_type(c.column_type, char_limit)
            )
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) SELECT {} FROM {}",
        qualified(table.namespace(), table.table()),
        targets.join(", "),
        casts.join(", "),
        qualified(table.namespace(), stage)
    )
}
