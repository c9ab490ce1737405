//! DuckDB relational sink

use super::ddl::{
    create_sequence_sql, create_staging_sql, create_table_sql, insert_from_staging_sql, qualified,
    quote_ident,
};
use super::types::TableRef;
use crate::error::{Error, Result};
use crate::normalize::{CellValue, NormalizedPage};
use crate::schema::MasterSchema;
use duckdb::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Destination of normalized pages
///
/// Calls are blocking; async callers run them on `spawn_blocking`.
pub trait RelationalSink: Send + Sync {
    /// Create the namespace and table if absent; a no-op when the table exists
    fn ensure_table(&self, table: &TableRef, schema: &MasterSchema) -> Result<()>;

    /// Load one normalized page, returning the number of rows inserted
    fn bulk_insert(
        &self,
        table: &TableRef,
        schema: &MasterSchema,
        page: &NormalizedPage,
    ) -> Result<usize>;
}

/// Sink tuning
#[derive(Debug, Clone)]
pub struct SinkOptions {
    /// Character cap used for string column DDL
    pub field_char_limit: usize,
    /// Rows appended between Appender flushes
    pub batch_size: usize,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            field_char_limit: 500,
            batch_size: 10_000,
        }
    }
}

/// [`RelationalSink`] writing to an embedded DuckDB database
pub struct DuckDbSink {
    /// Root connection; every operation works on its own clone
    root: Arc<Mutex<Connection>>,
    options: SinkOptions,
    connection_string: String,
}

impl DuckDbSink {
    /// Open a database by path, or in memory for `:memory:`
    pub fn open(connection_string: &str, options: SinkOptions) -> Result<Self> {
        let opened = match connection_string.trim() {
            "" => return Err(Error::config("DuckDB connection string is empty")),
            ":memory:" => Connection::open_in_memory(),
            path => Connection::open(path),
        };
        let conn = opened.map_err(|e| {
            Error::config(format!(
                "Failed to open DuckDB database '{connection_string}': {e}"
            ))
        })?;

        info!("Opened DuckDB database: {}", connection_string);

        Ok(Self {
            root: Arc::new(Mutex::new(conn)),
            options,
            connection_string: connection_string.to_string(),
        })
    }

    /// Open an in-memory database
    pub fn in_memory(options: SinkOptions) -> Result<Self> {
        Self::open(":memory:", options)
    }

    /// Sink options
    pub fn options(&self) -> &SinkOptions {
        &self.options
    }

    /// A fresh connection to the same database
    pub fn connection(&self) -> Result<Connection> {
        let root = self
            .root
            .lock()
            .map_err(|_| Error::Other("DuckDB root connection lock poisoned".to_string()))?;
        Ok(root.try_clone()?)
    }

    /// Number of rows in a table
    pub fn count_rows(&self, table: &TableRef) -> Result<u64> {
        let conn = self.connection()?;
        let sql = format!(
            "SELECT COUNT(*) FROM {}",
            qualified(table.namespace(), table.table())
        );
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn schema_exists(conn: &Connection, namespace: &str) -> Result<bool> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.schemata
                 WHERE catalog_name = current_database() AND schema_name = ?",
                params![namespace],
                |row| row.get(0),
            )
            .map_err(|e| Error::ddl(format!("Failed to query schemata: {e}")))?;
        Ok(count > 0)
    }

    fn table_exists(conn: &Connection, table: &TableRef) -> Result<bool> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables
                 WHERE table_catalog = current_database() AND table_schema = ? AND table_name = ?",
                params![table.namespace(), table.table()],
                |row| row.get(0),
            )
            .map_err(|e| Error::ddl(format!("Failed to query tables: {e}")))?;
        Ok(count > 0)
    }

    fn append_rows(
        conn: &Connection,
        namespace: &str,
        stage: &str,
        page: &NormalizedPage,
        batch_size: usize,
    ) -> duckdb::Result<()> {
        let mut appender = conn.appender_to_db(stage, namespace)?;
        let batch_size = batch_size.max(1);

        for (index, row) in page.rows.iter().enumerate() {
            appender.append_row(duckdb::appender_params_from_iter(
                row.iter().map(CellValue::to_sql_text),
            ))?;
            if (index + 1) % batch_size == 0 {
                appender.flush()?;
            }
        }

        appender.flush()
    }
}

impl RelationalSink for DuckDbSink {
    fn ensure_table(&self, table: &TableRef, schema: &MasterSchema) -> Result<()> {
        let conn = self.connection()?;

        if !Self::schema_exists(&conn, table.namespace())? {
            conn.execute_batch(&format!(
                "CREATE SCHEMA IF NOT EXISTS {}",
                quote_ident(table.namespace())
            ))
            .map_err(|e| {
                Error::ddl(format!(
                    "Failed to create namespace {}: {e}",
                    table.namespace()
                ))
            })?;
            info!("Created namespace {}", table.namespace());
        }

        if Self::table_exists(&conn, table)? {
            debug!("Table {} already exists, leaving it untouched", table);
            return Ok(());
        }

        let sql = create_table_sql(table, schema, self.options.field_char_limit);
        debug!("Creating table: {}", sql);

        conn.execute_batch(&create_sequence_sql(table))
            .map_err(|e| Error::ddl(format!("Failed to create sequence for {table}: {e}")))?;
        conn.execute_batch(&sql)
            .map_err(|e| Error::ddl(format!("Failed to create table {table}: {e}")))?;

        info!("Created table {} with {} columns", table, schema.len());
        Ok(())
    }

    fn bulk_insert(
        &self,
        table: &TableRef,
        schema: &MasterSchema,
        page: &NormalizedPage,
    ) -> Result<usize> {
        if page.is_empty() || schema.is_empty() {
            return Ok(0);
        }

        let conn = self.connection()?;
        let stage = format!("__STAGE_{}", uuid::Uuid::new_v4().simple()).to_uppercase();

        conn.execute_batch(&create_staging_sql(table.namespace(), &stage, schema))
            .map_err(|e| Error::bulk_load(format!("Failed to create staging table: {e}")))?;
        let _staging = StagingTable {
            conn: &conn,
            namespace: table.namespace(),
            name: &stage,
        };

        Self::append_rows(
            &conn,
            table.namespace(),
            &stage,
            page,
            self.options.batch_size,
        )
        .map_err(|e| Error::bulk_load(format!("Failed to append rows: {e}")))?;

        let sql = insert_from_staging_sql(table, &stage, schema, self.options.field_char_limit);
        let inserted = conn
            .execute(&sql, [])
            .map_err(|e| Error::bulk_load(format!("Failed to insert into {table}: {e}")))?;

        debug!("Inserted {} rows into {} (page {:?})", inserted, table, page.page);
        Ok(inserted)
    }
}

impl std::fmt::Debug for DuckDbSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbSink")
            .field("connection_string", &self.connection_string)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Drops the staging table when the insert scope ends
struct StagingTable<'a> {
    conn: &'a Connection,
    namespace: &'a str,
    name: &'a str,
}

impl Drop for StagingTable<'_> {
    fn drop(&mut self) {
        let sql = format!(
            "DROP TABLE IF EXISTS {}",
            qualified(self.namespace, self.name)
        );
        if let Err(e) = self.conn.execute_batch(&sql) {
            warn!("Failed to drop staging table {}: {}", self.name, e);
        }
    }
}
