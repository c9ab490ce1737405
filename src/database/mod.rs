//! Relational sink backed by DuckDB
//!
//! Creates the destination namespace and table on demand and bulk loads
//! normalized pages through DuckDB's Appender.

mod ddl;
mod sink;
mod types;

pub use ddl::{create_table_sql, quote_ident, sql_type};
pub use sink::{DuckDbSink, RelationalSink, SinkOptions};
pub use types::TableRef;
