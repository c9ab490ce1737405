//! Destination table identity

use crate::error::{Error, Result};

/// Destination (namespace, table), upper-cased on construction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    namespace: String,
    table: String,
}

impl TableRef {
    /// Create a table reference
    pub fn new(namespace: &str, table: &str) -> Result<Self> {
        Ok(Self {
            namespace: normalize_identifier(namespace, "namespace")?,
            table: normalize_identifier(table, "table name")?,
        })
    }

    /// Upper-cased namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Upper-cased table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Name of the surrogate key column
    pub fn id_column(&self) -> String {
        format!("ID_DW_{}", self.table)
    }

    /// Name of the load timestamp column
    pub fn updated_column(&self) -> String {
        format!("DT_UPDATE_{}", self.table)
    }

    /// Name of the sequence feeding the surrogate key
    pub fn sequence(&self) -> String {
        format!("SEQ_{}", self.table)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.table)
    }
}

fn normalize_identifier(raw: &str, what: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{what} must not be empty")));
    }
    if trimmed.contains('\0') {
        return Err(Error::validation(format!("{what} contains a NUL character")));
    }
    Ok(trimmed.to_uppercase())
}
