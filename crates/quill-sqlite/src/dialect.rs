//! SQLite dialect implementation.

use quill_core::dialect::Dialect;
use quill_core::value::{SqlValue, ValueKind};

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn data_type_of(&self, kind: ValueKind) -> String {
        match kind {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::BigInt => "bigint",
            ValueKind::Float => "real",
            ValueKind::Text => "text",
            ValueKind::Blob => "blob",
            ValueKind::DateTime => "datetime",
        }
        .to_string()
    }

    fn table_exist_sql(&self, table: &str) -> (String, Vec<SqlValue>) {
        (
            "SELECT name FROM sqlite_master WHERE type='table' and name = ?".to_string(),
            vec![SqlValue::Text(table.to_string())],
        )
    }
}
