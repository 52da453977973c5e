//! # quill-sqlite
//!
//! SQLite dialect for `quill-core`.
//!
//! # How SQLite differs from other dialects
//!
//! - **[Type affinity]**: SQLite uses a type-affinity system rather than
//!   strict column types, so the keywords produced by
//!   [`SqliteDialect`] mostly select an affinity. Booleans come back as
//!   integers and timestamps as text.
//! - **Catalog**: table existence is answered by `sqlite_master`.
//! - **Limited [ALTER TABLE]**: SQLite supports `ADD COLUMN` and
//!   `RENAME TO`, but dropping a column requires rebuilding the table. The
//!   migrator relies on exactly this subset.
//!
//! [Type affinity]: https://www.sqlite.org/datatype3.html
//! [ALTER TABLE]: https://www.sqlite.org/lang_altertable.html
//!
//! ## Example
//!
//! ```rust
//! use quill_core::DialectRegistry;
//!
//! let mut registry = DialectRegistry::new();
//! quill_sqlite::register(&mut registry);
//! assert!(registry.get("sqlite").is_some());
//! assert!(registry.get("sqlite3").is_some());
//! ```

mod dialect;

use std::sync::Arc;

use quill_core::DialectRegistry;

pub use dialect::SqliteDialect;

/// Registers [`SqliteDialect`] under the `sqlite` and `sqlite3` driver names.
pub fn register(registry: &mut DialectRegistry) {
    let dialect = Arc::new(SqliteDialect::new());
    registry.register("sqlite", dialect.clone());
    registry.register("sqlite3", dialect);
}
