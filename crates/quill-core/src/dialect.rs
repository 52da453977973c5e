//! SQL dialect support.
//!
//! Different databases name column types differently and answer "does this
//! table exist?" with different catalog queries. A [`Dialect`] captures both.
//! Dialects are looked up by driver name through an explicit
//! [`DialectRegistry`] value handed to whatever constructs engines.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::value::{SqlValue, ValueKind};

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the column type keyword for a storage kind.
    fn data_type_of(&self, kind: ValueKind) -> String;

    /// Returns a query whose single value equals `table` exactly when the
    /// table exists, together with its bound arguments.
    fn table_exist_sql(&self, table: &str) -> (String, Vec<SqlValue>);
}

/// Maps driver names to dialects.
#[derive(Clone, Default)]
pub struct DialectRegistry {
    dialects: HashMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `dialect` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, dialect: Arc<dyn Dialect>) {
        self.dialects.insert(name.into(), dialect);
    }

    /// Builder-style variant of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, dialect: Arc<dyn Dialect>) -> Self {
        self.register(name, dialect);
        self
    }

    /// Looks up a dialect by driver name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Dialect>> {
        self.dialects.get(name).cloned()
    }

    /// Registered driver names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dialects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("dialects", &self.names())
            .finish()
    }
}
