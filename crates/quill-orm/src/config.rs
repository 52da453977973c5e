//! Engine configuration.

use serde::Deserialize;

use crate::error::{OrmError, Result};

/// Options used by [`Engine::connect`](crate::Engine::connect).
///
/// Every field has a default, so a JSON document only needs to name what it
/// changes:
///
/// ```rust
/// use quill_orm::EngineOptions;
///
/// let options = EngineOptions::from_json(r#"{"database_url": "sqlite::memory:"}"#).unwrap();
/// assert_eq!(options.database_url, "sqlite::memory:");
/// assert_eq!(options.max_connections, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Connection URL. The part before the first `:` selects the dialect.
    pub database_url: String,
    /// Upper bound of the connection pool.
    pub max_connections: u32,
    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            database_url: "sqlite:orm.db".to_string(),
            max_connections: 5,
            create_if_missing: true,
        }
    }
}

impl EngineOptions {
    /// Creates options for `database_url` with default pool settings.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// Sets the pool size.
    #[must_use]
    pub const fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets whether a missing database file is created.
    #[must_use]
    pub const fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Parses options from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Config`] if the document is not valid.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OrmError::Config(e.to_string()))
    }

    /// Splits the URL into driver name and location.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Config`] if the URL has no `driver:` prefix.
    pub fn driver_and_location(&self) -> Result<(&str, &str)> {
        match self.database_url.split_once(':') {
            Some((driver, location)) if !driver.is_empty() => Ok((driver, location)),
            _ => Err(OrmError::Config(format!(
                "database url {:?} has no driver prefix",
                self.database_url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.database_url, "sqlite:orm.db");
        assert_eq!(options.max_connections, 5);
        assert!(options.create_if_missing);
    }

    #[test]
    fn test_builder() {
        let options = EngineOptions::new("sqlite::memory:")
            .max_connections(1)
            .create_if_missing(false);
        assert_eq!(options.max_connections, 1);
        assert!(!options.create_if_missing);
    }

    #[test]
    fn test_from_json_partial() {
        let options = EngineOptions::from_json(r#"{"max_connections": 2}"#).unwrap();
        assert_eq!(options.max_connections, 2);
        assert_eq!(options.database_url, "sqlite:orm.db");
    }

    #[test]
    fn test_from_json_invalid() {
        let err = EngineOptions::from_json("{not json").unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn test_driver_and_location() {
        let options = EngineOptions::new("sqlite::memory:");
        assert_eq!(options.driver_and_location().unwrap(), ("sqlite", ":memory:"));

        let options = EngineOptions::new("sqlite3:orm.db");
        assert_eq!(options.driver_and_location().unwrap(), ("sqlite3", "orm.db"));

        let options = EngineOptions::new("orm.db");
        assert!(matches!(
            options.driver_and_location(),
            Err(OrmError::Config(_))
        ));
    }
}
