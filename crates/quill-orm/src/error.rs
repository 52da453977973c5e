//! Error types for the ORM.

use quill_core::{HookError, SchemaError, ValueError};
use thiserror::Error;

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No dialect is registered for the driver.
    #[error("dialect {0} not found")]
    DialectNotFound(String),

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A table operation was issued before `model` bound a record type.
    #[error("model is not set")]
    ModelNotSet,

    /// No object found matching the query.
    #[error("object not found")]
    NotFound,

    /// `begin` was called while a transaction is open.
    #[error("transaction already open")]
    TransactionAlreadyOpen,

    /// `commit` or `rollback` was called with no open transaction.
    #[error("no transaction is open")]
    NoTransaction,

    /// A lifecycle hook returned an error.
    #[error("{hook} hook failed: {source}")]
    Hook {
        /// Hook name.
        hook: &'static str,
        /// Error returned by the hook.
        #[source]
        source: HookError,
    },

    /// A column value could not be decoded.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A record did not match the bound schema.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Query building error.
    #[error("query error: {0}")]
    Query(String),
}

impl OrmError {
    pub(crate) fn hook(hook: &'static str, source: HookError) -> Self {
        Self::Hook { hook, source }
    }
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
