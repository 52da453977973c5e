//! # quill-orm
//!
//! A minimal session-based ORM over SQLite.
//!
//! This crate provides:
//! - [`Engine`] owning the connection pool and dialect
//! - [`Session`] for raw statements, table lifecycle and record CRUD
//! - Transactions, explicit or through [`Engine::transaction`]
//! - Column-level schema migration through [`Engine::migrate`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quill_orm::{DialectRegistry, Engine, EngineOptions, Record, SqlValue};
//!
//! #[derive(Debug, Clone, Record)]
//! #[record(crate = "quill_orm::quill_core")]
//! struct User {
//!     #[record(tag = "PRIMARY KEY")]
//!     name: String,
//!     age: i32,
//! }
//!
//! # async fn example() -> quill_orm::Result<()> {
//! let mut registry = DialectRegistry::new();
//! quill_orm::sqlite::register(&mut registry);
//! let engine = Engine::connect(&EngineOptions::new("sqlite:orm.db"), &registry).await?;
//!
//! let mut session = engine.new_session();
//! session.model::<User>().create_table().await?;
//!
//! let mut users = vec![
//!     User { name: "Tom".into(), age: 18 },
//!     User { name: "Sam".into(), age: 25 },
//! ];
//! session.insert(&mut users).await?;
//!
//! let sam: User = session
//!     .where_clause("age > ?", [SqlValue::Int(20)])
//!     .first()
//!     .await?;
//! assert_eq!(sam.name, "Sam");
//! # Ok(())
//! # }
//! ```
//!
//! The derive names `quill_core` items by path. Crates that depend on
//! `quill-orm` alone point it at the re-export with
//! `#[record(crate = "quill_orm::quill_core")]`.
//!
//! ## Transactions
//!
//! [`Engine::transaction`] commits when the closure returns `Ok` and rolls
//! back on `Err` or panic:
//!
//! ```rust,no_run
//! # use quill_orm::{Engine, OrmError};
//! # async fn example(engine: Engine) -> Result<(), OrmError> {
//! engine
//!     .transaction(|session| {
//!         Box::pin(async move {
//!             session.raw("DELETE FROM User", []).exec().await?;
//!             Err::<(), _>(OrmError::Query("changed my mind".into()))
//!         })
//!     })
//!     .await
//!     .unwrap_err();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod migrate;
pub mod session;

pub use config::EngineOptions;
pub use engine::Engine;
pub use error::{OrmError, Result};
pub use migrate::MigrationPlan;
pub use session::{Rows, Session};

pub use quill_core::{
    ColumnType, Dialect, DialectRegistry, Field, FieldDef, FromSqlValue, HookError, HookResult,
    Hooks, Record, Row, Schema, SqlValue, ToSqlValue, ValueError, ValueKind,
};
pub use quill_derive::Record;

// Re-export quill-core for `#[record(crate = "quill_orm::quill_core")]`.
#[doc(hidden)]
pub use quill_core;

/// The SQLite dialect.
pub mod sqlite {
    pub use quill_sqlite::{register, SqliteDialect};
}
