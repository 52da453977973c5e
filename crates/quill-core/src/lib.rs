//! # quill-core
//!
//! The database-agnostic half of the quill ORM.
//!
//! This crate provides:
//! - [`SqlValue`] and the conversions between record fields and bound values
//! - The [`Dialect`] capability and an explicit [`DialectRegistry`]
//! - The [`Record`] trait and [`Schema`] reflector (field descriptors are
//!   generated by `#[derive(Record)]` from `quill-derive`)
//! - Optional lifecycle [`Hooks`]
//! - The [`Clause`] builder assembling ordered, parameterized SQL fragments
//!
//! ## Example
//!
//! ```ignore
//! use quill_core::{Record, Schema};
//! use quill_derive::Record;
//!
//! #[derive(Debug, Clone, Record)]
//! struct User {
//!     #[record(tag = "PRIMARY KEY")]
//!     name: String,
//!     age: i32,
//! }
//!
//! let schema = Schema::parse::<User>(&dialect);
//! assert_eq!(schema.field_names(), &["name", "age"]);
//! ```

pub mod clause;
pub mod dialect;
pub mod schema;
pub mod value;

pub use clause::{Clause, ClauseKind, Intent};
pub use dialect::{Dialect, DialectRegistry};
pub use schema::{
    Field, FieldDef, HookError, HookResult, Hooks, Record, Schema, SchemaError, TypeHooks,
};
pub use value::{ColumnType, FromSqlValue, Row, SqlValue, ToSqlValue, ValueError, ValueKind};
