//! Record schemas.
//!
//! A [`Record`] is a struct persisted as one table row. Its field descriptors
//! are generated at compile time by `#[derive(Record)]`; [`Schema::parse`]
//! resolves them against a [`Dialect`] into the table description the session
//! works from.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::dialect::Dialect;
use crate::value::{Row, SqlValue, ValueError, ValueKind};

/// Error returned by a lifecycle hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Result type of lifecycle hooks.
pub type HookResult = Result<(), HookError>;

/// Compile-time descriptor of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Column name.
    pub name: &'static str,
    /// Storage kind of the field's type.
    pub kind: ValueKind,
    /// Constraint text copied verbatim into DDL (may be empty).
    pub tag: &'static str,
}

/// A struct stored as a table row.
///
/// Implemented by `#[derive(Record)]`:
///
/// ```ignore
/// use quill_derive::Record;
///
/// #[derive(Debug, Clone, Record)]
/// struct User {
///     #[record(tag = "PRIMARY KEY")]
///     name: String,
///     age: i32,
/// }
///
/// assert_eq!(User::TABLE_NAME, "User");
/// ```
pub trait Record: Hooks + Send + Sync + Sized + 'static {
    /// Table name.
    const TABLE_NAME: &'static str;

    /// Column descriptors in declaration order.
    const FIELDS: &'static [FieldDef];

    /// Projects the field values in `FIELDS` order.
    fn record_values(&self) -> Vec<SqlValue>;

    /// Rebuilds a record from a row, matching columns by name.
    ///
    /// # Errors
    ///
    /// Fails if a column is missing or holds an incompatible value.
    fn from_row(row: &Row) -> Result<Self, ValueError>;
}

/// Optional lifecycle callbacks.
///
/// Every method defaults to doing nothing. `#[derive(Record)]` emits an empty
/// implementation unless the struct is marked `#[record(hooks)]`, in which
/// case the author implements the trait. A hook returning an error aborts the
/// surrounding operation.
pub trait Hooks {
    /// Called on each record before it is inserted.
    fn before_insert(&mut self) -> HookResult {
        Ok(())
    }

    /// Called once after an insert statement succeeded.
    fn after_insert() -> HookResult {
        Ok(())
    }

    /// Called once before a select is issued.
    fn before_query() -> HookResult {
        Ok(())
    }

    /// Called on each record decoded by a select.
    fn after_query(&mut self) -> HookResult {
        Ok(())
    }

    /// Called once before an update statement.
    fn before_update() -> HookResult {
        Ok(())
    }

    /// Called once after an update statement succeeded.
    fn after_update() -> HookResult {
        Ok(())
    }

    /// Called once before a delete statement.
    fn before_delete() -> HookResult {
        Ok(())
    }

    /// Called once after a delete statement succeeded.
    fn after_delete() -> HookResult {
        Ok(())
    }
}

/// Type-level hooks captured when a schema is parsed.
///
/// Update and delete run against the bound schema rather than a typed record,
/// so the schema carries the record type's hook functions with it.
#[derive(Clone, Copy)]
pub struct TypeHooks {
    /// [`Hooks::after_insert`]
    pub after_insert: fn() -> HookResult,
    /// [`Hooks::before_query`]
    pub before_query: fn() -> HookResult,
    /// [`Hooks::before_update`]
    pub before_update: fn() -> HookResult,
    /// [`Hooks::after_update`]
    pub after_update: fn() -> HookResult,
    /// [`Hooks::before_delete`]
    pub before_delete: fn() -> HookResult,
    /// [`Hooks::after_delete`]
    pub after_delete: fn() -> HookResult,
}

impl TypeHooks {
    /// Captures the type-level hooks of `R`.
    #[must_use]
    pub fn of<R: Hooks>() -> Self {
        Self {
            after_insert: R::after_insert,
            before_query: R::before_query,
            before_update: R::before_update,
            after_update: R::after_update,
            before_delete: R::before_delete,
            after_delete: R::after_delete,
        }
    }
}

impl fmt::Debug for TypeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHooks").finish_non_exhaustive()
    }
}

/// A column of a parsed schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Dialect column type.
    pub sql_type: String,
    /// Constraint text, verbatim.
    pub tag: String,
}

/// Errors raised by schema operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A record of another type was passed to a schema.
    #[error("schema for {expected} cannot project values of {found}")]
    TypeMismatch {
        /// Type the schema was parsed from.
        expected: &'static str,
        /// Type that was passed in.
        found: &'static str,
    },
}

/// Table description of a record type.
#[derive(Debug, Clone)]
pub struct Schema {
    type_id: TypeId,
    type_name: &'static str,
    name: String,
    fields: Vec<Field>,
    field_names: Vec<String>,
    field_map: HashMap<String, usize>,
    hooks: TypeHooks,
}

impl Schema {
    /// Parses the schema of `R`, resolving column types through `dialect`.
    #[must_use]
    pub fn parse<R: Record>(dialect: &dyn Dialect) -> Self {
        let mut fields = Vec::with_capacity(R::FIELDS.len());
        let mut field_names = Vec::with_capacity(R::FIELDS.len());
        let mut field_map = HashMap::with_capacity(R::FIELDS.len());

        for (idx, def) in R::FIELDS.iter().enumerate() {
            fields.push(Field {
                name: def.name.to_string(),
                sql_type: dialect.data_type_of(def.kind),
                tag: def.tag.to_string(),
            });
            field_names.push(def.name.to_string());
            field_map.insert(def.name.to_string(), idx);
        }

        Self {
            type_id: TypeId::of::<R>(),
            type_name: type_name::<R>(),
            name: R::TABLE_NAME.to_string(),
            fields,
            field_names,
            field_map,
            hooks: TypeHooks::of::<R>(),
        }
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Column names in declaration order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.field_map.get(name).map(|&idx| &self.fields[idx])
    }

    /// Name of the Rust type this schema was parsed from.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if this schema was parsed from `R`.
    #[must_use]
    pub fn is_for<R: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<R>()
    }

    /// Type-level hooks of the record type.
    #[must_use]
    pub const fn hooks(&self) -> &TypeHooks {
        &self.hooks
    }

    /// Projects `record`'s values in column order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::TypeMismatch`] if `R` is not the type this
    /// schema was parsed from.
    pub fn record_values<R: Record>(&self, record: &R) -> Result<Vec<SqlValue>, SchemaError> {
        if !self.is_for::<R>() {
            return Err(SchemaError::TypeMismatch {
                expected: self.type_name,
                found: type_name::<R>(),
            });
        }
        let values = record.record_values();
        debug_assert_eq!(values.len(), self.fields.len());
        Ok(values)
    }

    /// `CREATE TABLE` statement for this schema.
    #[must_use]
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .fields
            .iter()
            .map(|f| {
                if f.tag.is_empty() {
                    format!("{} {}", f.name, f.sql_type)
                } else {
                    format!("{} {} {}", f.name, f.sql_type, f.tag)
                }
            })
            .collect();
        format!("CREATE TABLE {} ({})", self.name, columns.join(", "))
    }

    /// `DROP TABLE IF EXISTS` statement for this schema.
    #[must_use]
    pub fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }
}
