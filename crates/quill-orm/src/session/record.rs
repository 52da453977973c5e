//! Record operations.
//!
//! Each operation sets the clause fragments it needs, builds them in SQL
//! order, and executes through [`Session::raw`]. `where_clause`, `order_by`
//! and `limit` only record intent and return the session for chaining:
//!
//! ```rust,no_run
//! use quill_orm::{Record, Session, SqlValue};
//!
//! #[derive(Debug, Clone, Record)]
//! #[record(crate = "quill_orm::quill_core")]
//! struct User {
//!     #[record(tag = "PRIMARY KEY")]
//!     name: String,
//!     age: i32,
//! }
//!
//! # async fn example(session: &mut Session) -> quill_orm::Result<()> {
//! let mut users: Vec<User> = Vec::new();
//! session
//!     .where_clause("age > ?", [SqlValue::Int(20)])
//!     .order_by("age DESC")
//!     .limit(10)
//!     .find(&mut users)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use quill_core::{ClauseKind, HookResult, Intent, Record, SqlValue, ToSqlValue};
use tracing::debug;

use super::Session;
use crate::error::{OrmError, Result};

impl Session {
    /// Inserts `records` with a single statement and returns the number of
    /// rows written.
    ///
    /// `before_insert` runs on every record first; `after_insert` runs once
    /// after the statement succeeded. An empty slice writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Hook`] if a hook fails, or the database error.
    pub async fn insert<R: Record>(&mut self, records: &mut [R]) -> Result<u64> {
        if records.is_empty() {
            self.clear();
            return Ok(0);
        }
        self.model::<R>();
        let schema = self.ref_table()?.clone();

        let mut rows = Vec::with_capacity(records.len());
        for record in records.iter_mut() {
            if let Err(e) = record.before_insert() {
                return self.abort(OrmError::hook("before_insert", e));
            }
            match schema.record_values(record) {
                Ok(values) => rows.push(values),
                Err(e) => return self.abort(e.into()),
            }
        }

        self.clause
            .set(Intent::insert(schema.name(), schema.field_names()));
        self.clause.set(Intent::Values(rows));
        let (sql, values) = self.clause.build(&[ClauseKind::Insert, ClauseKind::Values]);
        let affected = self.raw(&sql, values).exec().await?;

        R::after_insert().map_err(|e| OrmError::hook("after_insert", e))?;
        Ok(affected)
    }

    /// Selects rows of `R` matching the pending conditions and appends them
    /// to `dest`.
    ///
    /// Rows are decoded by column name. `before_query` runs once before the
    /// select and `after_query` on every decoded record.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Hook`] if a hook fails, [`OrmError::Value`] if a
    /// row does not decode, or the database error.
    pub async fn find<R: Record>(&mut self, dest: &mut Vec<R>) -> Result<()> {
        self.model::<R>();
        let schema = self.ref_table()?.clone();
        if let Err(e) = R::before_query() {
            return self.abort(OrmError::hook("before_query", e));
        }

        self.clause
            .set(Intent::select(schema.name(), schema.field_names()));
        let (sql, values) = self.clause.build(&[
            ClauseKind::Select,
            ClauseKind::Where,
            ClauseKind::OrderBy,
            ClauseKind::Limit,
        ]);
        let rows = self.raw(&sql, values).query_rows().await?;

        let mut found = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = R::from_row(&row)?;
            record
                .after_query()
                .map_err(|e| OrmError::hook("after_query", e))?;
            found.push(record);
        }
        debug!(table = schema.name(), count = found.len(), "found records");
        dest.extend(found);
        Ok(())
    }

    /// Updates the bound table and returns the number of affected rows.
    ///
    /// Accepts any collection of column/value pairs:
    ///
    /// ```rust,no_run
    /// # use std::collections::HashMap;
    /// # use quill_orm::{Session, SqlValue};
    /// # async fn example(session: &mut Session) -> quill_orm::Result<()> {
    /// session
    ///     .where_clause("name = ?", [SqlValue::Text("Tom".into())])
    ///     .update([("age", 30)])
    ///     .await?;
    ///
    /// let mut changes = HashMap::new();
    /// changes.insert("age", SqlValue::Int(31));
    /// session.update(changes).await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ModelNotSet`] without a bound schema,
    /// [`OrmError::Query`] for an empty assignment list, [`OrmError::Hook`]
    /// if a hook fails, or the database error.
    pub async fn update<K, V, I>(&mut self, assignments: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        let (table, hooks) = match self.ref_table() {
            Ok(schema) => (schema.name().to_string(), *schema.hooks()),
            Err(e) => return self.abort(e),
        };
        if let Err(e) = (hooks.before_update)() {
            return self.abort(OrmError::hook("before_update", e));
        }

        let assignments: Vec<(String, SqlValue)> = assignments
            .into_iter()
            .map(|(column, value)| (column.into(), value.to_sql_value()))
            .collect();
        if assignments.is_empty() {
            return self.abort(OrmError::Query("update without assignments".to_string()));
        }

        self.clause.set(Intent::Update { table, assignments });
        let (sql, values) = self.clause.build(&[ClauseKind::Update, ClauseKind::Where]);
        let affected = self.raw(&sql, values).exec().await?;

        run_hook("after_update", hooks.after_update)?;
        Ok(affected)
    }

    /// Deletes rows of the bound table matching the pending condition and
    /// returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ModelNotSet`] without a bound schema,
    /// [`OrmError::Hook`] if a hook fails, or the database error.
    pub async fn delete(&mut self) -> Result<u64> {
        let (table, hooks) = match self.ref_table() {
            Ok(schema) => (schema.name().to_string(), *schema.hooks()),
            Err(e) => return self.abort(e),
        };
        if let Err(e) = (hooks.before_delete)() {
            return self.abort(OrmError::hook("before_delete", e));
        }

        self.clause.set(Intent::Delete { table });
        let (sql, values) = self.clause.build(&[ClauseKind::Delete, ClauseKind::Where]);
        let affected = self.raw(&sql, values).exec().await?;

        run_hook("after_delete", hooks.after_delete)?;
        Ok(affected)
    }

    /// Counts rows of the bound table matching the pending condition.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ModelNotSet`] without a bound schema, or the
    /// database error.
    pub async fn count(&mut self) -> Result<i64> {
        let table = match self.ref_table() {
            Ok(schema) => schema.name().to_string(),
            Err(e) => return self.abort(e),
        };
        self.clause.set(Intent::Count { table });
        let (sql, values) = self.clause.build(&[ClauseKind::Count, ClauseKind::Where]);
        let row = self.raw(&sql, values).query_row().await?;
        match row {
            Some(row) => Ok(row.get_index::<i64>(0)?),
            None => Ok(0),
        }
    }

    /// Sets the `WHERE` condition. Placeholders bind `args` in order.
    pub fn where_clause(
        &mut self,
        condition: &str,
        args: impl IntoIterator<Item = SqlValue>,
    ) -> &mut Self {
        self.clause
            .set(Intent::where_clause(condition, args.into_iter().collect()));
        self
    }

    /// Sets the `ORDER BY` text, e.g. `"age DESC"`.
    pub fn order_by(&mut self, order: &str) -> &mut Self {
        self.clause.set(Intent::OrderBy(order.to_string()));
        self
    }

    /// Sets the row limit.
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.clause.set(Intent::Limit(n));
        self
    }

    /// Returns the first record of `R` matching the pending conditions.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NotFound`] if no row matched, or any error of
    /// [`find`](Self::find).
    pub async fn first<R: Record>(&mut self) -> Result<R> {
        let mut found: Vec<R> = Vec::with_capacity(1);
        self.limit(1).find(&mut found).await?;
        found.into_iter().next().ok_or(OrmError::NotFound)
    }
}

fn run_hook(name: &'static str, hook: fn() -> HookResult) -> Result<()> {
    hook().map_err(|e| OrmError::hook(name, e))
}
