//! Sessions.
//!
//! A [`Session`] is one unit of interaction with the store. It accumulates a
//! SQL buffer and bound values (through [`Session::raw`] or the clause
//! builder), executes them against the open transaction if there is one and
//! the pool otherwise, and resets its statement state before each execution.
//!
//! ```rust,no_run
//! use quill_orm::{Engine, EngineOptions, SqlValue};
//!
//! # async fn example(engine: Engine) -> quill_orm::Result<()> {
//! let mut session = engine.new_session();
//! session
//!     .raw("INSERT INTO User (name, age) VALUES (?, ?)", [
//!         SqlValue::Text("Tom".into()),
//!         SqlValue::Int(18),
//!     ])
//!     .exec()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod record;
mod table;
mod transaction;

use std::sync::Arc;

use quill_core::{Clause, Dialect, Row, Schema, SqlValue};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column as _, Executor as _, Row as _, Sqlite, Statement as _, Transaction};
use sqlx::{TypeInfo as _, ValueRef as _};
use tracing::{debug, error};

use crate::error::{OrmError, Result};

/// A statement builder and executor bound to one pool.
pub struct Session {
    pool: SqlitePool,
    dialect: Arc<dyn Dialect>,
    ref_table: Option<Schema>,
    clause: Clause,
    sql: String,
    sql_vars: Vec<SqlValue>,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("dialect", &self.dialect.name())
            .field("ref_table", &self.ref_table.as_ref().map(Schema::name))
            .field("sql", &self.sql)
            .field("sql_vars", &self.sql_vars)
            .field("in_transaction", &self.tx.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates an idle session over `pool`.
    #[must_use]
    pub fn new(pool: SqlitePool, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            pool,
            dialect,
            ref_table: None,
            clause: Clause::new(),
            sql: String::new(),
            sql_vars: Vec::new(),
            tx: None,
        }
    }

    /// The dialect this session resolves types with.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Appends `sql` and its values to the pending statement.
    ///
    /// Nothing is executed until [`exec`](Self::exec),
    /// [`query_row`](Self::query_row) or [`query_rows`](Self::query_rows).
    pub fn raw(&mut self, sql: &str, values: impl IntoIterator<Item = SqlValue>) -> &mut Self {
        self.sql.push_str(sql);
        self.sql.push(' ');
        self.sql_vars.extend(values);
        self
    }

    /// Pending SQL text.
    #[must_use]
    pub fn pending_sql(&self) -> &str {
        self.sql.trim_end()
    }

    /// Pending bound values.
    #[must_use]
    pub fn pending_values(&self) -> &[SqlValue] {
        &self.sql_vars
    }

    /// Discards the pending statement and clause fragments.
    ///
    /// The bound schema and any open transaction are kept.
    pub fn clear(&mut self) {
        self.sql.clear();
        self.sql_vars.clear();
        self.clause.clear();
    }

    /// Executes the pending statement and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns the database error if the statement fails.
    pub async fn exec(&mut self) -> Result<u64> {
        let (sql, values) = self.take_statement();
        debug!(sql = %sql, values = ?values, "exec");

        let query = bind_values(sqlx::query(&sql), values);
        let result = match self.tx.as_mut() {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(&self.pool).await,
        };

        match result {
            Ok(done) => Ok(done.rows_affected()),
            Err(e) => {
                error!(sql = %sql, error = %e, "exec failed");
                Err(e.into())
            }
        }
    }

    /// Executes the pending statement and returns its first row, if any.
    ///
    /// # Errors
    ///
    /// Returns the database error if the statement fails.
    pub async fn query_row(&mut self) -> Result<Option<Row>> {
        let (sql, values) = self.take_statement();
        debug!(sql = %sql, values = ?values, "query row");

        let query = bind_values(sqlx::query(&sql), values);
        let result = match self.tx.as_mut() {
            Some(tx) => query.fetch_optional(&mut **tx).await,
            None => query.fetch_optional(&self.pool).await,
        };

        match result {
            Ok(Some(row)) => Ok(Some(decode_row(&row, column_names(&row))?)),
            Ok(None) => Ok(None),
            Err(e) => {
                error!(sql = %sql, error = %e, "query row failed");
                Err(e.into())
            }
        }
    }

    /// Executes the pending statement and returns every row.
    ///
    /// # Errors
    ///
    /// Returns the database error if the statement fails.
    pub async fn query_rows(&mut self) -> Result<Rows> {
        let (sql, values) = self.take_statement();
        debug!(sql = %sql, values = ?values, "query rows");

        let query = bind_values(sqlx::query(&sql), values);
        let result = match self.tx.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(&self.pool).await,
        };

        let fetched = match result {
            Ok(rows) => rows,
            Err(e) => {
                error!(sql = %sql, error = %e, "query rows failed");
                return Err(e.into());
            }
        };

        let columns = match fetched.first() {
            Some(row) => column_names(row),
            None => self.statement_columns(&sql).await?,
        };
        let rows = fetched
            .iter()
            .map(|row| decode_row(row, Arc::clone(&columns)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Rows { columns, rows })
    }

    /// Reads result column names from a prepared statement.
    async fn statement_columns(&mut self, sql: &str) -> Result<Arc<[String]>> {
        let statement = match self.tx.as_mut() {
            Some(tx) => (&mut **tx).prepare(sql).await?,
            None => (&self.pool).prepare(sql).await?,
        };
        Ok(statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    /// Clears the pending statement and returns `err`.
    fn abort<T>(&mut self, err: OrmError) -> Result<T> {
        self.clear();
        Err(err)
    }

    /// Moves the pending statement out, leaving the session idle.
    fn take_statement(&mut self) -> (String, Vec<SqlValue>) {
        let sql = self.sql.trim_end().to_string();
        let values = std::mem::take(&mut self.sql_vars);
        self.sql.clear();
        self.clause.clear();
        (sql, values)
    }
}

/// A materialized result set.
#[derive(Debug, Clone, Default)]
pub struct Rows {
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl Rows {
    /// Result column names, known even when no row matched.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no row matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row.
    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Iterates over the rows.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Binds values in order to a query.
fn bind_values<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: Vec<SqlValue>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::Null => query.bind(Option::<i64>::None),
            SqlValue::Bool(b) => query.bind(b),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::Float(f) => query.bind(f),
            SqlValue::Text(s) => query.bind(s),
            SqlValue::Blob(b) => query.bind(b),
        };
    }
    query
}

fn column_names(row: &SqliteRow) -> Arc<[String]> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Decodes a row by the storage class of each value.
fn decode_row(row: &SqliteRow, columns: Arc<[String]>) -> Result<Row> {
    let mut values = Vec::with_capacity(row.len());
    for idx in 0..row.len() {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            values.push(SqlValue::Null);
            continue;
        }
        let storage = raw.type_info().name().to_ascii_uppercase();
        let value = match storage.as_str() {
            "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked::<i64, _>(idx)?),
            "REAL" | "NUMERIC" => SqlValue::Float(row.try_get_unchecked::<f64, _>(idx)?),
            "BLOB" => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
            _ => SqlValue::Text(row.try_get_unchecked::<String, _>(idx)?),
        };
        values.push(value);
    }
    Ok(Row::new(columns, values))
}
