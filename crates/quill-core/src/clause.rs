//! Clause builder.
//!
//! A [`Clause`] stores at most one SQL fragment per [`ClauseKind`]. Fragments
//! are produced from typed [`Intent`]s and stitched together by
//! [`Clause::build`] in exactly the order the caller asks for:
//!
//! ```rust
//! use quill_core::clause::{Clause, ClauseKind, Intent};
//! use quill_core::value::SqlValue;
//!
//! let mut clause = Clause::new();
//! clause.set(Intent::select("User", &["name", "age"]));
//! clause.set(Intent::where_clause("age > ?", vec![SqlValue::Int(20)]));
//! clause.set(Intent::Limit(10));
//!
//! let (sql, values) = clause.build(&[
//!     ClauseKind::Select,
//!     ClauseKind::Where,
//!     ClauseKind::OrderBy,
//!     ClauseKind::Limit,
//! ]);
//! assert_eq!(sql, "SELECT name,age FROM User WHERE age > ? LIMIT ?");
//! assert_eq!(values, vec![SqlValue::Int(20), SqlValue::Int(10)]);
//! ```
//!
//! `build` neither reorders nor validates: asking for kinds in an order SQL
//! does not accept yields SQL the store will reject.

use std::collections::HashMap;

use crate::value::SqlValue;

/// Kind of a clause fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    /// `INSERT INTO t (..)`
    Insert,
    /// `VALUES (..),(..)`
    Values,
    /// `SELECT .. FROM t`
    Select,
    /// `LIMIT ?`
    Limit,
    /// `WHERE ..`
    Where,
    /// `ORDER BY ..`
    OrderBy,
    /// `UPDATE t SET ..`
    Update,
    /// `DELETE FROM t`
    Delete,
    /// `SELECT count(*) FROM t`
    Count,
}

/// A typed request for one clause fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Insert into `table` the listed columns.
    Insert {
        /// Table name.
        table: String,
        /// Column names, in value order.
        columns: Vec<String>,
    },
    /// One placeholder tuple per row.
    Values(Vec<Vec<SqlValue>>),
    /// Select the listed columns from `table`.
    Select {
        /// Table name.
        table: String,
        /// Column names.
        columns: Vec<String>,
    },
    /// Row limit, bound as a parameter.
    Limit(i64),
    /// Raw condition text with its arguments.
    Where {
        /// Condition text, placeholders included.
        condition: String,
        /// Values for the placeholders.
        args: Vec<SqlValue>,
    },
    /// Raw ordering text.
    OrderBy(String),
    /// Assign values to columns of `table`.
    Update {
        /// Table name.
        table: String,
        /// Column/value pairs, in statement order.
        assignments: Vec<(String, SqlValue)>,
    },
    /// Delete from `table`.
    Delete {
        /// Table name.
        table: String,
    },
    /// Count rows of `table`.
    Count {
        /// Table name.
        table: String,
    },
}

impl Intent {
    /// Shorthand for [`Intent::Insert`].
    #[must_use]
    pub fn insert<S: AsRef<str>>(table: &str, columns: &[S]) -> Self {
        Self::Insert {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Shorthand for [`Intent::Select`].
    #[must_use]
    pub fn select<S: AsRef<str>>(table: &str, columns: &[S]) -> Self {
        Self::Select {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Shorthand for [`Intent::Where`].
    #[must_use]
    pub fn where_clause(condition: &str, args: Vec<SqlValue>) -> Self {
        Self::Where {
            condition: condition.to_string(),
            args,
        }
    }

    /// The fragment slot this intent fills.
    #[must_use]
    pub const fn kind(&self) -> ClauseKind {
        match self {
            Self::Insert { .. } => ClauseKind::Insert,
            Self::Values(_) => ClauseKind::Values,
            Self::Select { .. } => ClauseKind::Select,
            Self::Limit(_) => ClauseKind::Limit,
            Self::Where { .. } => ClauseKind::Where,
            Self::OrderBy(_) => ClauseKind::OrderBy,
            Self::Update { .. } => ClauseKind::Update,
            Self::Delete { .. } => ClauseKind::Delete,
            Self::Count { .. } => ClauseKind::Count,
        }
    }

    /// Renders the fragment text and its bound values.
    #[must_use]
    pub fn generate(self) -> (String, Vec<SqlValue>) {
        match self {
            Self::Insert { table, columns } => {
                (format!("INSERT INTO {table} ({})", columns.join(",")), vec![])
            }
            Self::Values(rows) => {
                let mut tuples = Vec::with_capacity(rows.len());
                let mut values = Vec::new();
                for row in rows {
                    let placeholders = vec!["?"; row.len()].join(",");
                    tuples.push(format!("({placeholders})"));
                    values.extend(row);
                }
                (format!("VALUES {}", tuples.join(",")), values)
            }
            Self::Select { table, columns } => {
                (format!("SELECT {} FROM {table}", columns.join(",")), vec![])
            }
            Self::Limit(n) => ("LIMIT ?".to_string(), vec![SqlValue::Int(n)]),
            Self::Where { condition, args } => (format!("WHERE {condition}"), args),
            Self::OrderBy(order) => (format!("ORDER BY {order}"), vec![]),
            Self::Update { table, assignments } => {
                let mut sets = Vec::with_capacity(assignments.len());
                let mut values = Vec::with_capacity(assignments.len());
                for (column, value) in assignments {
                    sets.push(format!("{column}=?"));
                    values.push(value);
                }
                (format!("UPDATE {table} SET {}", sets.join(",")), values)
            }
            Self::Delete { table } => (format!("DELETE FROM {table}"), vec![]),
            Self::Count { table } => (format!("SELECT count(*) FROM {table}"), vec![]),
        }
    }
}

/// Fragment table keyed by clause kind.
#[derive(Debug, Clone, Default)]
pub struct Clause {
    fragments: HashMap<ClauseKind, (String, Vec<SqlValue>)>,
}

impl Clause {
    /// Creates an empty clause table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `intent` and stores it, replacing any fragment of the same kind.
    pub fn set(&mut self, intent: Intent) {
        let kind = intent.kind();
        self.fragments.insert(kind, intent.generate());
    }

    /// Returns the stored fragment for `kind`.
    #[must_use]
    pub fn get(&self, kind: ClauseKind) -> Option<(&str, &[SqlValue])> {
        self.fragments
            .get(&kind)
            .map(|(sql, values)| (sql.as_str(), values.as_slice()))
    }

    /// Joins the fragments of `order` with spaces, skipping unset kinds.
    #[must_use]
    pub fn build(&self, order: &[ClauseKind]) -> (String, Vec<SqlValue>) {
        let mut sqls = Vec::with_capacity(order.len());
        let mut values = Vec::new();
        for kind in order {
            if let Some((sql, vars)) = self.fragments.get(kind) {
                sqls.push(sql.as_str());
                values.extend(vars.iter().cloned());
            }
        }
        (sqls.join(" "), values)
    }

    /// Returns true if no fragment is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Drops every stored fragment.
    pub fn clear(&mut self) {
        self.fragments.clear();
    }
}
