//! Column-level schema migration.
//!
//! Migration compares the columns a record declares with the columns its
//! table has. Missing columns are added with `ALTER TABLE .. ADD COLUMN`.
//! Extra columns cannot be dropped in place on SQLite, so the table is
//! rebuilt from a projection of the declared columns:
//!
//! ```sql
//! CREATE TABLE tmp_User AS SELECT name, age FROM User;
//! DROP TABLE User;
//! ALTER TABLE tmp_User RENAME TO User;
//! ```
//!
//! The rebuilt table keeps column names and data but not constraints.

use quill_core::Record;
use tracing::{debug, info};

use crate::error::{OrmError, Result};
use crate::session::Session;

/// What a migration changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    /// The table did not exist and was created.
    pub created: bool,
    /// Columns added, in declaration order.
    pub added: Vec<String>,
    /// Columns removed, in table order.
    pub removed: Vec<String>,
}

impl MigrationPlan {
    /// Returns true if the table already matched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.created && self.added.is_empty() && self.removed.is_empty()
    }
}

/// Elements of `a` not present in `b`, in `a`'s order.
///
/// ```rust
/// use quill_orm::migrate::difference;
///
/// let declared = vec!["name".to_string(), "age".to_string()];
/// let live = vec!["name".to_string(), "XXX".to_string()];
/// assert_eq!(difference(&declared, &live), vec!["age".to_string()]);
/// assert_eq!(difference(&live, &declared), vec!["XXX".to_string()]);
/// ```
#[must_use]
pub fn difference(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().filter(|&item| !b.contains(item)).cloned().collect()
}

/// Migrates the table of `R` through `session`, which must already be inside
/// a transaction.
pub(crate) async fn run<R: Record>(session: &mut Session) -> Result<MigrationPlan> {
    session.model::<R>();
    let schema = session.ref_table()?.clone();
    let table = schema.name();

    if !session.has_table().await? {
        session.create_table().await?;
        info!(table, "created table");
        return Ok(MigrationPlan {
            created: true,
            ..MigrationPlan::default()
        });
    }

    let live = session
        .raw(&format!("SELECT * FROM {table} LIMIT 1"), [])
        .query_rows()
        .await?
        .columns()
        .to_vec();
    let declared = schema.field_names();
    let added = difference(declared, &live);
    let removed = difference(&live, declared);
    debug!(table, ?added, ?removed, "column difference");

    for column in &added {
        let field = schema
            .get_field(column)
            .ok_or_else(|| OrmError::Query(format!("unknown column {column}")))?;
        session
            .raw(
                &format!("ALTER TABLE {table} ADD COLUMN {} {}", field.name, field.sql_type),
                [],
            )
            .exec()
            .await?;
    }

    if !removed.is_empty() {
        let tmp = format!("tmp_{table}");
        let columns = declared.join(", ");
        session
            .raw(&format!("CREATE TABLE {tmp} AS SELECT {columns} FROM {table}"), [])
            .exec()
            .await?;
        session.raw(&format!("DROP TABLE {table}"), []).exec().await?;
        session
            .raw(&format!("ALTER TABLE {tmp} RENAME TO {table}"), [])
            .exec()
            .await?;
    }

    info!(table, ?added, ?removed, "migrated table");
    Ok(MigrationPlan {
        created: false,
        added,
        removed,
    })
}
