//! Schema binding and table lifecycle.

use quill_core::{Record, Schema, SqlValue};
use tracing::debug;

use super::Session;
use crate::error::{OrmError, Result};

impl Session {
    /// Binds the session to record type `R`.
    ///
    /// The schema is parsed again only when the bound type changes.
    pub fn model<R: Record>(&mut self) -> &mut Self {
        let stale = self
            .ref_table
            .as_ref()
            .is_none_or(|schema| !schema.is_for::<R>());
        if stale {
            let schema = Schema::parse::<R>(self.dialect.as_ref());
            debug!(table = schema.name(), record = schema.type_name(), "bound model");
            self.ref_table = Some(schema);
        }
        self
    }

    /// The bound schema.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ModelNotSet`] if [`model`](Self::model) was never
    /// called.
    pub fn ref_table(&self) -> Result<&Schema> {
        self.ref_table.as_ref().ok_or(OrmError::ModelNotSet)
    }

    /// Creates the bound table.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ModelNotSet`] without a bound schema, or the
    /// database error if the table already exists.
    pub async fn create_table(&mut self) -> Result<()> {
        let sql = match self.ref_table() {
            Ok(schema) => schema.create_table_sql(),
            Err(e) => return self.abort(e),
        };
        self.raw(&sql, []).exec().await?;
        Ok(())
    }

    /// Drops the bound table if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ModelNotSet`] without a bound schema, or the
    /// database error.
    pub async fn drop_table(&mut self) -> Result<()> {
        let sql = match self.ref_table() {
            Ok(schema) => schema.drop_table_sql(),
            Err(e) => return self.abort(e),
        };
        self.raw(&sql, []).exec().await?;
        Ok(())
    }

    /// Returns true if the bound table exists.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::ModelNotSet`] without a bound schema, or the
    /// database error.
    pub async fn has_table(&mut self) -> Result<bool> {
        let name = match self.ref_table() {
            Ok(schema) => schema.name().to_string(),
            Err(e) => return self.abort(e),
        };
        self.table_exists(&name).await
    }

    /// Returns true if a table named `name` exists.
    ///
    /// # Errors
    ///
    /// Returns the database error if the probe fails.
    pub async fn table_exists(&mut self, name: &str) -> Result<bool> {
        let (sql, values) = self.dialect.table_exist_sql(name);
        let row = self.raw(&sql, values).query_row().await?;
        Ok(matches!(
            row.as_ref().and_then(|r| r.values().first()),
            Some(SqlValue::Text(found)) if found == name
        ))
    }
}
