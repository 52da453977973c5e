//! Explicit transactions.
//!
//! While a transaction is open every statement of the session runs inside
//! it. Transactions do not nest.

use tracing::{debug, error};

use super::Session;
use crate::error::{OrmError, Result};

impl Session {
    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::TransactionAlreadyOpen`] if one is open, or the
    /// database error if the pool refuses.
    pub async fn begin(&mut self) -> Result<()> {
        if self.tx.is_some() {
            return Err(OrmError::TransactionAlreadyOpen);
        }
        match self.pool.begin().await {
            Ok(tx) => {
                debug!("transaction begin");
                self.tx = Some(tx);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "transaction begin failed");
                Err(e.into())
            }
        }
    }

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoTransaction`] if none is open, or the database
    /// error.
    pub async fn commit(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(OrmError::NoTransaction)?;
        debug!("transaction commit");
        tx.commit().await.map_err(|e| {
            error!(error = %e, "transaction commit failed");
            e.into()
        })
    }

    /// Rolls back the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoTransaction`] if none is open, or the database
    /// error.
    pub async fn rollback(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(OrmError::NoTransaction)?;
        debug!("transaction rollback");
        tx.rollback().await.map_err(|e| {
            error!(error = %e, "transaction rollback failed");
            e.into()
        })
    }

    /// Returns true while a transaction is open.
    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }
}
