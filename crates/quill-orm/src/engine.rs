//! Engine.
//!
//! The [`Engine`] owns the connection pool and the resolved dialect. It hands
//! out [`Session`]s and runs whole units of work inside a transaction.

use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use quill_core::{Dialect, DialectRegistry, Record};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Connection;
use tracing::{error, info, warn};

use crate::config::EngineOptions;
use crate::error::{OrmError, Result};
use crate::migrate::{self, MigrationPlan};
use crate::session::Session;

/// Connection pool plus dialect.
#[derive(Clone)]
pub struct Engine {
    pool: SqlitePool,
    dialect: Arc<dyn Dialect>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Opens a pool for `options` and checks that the store answers.
    ///
    /// The driver name is the part of the URL before the first `:` and must
    /// be registered in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Config`] for a malformed URL,
    /// [`OrmError::DialectNotFound`] for an unknown driver, or the database
    /// error if the store cannot be reached.
    pub async fn connect(options: &EngineOptions, registry: &DialectRegistry) -> Result<Self> {
        let (driver, location) = options.driver_and_location()?;
        let Some(dialect) = registry.get(driver) else {
            error!(driver, "dialect not found");
            return Err(OrmError::DialectNotFound(driver.to_string()));
        };

        let connect_options = SqliteConnectOptions::from_str(&format!("sqlite:{location}"))?
            .create_if_missing(options.create_if_missing);
        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                error!(url = %options.database_url, error = %e, "connect failed");
                e
            })?;

        let mut conn = pool.acquire().await?;
        if let Err(e) = conn.ping().await {
            error!(url = %options.database_url, error = %e, "ping failed");
            return Err(e.into());
        }
        drop(conn);

        info!(url = %options.database_url, dialect = dialect.name(), "connected");
        Ok(Self { pool, dialect })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool, dialect: Arc<dyn Dialect>) -> Self {
        Self { pool, dialect }
    }

    /// The connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The resolved dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Creates an idle session sharing this engine's pool.
    #[must_use]
    pub fn new_session(&self) -> Session {
        Session::new(self.pool.clone(), Arc::clone(&self.dialect))
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("closed database");
    }

    /// Runs `work` inside a transaction on a new session.
    ///
    /// The transaction commits when `work` returns `Ok`. It rolls back when
    /// `work` returns `Err` (the original error is returned) or panics (the
    /// panic resumes after the rollback).
    ///
    /// ```rust,no_run
    /// use quill_orm::{Engine, OrmError, SqlValue};
    ///
    /// # async fn example(engine: Engine) -> Result<(), OrmError> {
    /// let inserted = engine
    ///     .transaction(|session| {
    ///         Box::pin(async move {
    ///             session
    ///                 .raw("INSERT INTO User (name, age) VALUES (?, ?)", [
    ///                     SqlValue::Text("Tom".into()),
    ///                     SqlValue::Int(18),
    ///                 ])
    ///                 .exec()
    ///                 .await
    ///         })
    ///     })
    ///     .await?;
    /// assert_eq!(inserted, 1);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the error of `work`, or the error of beginning or committing
    /// the transaction.
    pub async fn transaction<T, E, F>(&self, work: F) -> std::result::Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, std::result::Result<T, E>> + Send,
        T: Send,
        E: From<OrmError> + Send,
    {
        let mut session = self.new_session();
        session.begin().await?;

        let outcome = AssertUnwindSafe(work(&mut session)).catch_unwind().await;
        match outcome {
            Ok(Ok(value)) => {
                if session.in_transaction() {
                    session.commit().await?;
                }
                info!("transaction committed");
                Ok(value)
            }
            Ok(Err(err)) => {
                rollback_quietly(&mut session).await;
                warn!("transaction rolled back");
                Err(err)
            }
            Err(panic) => {
                rollback_quietly(&mut session).await;
                warn!("transaction rolled back after panic");
                std::panic::resume_unwind(panic)
            }
        }
    }

    /// Brings the table of `R` in line with its declared columns.
    ///
    /// A missing table is created. Otherwise declared columns the table lacks
    /// are added, and if the table has columns `R` no longer declares it is
    /// rebuilt with the declared columns only. Everything runs in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns the first failing statement's error; nothing is applied.
    pub async fn migrate<R: Record>(&self) -> Result<MigrationPlan> {
        self.transaction(|session| Box::pin(migrate::run::<R>(session)))
            .await
    }
}

async fn rollback_quietly(session: &mut Session) {
    if !session.in_transaction() {
        return;
    }
    if let Err(e) = session.rollback().await {
        error!(error = %e, "rollback failed");
    }
}
