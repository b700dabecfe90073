//! Transaction handlers: the only source of live query executors.
//!
//! There are three handler roles:
//!
//! - [`TransactionController`] owns the connection pool. It is created once at
//!   startup and only spawns children; it never runs a query itself and does not
//!   implement [`TransactionHandler`], so it cannot be handed to a repository.
//! - [`DbHandler`] wraps one pooled connection without a transaction.
//! - [`TxHandler`] wraps one open transaction.
//!
//! ```text
//! Controller --tx()--> TxHandler --commit()/rollback()--> (consumed)
//! Controller --db()--> DbHandler --commit()--> CommitOnReadOnly
//!                                --rollback()--> (consumed, no I/O)
//! ```
//!
//! Children are created per unit of work and consumed by `commit`/`rollback`.
//! Dropping a [`TxHandler`] without committing rolls the transaction back.
//!
//! Asking the controller for an executor does not compile:
//!
//! ```compile_fail
//! use capctl::db::transaction::{TransactionController, TransactionHandler};
//!
//! fn executor(controller: &mut TransactionController) {
//!     let _conn = controller.as_executor();
//! }
//! ```

use crate::db::errors::{DbError, Result};
use crate::db::settings::{QuerySettings, bounded};
use async_trait::async_trait;
use bon::Builder;
use sqlx::{Connection, PgConnection, PgPool, Postgres, Transaction, pool::PoolConnection};
use tracing::{Instrument, Span, instrument};

/// Which role a handler plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerRole {
    Controller,
    DbBound,
    TxBound,
}

/// Capability handed to the logic layer and to repositories.
///
/// Implemented by [`DbHandler`] and [`TxHandler`] only. `commit` and `rollback`
/// consume the handler, so a finished unit of work cannot be reused.
#[async_trait]
pub trait TransactionHandler: Send {
    fn role(&self) -> HandlerRole;

    /// Settings inherited from the controller that spawned this handler
    fn settings(&self) -> &QuerySettings;

    /// The raw executor repositories run their queries on
    fn as_executor(&mut self) -> &mut PgConnection;

    /// Commit the unit of work. Fails with [`DbError::CommitOnReadOnly`] when there is no transaction.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Roll the unit of work back. Failures are logged, never returned, so they
    /// cannot mask the error that triggered the rollback.
    async fn rollback(self: Box<Self>);
}

/// Construction inputs for a [`TransactionController`]; every field except `settings` is required.
#[derive(Builder)]
pub struct ControllerOptions {
    pool: Option<PgPool>,
    #[builder(into)]
    database_name: Option<String>,
    /// Span that children log into
    span: Option<Span>,
    #[builder(default)]
    settings: QuerySettings,
}

/// Root handler owning the connection pool. Spawns [`DbHandler`]s and [`TxHandler`]s.
#[derive(Clone, Debug)]
pub struct TransactionController {
    pool: PgPool,
    database_name: String,
    span: Span,
    settings: QuerySettings,
}

impl TransactionController {
    /// Validate the options and ping the database.
    ///
    /// The connection must reach the configured database; a failed ping is returned, not retried.
    #[instrument(skip_all, err)]
    pub async fn new(options: ControllerOptions) -> Result<Self> {
        let pool = options.pool.ok_or_else(|| DbError::Validation {
            message: "connection pool is required".to_string(),
        })?;
        let database_name = options
            .database_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| DbError::Validation {
                message: "database name is required".to_string(),
            })?;
        let span = options.span.ok_or_else(|| DbError::Validation {
            message: "logging span is required".to_string(),
        })?;
        let settings = options.settings;
        let limit = settings.timeouts.exec;

        let mut conn = bounded(limit, "acquire connection", pool.acquire()).await?;
        bounded(limit, "ping database", conn.ping()).await?;
        let connected: String = bounded(
            limit,
            "read database name",
            sqlx::query_scalar("SELECT current_database()::text").fetch_one(&mut *conn),
        )
        .await?;

        if connected != database_name {
            return Err(DbError::Validation {
                message: format!("connected to database '{connected}' but '{database_name}' is configured"),
            });
        }

        tracing::debug!(database = %database_name, "transaction controller ready");

        Ok(Self {
            pool,
            database_name,
            span,
            settings,
        })
    }

    pub fn role(&self) -> HandlerRole {
        HandlerRole::Controller
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// Begin a transaction and wrap it in a fresh [`TxHandler`]
    #[instrument(skip(self), fields(database = %self.database_name), err)]
    pub async fn tx(&self) -> Result<TxHandler> {
        self.ensure_open()?;
        let mut tx = bounded(self.settings.timeouts.exec, "begin transaction", self.pool.begin()).await?;
        limit_statements(&mut tx, &self.settings, true).await?;

        Ok(TxHandler {
            tx,
            span: self.span.clone(),
            settings: self.settings,
        })
    }

    /// Take a pooled connection and wrap it in a fresh [`DbHandler`]
    #[instrument(skip(self), fields(database = %self.database_name), err)]
    pub async fn db(&self) -> Result<DbHandler> {
        self.ensure_open()?;
        let mut conn = bounded(self.settings.timeouts.exec, "get db", self.pool.acquire()).await?;
        limit_statements(&mut conn, &self.settings, false).await?;

        Ok(DbHandler {
            conn,
            span: self.span.clone(),
            settings: self.settings,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(DbError::PoolClosed);
        }
        Ok(())
    }
}

/// Cap every statement on `conn` at [`QuerySettings::statement_timeout`], so a call
/// abandoned by its client-side timeout does not keep the connection busy.
/// `local` scopes the setting to the current transaction.
async fn limit_statements(conn: &mut PgConnection, settings: &QuerySettings, local: bool) -> Result<()> {
    let millis = settings.statement_timeout().as_millis().to_string();
    bounded(
        settings.timeouts.exec,
        "set statement timeout",
        sqlx::query("SELECT set_config('statement_timeout', $1, $2)")
            .bind(millis)
            .bind(local)
            .execute(&mut *conn),
    )
    .await?;
    Ok(())
}

/// Handler over a pooled connection with no transaction; every statement autocommits.
pub struct DbHandler {
    conn: PoolConnection<Postgres>,
    span: Span,
    settings: QuerySettings,
}

#[async_trait]
impl TransactionHandler for DbHandler {
    fn role(&self) -> HandlerRole {
        HandlerRole::DbBound
    }

    fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    fn as_executor(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        Err(DbError::CommitOnReadOnly)
    }

    async fn rollback(self: Box<Self>) {
        tracing::trace!(parent: &self.span, "rollback on db handler is a no-op");
    }
}

/// Handler over one open transaction.
pub struct TxHandler {
    tx: Transaction<'static, Postgres>,
    span: Span,
    settings: QuerySettings,
}

#[async_trait]
impl TransactionHandler for TxHandler {
    fn role(&self) -> HandlerRole {
        HandlerRole::TxBound
    }

    fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    fn as_executor(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let TxHandler { tx, span, settings } = *self;
        bounded(settings.timeouts.exec, "commit transaction", tx.commit())
            .instrument(span)
            .await
    }

    async fn rollback(self: Box<Self>) {
        let TxHandler { tx, span, settings } = *self;
        if let Err(err) = bounded(settings.timeouts.exec, "rollback transaction", tx.rollback()).await {
            tracing::warn!(parent: &span, error = %err, "transaction rollback failed");
        }
    }
}
