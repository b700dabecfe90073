//! # capctl: Persistence core for capture pages and click trackers
//!
//! `capctl` stores organizations together with the categories, capture pages and click trackers
//! they own, in PostgreSQL. It gives the logic layer two things: handlers that decide whether a
//! unit of work runs inside a transaction, and repositories whose list operations share one
//! filter translator and return the same pagination metadata.
//!
//! ## Architecture
//!
//! A single [`TransactionController`](db::transaction::TransactionController) owns the pool. It
//! spawns a [`DbHandler`](db::transaction::DbHandler) for reads or a
//! [`TxHandler`](db::transaction::TxHandler) for writes; only those children hand out an
//! executor, so a repository cannot be built on the controller. Services in [`services`] receive a
//! [`TransactionProvider`](db::provider::TransactionProvider), spawn one handler per call, and
//! commit or roll back around the repository call.
//!
//! Every list goes through [`db::filter::fetch_page`]: a sparse filter becomes a `COUNT(*)` query
//! and a page query with the same predicates, and the page carries a
//! [`Pagination`](db::pagination::Pagination) block built from the total.
//!
//! ## Quick Start
//!
//! ```no_run
//! use capctl::{Application, Config};
//! use capctl::config::ListTarget;
//!
//! # async fn example(config: Config) -> anyhow::Result<()> {
//! let app = Application::new(config).await?;
//! let page = app
//!     .list(ListTarget::Categories, vec![], vec!["spring".to_string()], Some(1), Some(10))
//!     .await?;
//! println!("{page}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod config;
pub mod db;
pub mod errors;
pub mod services;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use config::Config;

use crate::config::{Command, ListTarget};
use crate::db::{
    handlers::{CapturePageFilter, CategoryFilter, ClickTrackerFilter, OrganizationFilter},
    pools::create_pool,
    provider::TransactionProvider,
    settings::QuerySettings,
    transaction::{ControllerOptions, TransactionController},
};
use crate::services::{CapturePageService, CategoryService, ClickTrackerService, OrganizationService};
use sqlx::PgPool;
use tracing::{info, instrument};

/// Get the capctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the configured pool and bring the schema up to date.
#[instrument(skip_all, fields(database = %config.database.name), err)]
pub async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = create_pool(&config.database).await?;
    migrator().run(&pool).await?;
    info!("Database migrations applied");
    Ok(pool)
}

/// Build the controller over `pool` and wrap it for the service layer.
pub async fn connect(config: &Config, pool: PgPool) -> anyhow::Result<TransactionProvider> {
    let options = ControllerOptions::builder()
        .pool(pool)
        .database_name(config.database.name.clone())
        .span(tracing::info_span!("capctl", database = %config.database.name))
        .settings(QuerySettings::from(config))
        .build();

    let controller = TransactionController::new(options).await?;
    Ok(TransactionProvider::new(controller))
}

/// The services behind one provider.
#[derive(Clone, Debug)]
pub struct Application {
    pub organizations: OrganizationService,
    pub categories: CategoryService,
    pub capture_pages: CapturePageService,
    pub click_trackers: ClickTrackerService,
}

impl Application {
    /// Connect, migrate and wire the services
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = setup_database(&config).await?;
        let provider = connect(&config, pool).await?;
        Ok(Self::from_provider(provider))
    }

    pub fn from_provider(provider: TransactionProvider) -> Self {
        Self {
            organizations: OrganizationService::new(provider.clone()),
            categories: CategoryService::new(provider.clone()),
            capture_pages: CapturePageService::new(provider.clone()),
            click_trackers: ClickTrackerService::new(provider),
        }
    }

    /// Fetch one page of `target` narrowed by ids and names, rendered as JSON
    pub async fn list(
        &self,
        target: ListTarget,
        ids: Vec<i64>,
        names: Vec<String>,
        page: Option<i64>,
        max_rows: Option<i64>,
    ) -> errors::Result<serde_json::Value> {
        let value = match target {
            ListTarget::Organizations => {
                let filter = OrganizationFilter {
                    ids_in: ids,
                    name_in: names,
                    page,
                    max_rows,
                };
                serde_json::to_value(self.organizations.list(Some(&filter)).await?)
            }
            ListTarget::Categories => {
                let filter = CategoryFilter {
                    ids_in: ids,
                    name_in: names,
                    page,
                    max_rows,
                    ..Default::default()
                };
                serde_json::to_value(self.categories.list(Some(&filter)).await?)
            }
            ListTarget::CapturePages => {
                let filter = CapturePageFilter {
                    ids_in: ids,
                    name_in: names,
                    page,
                    max_rows,
                    ..Default::default()
                };
                serde_json::to_value(self.capture_pages.list(Some(&filter)).await?)
            }
            ListTarget::ClickTrackers => {
                let filter = ClickTrackerFilter {
                    ids_in: ids,
                    name_in: names,
                    page,
                    max_rows,
                    ..Default::default()
                };
                serde_json::to_value(self.click_trackers.list(Some(&filter)).await?)
            }
        };

        value.map_err(|e| errors::Error::Other(e.into()))
    }
}

/// Execute one CLI command against `config`
pub async fn run(config: Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Migrate => {
            setup_database(&config).await?;
        }
        Command::List {
            entity,
            ids,
            names,
            page,
            max_rows,
        } => {
            let app = Application::new(config).await?;
            let value = app.list(entity, ids, names, page, max_rows).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

/// Exit status and message for a failed [`run`].
///
/// Caller mistakes exit with 2, everything else with 1. Service errors are shown
/// through [`errors::Error::user_message`]; anything else prints its context chain.
pub fn failure_report(err: &anyhow::Error) -> (u8, String) {
    match err.downcast_ref::<errors::Error>() {
        Some(service_err) if service_err.is_client_error() => (2, service_err.user_message()),
        Some(service_err) => (1, service_err.user_message()),
        None => (1, format!("{err:#}")),
    }
}
