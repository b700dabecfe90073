//! The persistence entry point handed to services.

use crate::db::errors::Result;
use crate::db::settings::QuerySettings;
use crate::db::transaction::{TransactionController, TransactionHandler};

/// Spawns handlers for the logic layer.
///
/// Wraps the [`TransactionController`] so that code above the repositories only
/// ever sees `Box<dyn TransactionHandler>`.
#[derive(Clone, Debug)]
pub struct TransactionProvider {
    controller: TransactionController,
}

impl TransactionProvider {
    pub fn new(controller: TransactionController) -> Self {
        Self { controller }
    }

    /// A handler without a transaction, for reads
    pub async fn db(&self) -> Result<Box<dyn TransactionHandler>> {
        Ok(Box::new(self.controller.db().await?))
    }

    /// A handler over a fresh transaction, for writes
    pub async fn tx(&self) -> Result<Box<dyn TransactionHandler>> {
        Ok(Box::new(self.controller.tx().await?))
    }

    pub fn settings(&self) -> &QuerySettings {
        self.controller.settings()
    }
}
