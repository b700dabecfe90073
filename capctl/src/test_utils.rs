//! Test utilities shared by the database and service tests.

use crate::config::Config;
use crate::db::{
    handlers::{CapturePages, Categories, Organizations, Repository},
    models::{
        capture_pages::{CapturePageCreateDBRequest, CapturePageDBResponse},
        categories::{CategoryCreateDBRequest, CategoryDBResponse},
        organizations::{OrganizationCreateDBRequest, OrganizationDBResponse},
    },
    provider::TransactionProvider,
    settings::QuerySettings,
    transaction::{ControllerOptions, TransactionController, TransactionHandler},
};
use crate::types::OrganizationId;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.database.name = "capctl_test".to_string();
    config
}

/// Name of the database `pool` points at; `#[sqlx::test]` creates a fresh one per test.
pub async fn database_name(pool: &PgPool) -> String {
    sqlx::query_scalar("SELECT current_database()::text")
        .fetch_one(pool)
        .await
        .expect("Failed to read database name")
}

pub async fn create_test_controller_with_settings(pool: PgPool, settings: QuerySettings) -> TransactionController {
    let name = database_name(&pool).await;
    let options = ControllerOptions::builder()
        .pool(pool)
        .database_name(name)
        .span(tracing::info_span!("test_controller"))
        .settings(settings)
        .build();

    TransactionController::new(options)
        .await
        .expect("Failed to create test controller")
}

pub async fn create_test_controller(pool: PgPool) -> TransactionController {
    create_test_controller_with_settings(pool, QuerySettings::default()).await
}

pub async fn create_test_provider(pool: PgPool) -> TransactionProvider {
    TransactionProvider::new(create_test_controller(pool).await)
}

pub async fn create_test_organization<H: TransactionHandler + ?Sized>(handler: &mut H, name: &str) -> OrganizationDBResponse {
    let request = OrganizationCreateDBRequest {
        name: name.to_string(),
        description: Some("Test organization".to_string()),
    };

    Organizations::new(handler)
        .create(&request)
        .await
        .expect("Failed to create test organization")
}

pub async fn create_test_category<H: TransactionHandler + ?Sized>(
    handler: &mut H,
    organization_id: OrganizationId,
    name: &str,
) -> CategoryDBResponse {
    let request = CategoryCreateDBRequest {
        organization_id,
        type_id: 1,
        name: name.to_string(),
        description: None,
        is_active: None,
    };

    Categories::new(handler)
        .create(&request)
        .await
        .expect("Failed to create test category")
}

pub async fn create_test_capture_page<H: TransactionHandler + ?Sized>(
    handler: &mut H,
    organization_id: OrganizationId,
    name: &str,
) -> CapturePageDBResponse {
    let request = CapturePageCreateDBRequest {
        organization_id,
        category_id: None,
        type_id: 1,
        name: name.to_string(),
        title: None,
        is_active: None,
    };

    CapturePages::new(handler)
        .create(&request)
        .await
        .expect("Failed to create test capture page")
}

/// Records the message of every WARN event emitted on the current thread.
#[derive(Clone, Default)]
pub struct CapturedWarnings(Arc<Mutex<Vec<String>>>);

impl CapturedWarnings {
    /// Route this thread's events here until the guard drops
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn contains(&self, message: &str) -> bool {
        self.0.lock().expect("warning capture poisoned").iter().any(|m| m == message)
    }
}

impl<S: Subscriber> Layer<S> for CapturedWarnings {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.0.lock().expect("warning capture poisoned").push(message);
        }
    }
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}
