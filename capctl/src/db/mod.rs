//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern, with every repository borrowing its
//! executor from a transaction handler.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Services   │  (crate::services - units of work)
//! └──────┬──────┘
//!        │ provider.db() / provider.tx()
//!        ↓
//! ┌─────────────┐
//! │  Handlers   │  (db::transaction - DbHandler / TxHandler)
//! └──────┬──────┘
//!        │ as_executor()
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries, via db::filter)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`transaction`]: The controller and its two child handler kinds
//! - [`provider`]: The handler factory handed to services
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Request and response records per table
//! - [`filter`]: Sparse filters rendered into count and page queries
//! - [`pagination`]: Page arithmetic attached to every list result
//! - [`settings`]: Query timeouts and row limits inherited by handlers
//! - [`pools`]: Connection pool construction
//! - [`errors`]: Database-specific error types
//!
//! # Transactions
//!
//! Reads go through a [`DbHandler`](transaction::DbHandler), writes through a
//! [`TxHandler`](transaction::TxHandler) that is committed or rolled back:
//!
//! ```ignore
//! let mut tx = provider.tx().await?;
//! let created = Categories::new(&mut *tx).create(&request).await;
//! match created {
//!     Ok(category) => {
//!         tx.commit().await?;
//!         Ok(category)
//!     }
//!     Err(err) => {
//!         tx.rollback().await;
//!         Err(err)
//!     }
//! }
//! ```
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/` directory.
//! The [`crate::migrator`] function provides access to the migrator:
//!
//! ```ignore
//! capctl::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod pools;
pub mod provider;
pub mod settings;
pub mod transaction;
