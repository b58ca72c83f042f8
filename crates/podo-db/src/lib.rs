//! # podo-db: Persistence and Ledger Service for Podo Books
//!
//! This crate owns everything that touches storage: the SQLite pool, the
//! collection store, the transactional ledger and notification dispatch.
//! The split math and the record types live in `podo-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Podo Ledger Data Flow                            │
//! │                                                                         │
//! │  Checkout (sale / refund / settlement close)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     podo-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Ledger     │    │  Repositories │    │   Database   │  │   │
//! │  │   │  (ledger.rs)  │    │ (repository/) │    │  (pool.rs)   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ process_sale  │───►│ Inventory     │───►│ SqlitePool   │  │   │
//! │  │   │ process_refund│    │ OwnerBalance  │    │ writer gate  │  │   │
//! │  │   │ close_settle. │    │ SalesLog ...  │    │ migrations   │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ after commit                                        │   │
//! │  │           ▼                                                     │   │
//! │  │   ChannelSink ──► NotificationWorker ──► NotificationRing      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite: collections(name, records JSON, updated_at)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and the writer gate
//! - [`store`] - Collection load/save and [`LedgerTx`]
//! - [`repository`] - Per-collection views scoped to a transaction
//! - [`ledger`] - Sale, refund and settlement units of work
//! - [`stats`] - Read-only dashboard figures
//! - [`notify`] - Notification channel and background worker
//! - [`config`] / [`logging`] - Process bootstrap
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use podo_db::{Database, Ledger, LedgerConfig, NotificationRing, NotificationWorker, SaleRequest};
//!
//! let config = LedgerConfig::load(None)?;
//! config.logging.init();
//!
//! let db = Database::new(config.db_config()?).await?;
//! let ring = NotificationRing::new(db.clone(), config.notifications.capacity);
//! let (sink, worker) = NotificationWorker::spawn(ring, config.notifications.channel_size);
//!
//! let ledger = Ledger::new(db, Arc::new(sink));
//! let sale = ledger.process_sale(SaleRequest::new(ItemRef::book("BK001"), PaymentMethod::Card)).await?;
//!
//! worker.shutdown().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod migrations;
pub mod notify;
pub mod pool;
pub mod repository;
pub mod stats;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, LedgerConfig};
pub use error::{DbError, DbResult};
pub use ledger::{Ledger, RefundOutcome, SaleRequest};
pub use logging::{LogFormat, LoggingConfig};
pub use notify::{ChannelSink, NotificationWorker, NotificationWorkerHandle};
pub use pool::{Database, DbConfig};
pub use stats::StatsAggregator;
pub use store::{Collection, CollectionStore, LedgerTx};

// Repository re-exports for convenience
pub use repository::catalog::{Catalog, NewOwner};
pub use repository::inventory::InventoryLedger;
pub use repository::notification::NotificationRing;
pub use repository::owner::{DebitOutcome, OwnerBalanceLedger};
pub use repository::sale::SalesTransactionLog;
pub use repository::settlement::SettlementBook;
