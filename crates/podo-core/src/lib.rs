//! # podo-core: Pure Ledger Logic for Podo Books
//!
//! This crate is the **heart** of the Podo consignment ledger. It holds the
//! revenue split, the sale state machine and the read-side rollups as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Podo Ledger Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                podo-db (Database Layer)                         │   │
//! │  │    Ledger ─► LedgerTx ─► inventory / balances / sales log       │   │
//! │  │    StatsAggregator, NotificationWorker, config, logging         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ podo-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ settlement│  │   stats   │  │   │
//! │  │   │ Item      │  │   Money   │  │   split   │  │  rollups  │  │   │
//! │  │   │ Owner     │  │           │  │   close   │  │  audit    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Branches, shelves, owners, items
//! - [`sale`] - Sale records and the completed → refunded state machine
//! - [`settlement`] - Rate table, split calculator, monthly settlement
//! - [`stats`] - Branch/owner dashboards and daily sales series
//! - [`search`] - Counter lookup of available items
//! - [`audit`] - Stored balance vs. sales log reconciliation
//! - [`notification`] - Notification model and the sink trait
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Intake validation and owner numbering
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use podo_core::{Item, Money, PaymentMethod, Sale};
//!
//! let mut mug = Item::goods("GD003", "BR002", "Mug", Money::won(10_001), "collab", Utc::now())
//!     .owned_by("OW003", "GH001");
//!
//! mug.sell_one().unwrap();
//! let sale = Sale::record("SL-1", &mug, PaymentMethod::Card, Utc::now());
//!
//! assert_eq!(sale.shop_amount, Money::won(3_000));
//! assert_eq!(sale.owner_amount, Money::won(7_001));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod error;
pub mod money;
pub mod notification;
pub mod sale;
pub mod search;
pub mod settlement;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use audit::BalanceDrift;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use notification::{Notification, NotificationKind, NotificationSink, NotificationTarget};
pub use sale::{Sale, SaleStatus};
pub use search::{search_items, ItemHit};
pub use settlement::{Settlement, SettlementPeriod, SettlementStatus, Split};
pub use stats::{BranchStats, DailyPoint, LedgerSnapshot, OwnerStats};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Shop percentage used when a condition tag has no entry in the rate table.
pub const DEFAULT_SPLIT_PCT: u8 = 50;

/// How many notifications the ring keeps before dropping the oldest.
pub const NOTIFICATION_CAPACITY: usize = 100;
