//! # Repository Module
//!
//! Collection-backed repositories. Each one borrows the connection of an open
//! [`LedgerTx`](crate::store::LedgerTx), so everything it does commits or
//! rolls back with the rest of the unit.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Ledger::process_sale                                                  │
//! │       │                                                                 │
//! │       │  tx.inventory().decrement_on_sale(&item)                       │
//! │       ▼                                                                 │
//! │  InventoryLedger                                                       │
//! │  ├── load(books | goods)          ← JSON list from `collections`       │
//! │  ├── mutate one record in memory                                       │
//! │  └── save(books | goods)          ← whole list written back            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (same transaction as the sales log and balances)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`InventoryLedger`](inventory::InventoryLedger) - Item stock on sale and refund
//! - [`OwnerBalanceLedger`](owner::OwnerBalanceLedger) - Owner credit balances
//! - [`SalesTransactionLog`](sale::SalesTransactionLog) - Append-only sales journal
//! - [`SettlementBook`](settlement::SettlementBook) - Closed settlement periods
//! - [`Catalog`](catalog::Catalog) - Branches, shelves, owner registration
//! - [`NotificationRing`](notification::NotificationRing) - Capped notification store

pub mod catalog;
pub mod inventory;
pub mod notification;
pub mod owner;
pub mod sale;
pub mod settlement;
