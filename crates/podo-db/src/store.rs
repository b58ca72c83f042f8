//! # Collection Store
//!
//! Persisted state is a set of named collections. Each one is a single row in
//! the `collections` table whose `records` column holds a JSON list.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database::begin_write()                                               │
//! │       │  1. take the writer gate (one writer per process)              │
//! │       │  2. BEGIN                                                      │
//! │       ▼                                                                 │
//! │  LedgerTx                                                              │
//! │   ├── tx.inventory()     books / goods                                 │
//! │   ├── tx.balances()      owners                                        │
//! │   ├── tx.sales()         sales                                         │
//! │   ├── tx.settlements()   settlements                                   │
//! │   └── tx.catalog()       branches / shelves / owner registration       │
//! │       │                                                                 │
//! │       ├── commit()  → COMMIT, gate released                            │
//! │       └── drop      → ROLLBACK, gate released                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::fmt;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, trace};

use crate::error::{DbError, DbResult};
use crate::repository::catalog::Catalog;
use crate::repository::inventory::InventoryLedger;
use crate::repository::owner::OwnerBalanceLedger;
use crate::repository::sale::SalesTransactionLog;
use crate::repository::settlement::SettlementBook;
use podo_core::LedgerSnapshot;

// =============================================================================
// Collection Names
// =============================================================================

/// Every collection the ledger persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Branches,
    Shelves,
    Owners,
    Books,
    Goods,
    Sales,
    Settlements,
    Notifications,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Branches,
        Collection::Shelves,
        Collection::Owners,
        Collection::Books,
        Collection::Goods,
        Collection::Sales,
        Collection::Settlements,
        Collection::Notifications,
    ];

    /// Stable key in the `collections` table.
    pub const fn key(&self) -> &'static str {
        match self {
            Collection::Branches => "branches",
            Collection::Shelves => "shelves",
            Collection::Owners => "owners",
            Collection::Books => "books",
            Collection::Goods => "goods",
            Collection::Sales => "sales",
            Collection::Settlements => "settlements",
            Collection::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Load / Save
// =============================================================================

/// Reads a collection. A missing row reads as an empty list.
pub async fn load<T: DeserializeOwned>(conn: &mut SqliteConnection, collection: Collection) -> DbResult<Vec<T>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT records FROM collections WHERE name = ?1")
        .bind(collection.key())
        .fetch_optional(&mut *conn)
        .await?;

    let records = match raw {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| DbError::Serialization(format!("{}: {}", collection, e)))?,
        None => Vec::new(),
    };

    trace!(%collection, count = records.len(), "Loaded collection");
    Ok(records)
}

/// Replaces a collection wholesale.
pub async fn save<T: Serialize>(conn: &mut SqliteConnection, collection: Collection, records: &[T]) -> DbResult<()> {
    let json = serde_json::to_string(records)?;

    sqlx::query(
        r#"
        INSERT INTO collections (name, records, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(name) DO UPDATE SET
            records = excluded.records,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(collection.key())
    .bind(json)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;

    trace!(%collection, count = records.len(), "Saved collection");
    Ok(())
}

/// Loads every collection the read side needs.
pub async fn load_snapshot(conn: &mut SqliteConnection) -> DbResult<LedgerSnapshot> {
    Ok(LedgerSnapshot {
        branches: load(conn, Collection::Branches).await?,
        shelves: load(conn, Collection::Shelves).await?,
        owners: load(conn, Collection::Owners).await?,
        books: load(conn, Collection::Books).await?,
        goods: load(conn, Collection::Goods).await?,
        sales: load(conn, Collection::Sales).await?,
        settlements: load(conn, Collection::Settlements).await?,
    })
}

// =============================================================================
// Collection Store (outside a transaction)
// =============================================================================

/// Load/save against the pool, one statement at a time.
///
/// Use [`LedgerTx`] when more than one collection must change together.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    pool: SqlitePool,
}

impl CollectionStore {
    pub fn new(pool: SqlitePool) -> Self {
        CollectionStore { pool }
    }

    pub async fn load<T: DeserializeOwned>(&self, collection: Collection) -> DbResult<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, collection).await
    }

    pub async fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        save(&mut conn, collection, records).await
    }

    /// Every collection, read inside one transaction so the parts agree.
    pub async fn snapshot(&self) -> DbResult<LedgerSnapshot> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        let snapshot = load_snapshot(&mut tx).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(snapshot)
    }
}

// =============================================================================
// Ledger Transaction
// =============================================================================

/// A write transaction holding the process-wide writer gate.
///
/// Dropping it without [`LedgerTx::commit`] rolls every change back.
pub struct LedgerTx {
    tx: Transaction<'static, Sqlite>,
    _gate: OwnedMutexGuard<()>,
}

impl LedgerTx {
    pub(crate) async fn begin(pool: &SqlitePool, gate: OwnedMutexGuard<()>) -> DbResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Ledger transaction started");
        Ok(LedgerTx { tx, _gate: gate })
    }

    pub async fn load<T: DeserializeOwned>(&mut self, collection: Collection) -> DbResult<Vec<T>> {
        load(&mut self.tx, collection).await
    }

    pub async fn save<T: Serialize>(&mut self, collection: Collection, records: &[T]) -> DbResult<()> {
        save(&mut self.tx, collection, records).await
    }

    pub async fn snapshot(&mut self) -> DbResult<LedgerSnapshot> {
        load_snapshot(&mut self.tx).await
    }

    pub fn inventory(&mut self) -> InventoryLedger<'_> {
        InventoryLedger::new(&mut self.tx)
    }

    pub fn balances(&mut self) -> OwnerBalanceLedger<'_> {
        OwnerBalanceLedger::new(&mut self.tx)
    }

    pub fn sales(&mut self) -> SalesTransactionLog<'_> {
        SalesTransactionLog::new(&mut self.tx)
    }

    pub fn settlements(&mut self) -> SettlementBook<'_> {
        SettlementBook::new(&mut self.tx)
    }

    pub fn catalog(&mut self) -> Catalog<'_> {
        Catalog::new(&mut self.tx)
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Ledger transaction committed");
        Ok(())
    }

    /// Explicit rollback; dropping the transaction does the same.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Ledger transaction rolled back");
        Ok(())
    }
}
