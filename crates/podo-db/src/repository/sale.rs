//! # Sales Transaction Log
//!
//! Append-only journal of sales. Records are never deleted; the only update
//! is the completed → refunded flip.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. RECORD                                                             │
//! │     └── record(sale) → appended, status Completed                      │
//! │                                                                         │
//! │  2. (OPTIONAL) REFUND                                                  │
//! │     └── refund(id) → status Refunded, refunded_at stamped              │
//! │     └── refund(id) again → AlreadyRefunded, log unchanged              │
//! │                                                                         │
//! │  Both steps run inside the caller's LedgerTx, so the log only changes  │
//! │  if inventory and balances change with it.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::store::{load, save, Collection};
use podo_core::{CoreError, Sale};

/// Sales journal, scoped to one transaction.
pub struct SalesTransactionLog<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> SalesTransactionLog<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        SalesTransactionLog { conn }
    }

    /// Every sale in insertion order.
    pub async fn list(&mut self) -> DbResult<Vec<Sale>> {
        load(&mut *self.conn, Collection::Sales).await
    }

    pub async fn get(&mut self, sale_id: &str) -> DbResult<Sale> {
        self.list()
            .await?
            .into_iter()
            .find(|s| s.id == sale_id)
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Appends a sale.
    pub async fn record(&mut self, sale: Sale) -> DbResult<Sale> {
        let mut sales = self.list().await?;
        debug!(
            sale_id = %sale.id,
            item = %sale.item_ref(),
            price = %sale.price,
            "Recording sale"
        );
        sales.push(sale.clone());
        save(&mut *self.conn, Collection::Sales, &sales).await?;
        Ok(sale)
    }

    /// Flips a sale to refunded and returns it.
    ///
    /// ## Errors
    /// - `SaleNotFound` for an unknown id
    /// - `AlreadyRefunded` on the second call; nothing is written
    pub async fn refund(&mut self, sale_id: &str, now: DateTime<Utc>) -> DbResult<Sale> {
        let mut sales = self.list().await?;
        let sale = sales
            .iter_mut()
            .find(|s| s.id == sale_id)
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        sale.refund(now)?;
        let refunded = sale.clone();

        save(&mut *self.conn, Collection::Sales, &sales).await?;
        debug!(sale_id, "Sale marked refunded");
        Ok(refunded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use podo_core::{Item, Money, PaymentMethod, SaleStatus};

    fn sale(id: &str) -> Sale {
        let item = Item::goods("GD002", "BR001", "Card", Money::won(8_000), "handmade", Utc::now())
            .owned_by("OW001", "MP001");
        Sale::record(id, &item, PaymentMethod::Card, Utc::now())
    }

    #[tokio::test]
    async fn test_record_keeps_insertion_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin_write().await.unwrap();

        tx.sales().record(sale("b")).await.unwrap();
        tx.sales().record(sale("a")).await.unwrap();

        let ids: Vec<String> = tx.sales().list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_refund_flips_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        tx.sales().record(sale("SL1")).await.unwrap();

        let refunded = tx.sales().refund("SL1", Utc::now()).await.unwrap();
        assert_eq!(refunded.status, SaleStatus::Refunded);
        assert!(refunded.refunded_at.is_some());

        let err = tx.sales().refund("SL1", Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::Ledger(CoreError::AlreadyRefunded(_))));

        let stored = tx.sales().get("SL1").await.unwrap();
        assert_eq!(stored.refunded_at, refunded.refunded_at);
    }

    #[tokio::test]
    async fn test_unknown_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin_write().await.unwrap();

        let err = tx.sales().refund("nope", Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::Ledger(CoreError::SaleNotFound(_))));
    }
}
