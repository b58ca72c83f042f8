//! # Ledger
//!
//! The write side of the shop: sales, refunds and settlement closes.
//! Each operation is one unit of work. The sales log, the inventory and
//! the owner balance change together or not at all.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         process_sale(req)                              │
//! │                                                                         │
//! │  begin_write()  ← writer gate + BEGIN                                  │
//! │       │                                                                 │
//! │       ├── inventory().decrement_on_sale(item)   ItemNotFound/SoldOut   │
//! │       ├── Sale::record(item)                    split frozen here      │
//! │       ├── balances().credit(owner, share)       OwnerNotFound          │
//! │       ├── sales().record(sale)                                         │
//! │       │                                                                 │
//! │  commit()        ← any `?` above drops the tx: ROLLBACK                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sink.emit(Notification::for_sale)   after commit, fire-and-forget     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Refund Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales().refund(id)              SaleNotFound / AlreadyRefunded        │
//! │  inventory().increment(item)     missing item → InventoryInconsistency │
//! │  balances().debit(owner, share)  floors at zero, drift reported        │
//! │  commit → emit for_refund                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::owner::DebitOutcome;
use podo_core::{
    audit, BalanceDrift, CoreError, ItemRef, Notification, NotificationSink, PaymentMethod, Sale, Settlement,
    SettlementPeriod,
};

/// A checkout of one unit of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRequest {
    pub item: ItemRef,
    pub method: PaymentMethod,
}

impl SaleRequest {
    pub fn new(item: ItemRef, method: PaymentMethod) -> Self {
        SaleRequest { item, method }
    }
}

/// Result of a refund: the flipped sale and what happened to the balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundOutcome {
    pub sale: Sale,
    pub debit: DebitOutcome,
}

/// Transactional entry point for everything that moves money.
///
/// Cheap to clone; clones share the database and the sink.
#[derive(Clone)]
pub struct Ledger {
    db: Database,
    sink: Arc<dyn NotificationSink>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("db", &self.db).finish_non_exhaustive()
    }
}

impl Ledger {
    pub fn new(db: Database, sink: Arc<dyn NotificationSink>) -> Self {
        Ledger { db, sink }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Sells one unit at the current time.
    pub async fn process_sale(&self, req: SaleRequest) -> DbResult<Sale> {
        self.process_sale_at(req, Utc::now()).await
    }

    /// Sells one unit of `req.item`.
    ///
    /// ## Errors
    /// - `ItemNotFound` / `ItemSoldOut` from the inventory
    /// - `OwnerNotFound` if the item names an owner that does not exist
    ///
    /// Nothing is written when any step fails.
    pub async fn process_sale_at(&self, req: SaleRequest, now: DateTime<Utc>) -> DbResult<Sale> {
        let mut tx = self.db.begin_write().await?;

        let item = tx.inventory().decrement_on_sale(&req.item).await?;
        let sale = Sale::record(Uuid::now_v7().to_string(), &item, req.method, now);
        let balance = tx
            .balances()
            .credit(sale.owner_id.as_deref(), sale.owner_amount)
            .await?;
        let sale = tx.sales().record(sale).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            item = %sale.item_ref(),
            price = %sale.price,
            shop = %sale.shop_amount,
            owner = %sale.owner_amount,
            balance = ?balance,
            "Sale completed"
        );

        if let Some(n) = Notification::for_sale(&sale, now) {
            self.sink.emit(n);
        }
        Ok(sale)
    }

    // =========================================================================
    // Refunds
    // =========================================================================

    pub async fn process_refund(&self, sale_id: &str) -> DbResult<RefundOutcome> {
        self.process_refund_at(sale_id, Utc::now()).await
    }

    /// Reverses a completed sale.
    ///
    /// ## Errors
    /// - `SaleNotFound`, `AlreadyRefunded` from the log
    /// - `InventoryInconsistency` when the sold item is no longer in the catalog
    /// - `OwnerNotFound` when the sale's owner no longer exists
    ///
    /// ## When This Occurs
    /// A floored debit is not an error. The refund commits and the returned
    /// [`DebitOutcome::Floored`] carries the shortfall.
    pub async fn process_refund_at(&self, sale_id: &str, now: DateTime<Utc>) -> DbResult<RefundOutcome> {
        let mut tx = self.db.begin_write().await?;

        let sale = tx.sales().refund(sale_id, now).await?;

        let item_ref = sale.item_ref();
        tx.inventory()
            .increment_on_refund(&item_ref)
            .await
            .map_err(|e| match e.as_ledger() {
                Some(CoreError::ItemNotFound { .. }) => DbError::from(CoreError::InventoryInconsistency {
                    sale_id: sale.id.clone(),
                    category: item_ref.category,
                    item_id: item_ref.id.clone(),
                }),
                _ => e,
            })?;

        let debit = tx.balances().debit(sale.owner_id.as_deref(), sale.owner_amount).await?;

        tx.commit().await?;

        if debit.is_floored() {
            warn!(
                sale_id = %sale.id,
                shortfall = %debit.shortfall(),
                "Refund committed with floored balance"
            );
        }
        info!(sale_id = %sale.id, price = %sale.price, "Sale refunded");

        self.sink.emit(Notification::for_refund(&sale, now));
        Ok(RefundOutcome { sale, debit })
    }

    // =========================================================================
    // Settlements
    // =========================================================================

    pub async fn close_settlement(&self, owner_id: &str, period: SettlementPeriod) -> DbResult<Settlement> {
        self.close_settlement_at(owner_id, period, Utc::now()).await
    }

    /// Closes `period` for one owner and pays out the period's share.
    ///
    /// The balance is debited by the period's owner revenue; rent is netted in
    /// `final_amount` only.
    ///
    /// ## Errors
    /// - `PeriodStillOpen` when the month has not ended at `now`
    /// - `OwnerNotFound`
    /// - `PeriodAlreadySettled` on a second close of the same month
    pub async fn close_settlement_at(
        &self,
        owner_id: &str,
        period: SettlementPeriod,
        now: DateTime<Utc>,
    ) -> DbResult<Settlement> {
        if !period.has_ended(now) {
            return Err(CoreError::PeriodStillOpen {
                period: period.to_string(),
            }
            .into());
        }

        let mut tx = self.db.begin_write().await?;

        let owner = tx.balances().get(owner_id).await?;
        if tx.settlements().find(owner_id, period).await?.is_some() {
            return Err(CoreError::PeriodAlreadySettled {
                owner_id: owner_id.to_string(),
                period: period.to_string(),
            }
            .into());
        }

        let sales = tx.sales().list().await?;
        let shelves = tx.catalog().shelves().await?;
        let settlement = Settlement::close(&owner, period, &sales, &shelves, now);
        debug!(
            owner_id,
            %period,
            sale_count = settlement.sale_count,
            rent = %settlement.rent,
            "Settlement computed"
        );

        let settlement = tx.settlements().record(settlement).await?;
        tx.balances()
            .debit(Some(owner_id), settlement.owner_amount)
            .await?;

        tx.commit().await?;

        info!(
            owner_id,
            %period,
            final_amount = %settlement.final_amount,
            "Settlement closed"
        );

        self.sink.emit(Notification::for_settlement(&settlement, now));
        Ok(settlement)
    }

    // =========================================================================
    // Audit
    // =========================================================================

    /// Owners whose stored balance disagrees with the sales log.
    pub async fn audit_balances(&self) -> DbResult<Vec<BalanceDrift>> {
        let snapshot = self.db.store().snapshot().await?;
        let drifts = audit::audit_balances(&snapshot);

        for d in &drifts {
            warn!(
                owner_id = %d.owner_id,
                stored = %d.stored,
                expected = %d.expected,
                drift = %d.drift,
                "Balance drift"
            );
        }
        if drifts.is_empty() {
            debug!(owners = snapshot.owners.len(), "Balances agree with the log");
        }
        Ok(drifts)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
