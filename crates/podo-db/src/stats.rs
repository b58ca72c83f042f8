//! # Stats Aggregator
//!
//! Read-only dashboard figures. Every call takes one snapshot of all
//! collections inside a read transaction, then hands it to the pure
//! functions in `podo_core::stats`.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::error::DbResult;
use crate::store::CollectionStore;
use podo_core::{search_items, stats, BranchStats, DailyPoint, ItemHit, LedgerSnapshot, OwnerStats};

/// Read side of the ledger.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    store: CollectionStore,
}

impl StatsAggregator {
    pub fn new(store: CollectionStore) -> Self {
        StatsAggregator { store }
    }

    pub async fn snapshot(&self) -> DbResult<LedgerSnapshot> {
        self.store.snapshot().await
    }

    /// Totals for one branch, or the whole shop with `None`.
    pub async fn branch_stats(&self, branch_id: Option<&str>) -> DbResult<BranchStats> {
        self.branch_stats_at(branch_id, Utc::now()).await
    }

    pub async fn branch_stats_at(&self, branch_id: Option<&str>, now: DateTime<Utc>) -> DbResult<BranchStats> {
        let snapshot = self.snapshot().await?;
        let result = stats::branch_stats(&snapshot, branch_id, now);
        debug!(branch = ?branch_id, sales = result.sales_count, "Branch stats computed");
        Ok(result)
    }

    /// ## Errors
    /// `OwnerNotFound` for an unknown owner.
    pub async fn owner_stats(&self, owner_id: &str) -> DbResult<OwnerStats> {
        self.owner_stats_at(owner_id, Utc::now()).await
    }

    pub async fn owner_stats_at(&self, owner_id: &str, now: DateTime<Utc>) -> DbResult<OwnerStats> {
        let snapshot = self.snapshot().await?;
        Ok(stats::owner_stats(&snapshot, owner_id, now)?)
    }

    /// `days` daily buckets ending today (UTC).
    pub async fn daily_series(
        &self,
        days: u32,
        branch_id: Option<&str>,
        owner_id: Option<&str>,
    ) -> DbResult<Vec<DailyPoint>> {
        self.daily_series_at(days, branch_id, owner_id, Utc::now().date_naive())
            .await
    }

    pub async fn daily_series_at(
        &self,
        days: u32,
        branch_id: Option<&str>,
        owner_id: Option<&str>,
        today: NaiveDate,
    ) -> DbResult<Vec<DailyPoint>> {
        let snapshot = self.snapshot().await?;
        Ok(stats::daily_series(&snapshot, days, branch_id, owner_id, today))
    }

    /// Available items matching `query`, in one branch or the whole shop.
    pub async fn search_items(&self, query: &str, branch_id: Option<&str>) -> DbResult<Vec<ItemHit>> {
        let snapshot = self.snapshot().await?;
        let hits = search_items(&snapshot, query, branch_id);
        debug!(%query, branch = ?branch_id, hits = hits.len(), "Item search");
        Ok(hits)
    }
}
