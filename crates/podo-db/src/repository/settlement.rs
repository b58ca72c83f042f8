//! # Settlement Book
//!
//! Closed settlement periods. One record per owner per month.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::store::{load, save, Collection};
use podo_core::{CoreError, Settlement, SettlementPeriod};

/// Settlement records, scoped to one transaction.
pub struct SettlementBook<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> SettlementBook<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        SettlementBook { conn }
    }

    pub async fn list(&mut self) -> DbResult<Vec<Settlement>> {
        load(&mut *self.conn, Collection::Settlements).await
    }

    /// An owner's settlements, newest period first.
    pub async fn for_owner(&mut self, owner_id: &str) -> DbResult<Vec<Settlement>> {
        let mut mine: Vec<Settlement> = self
            .list()
            .await?
            .into_iter()
            .filter(|s| s.owner_id == owner_id)
            .collect();
        mine.sort_by(|a, b| b.period.cmp(&a.period));
        Ok(mine)
    }

    pub async fn find(&mut self, owner_id: &str, period: SettlementPeriod) -> DbResult<Option<Settlement>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|s| s.owner_id == owner_id && s.period == period))
    }

    /// Stores a closed settlement.
    ///
    /// ## Errors
    /// `PeriodAlreadySettled` if this owner already has one for the period.
    pub async fn record(&mut self, settlement: Settlement) -> DbResult<Settlement> {
        let mut all = self.list().await?;
        if all
            .iter()
            .any(|s| s.owner_id == settlement.owner_id && s.period == settlement.period)
        {
            return Err(CoreError::PeriodAlreadySettled {
                owner_id: settlement.owner_id.clone(),
                period: settlement.period.to_string(),
            }
            .into());
        }

        debug!(
            owner_id = %settlement.owner_id,
            period = %settlement.period,
            final_amount = %settlement.final_amount,
            "Recording settlement"
        );
        all.push(settlement.clone());
        save(&mut *self.conn, Collection::Settlements, &all).await?;
        Ok(settlement)
    }
}
