//! # Owner Balance Ledger
//!
//! The only writer of `Owner::balance`.
//!
//! ## Credit / Debit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  credit(Some(OW001), 6_400)   100 → 6_500                              │
//! │  debit (Some(OW001), 6_400) 6_500 →   100   Applied                    │
//! │  debit (Some(OW001),   800)   500 →     0   Floored { shortfall: 300 } │
//! │  credit/debit(None, _)        house item, nothing happens              │
//! │  credit/debit(Some(OW999), _) OwnerNotFound, unit aborts               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A floored debit means the stored balance is now higher than the sales log
//! says it should be. It is logged as ledger drift and shows up in
//! `Ledger::audit_balances`.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::store::{load, save, Collection};
use podo_core::{CoreError, Money, Owner};

/// What a debit did to the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DebitOutcome {
    /// No owner to debit (house item).
    NoOwner,
    /// Debited in full.
    Applied { balance: Money },
    /// Debit was larger than the balance; the balance stopped at zero.
    Floored { balance: Money, shortfall: Money },
}

impl DebitOutcome {
    pub fn is_floored(&self) -> bool {
        matches!(self, DebitOutcome::Floored { .. })
    }

    /// Balance after the debit, if there was an owner.
    pub fn balance(&self) -> Option<Money> {
        match self {
            DebitOutcome::NoOwner => None,
            DebitOutcome::Applied { balance } | DebitOutcome::Floored { balance, .. } => Some(*balance),
        }
    }

    pub fn shortfall(&self) -> Money {
        match self {
            DebitOutcome::Floored { shortfall, .. } => *shortfall,
            _ => Money::zero(),
        }
    }
}

/// Owner balances, scoped to one transaction.
pub struct OwnerBalanceLedger<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> OwnerBalanceLedger<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        OwnerBalanceLedger { conn }
    }

    pub async fn list(&mut self) -> DbResult<Vec<Owner>> {
        load(&mut *self.conn, Collection::Owners).await
    }

    pub async fn get(&mut self, owner_id: &str) -> DbResult<Owner> {
        self.list()
            .await?
            .into_iter()
            .find(|o| o.id == owner_id)
            .ok_or_else(|| CoreError::OwnerNotFound(owner_id.to_string()).into())
    }

    /// Adds `amount` to the owner's balance. Returns the new balance.
    pub async fn credit(&mut self, owner_id: Option<&str>, amount: Money) -> DbResult<Option<Money>> {
        let Some(owner_id) = owner_id else {
            debug!(%amount, "No owner to credit");
            return Ok(None);
        };

        let balance = self
            .update(owner_id, |owner| {
                owner.balance += amount;
                owner.balance
            })
            .await?;

        debug!(owner_id, %amount, %balance, "Owner credited");
        Ok(Some(balance))
    }

    /// Takes `amount` off the owner's balance, flooring at zero.
    pub async fn debit(&mut self, owner_id: Option<&str>, amount: Money) -> DbResult<DebitOutcome> {
        let Some(owner_id) = owner_id else {
            debug!(%amount, "No owner to debit");
            return Ok(DebitOutcome::NoOwner);
        };

        let (balance, shortfall) = self
            .update(owner_id, |owner| {
                let (balance, shortfall) = owner.balance.floor_sub(amount);
                owner.balance = balance;
                (balance, shortfall)
            })
            .await?;

        if shortfall.is_zero() {
            debug!(owner_id, %amount, %balance, "Owner debited");
            Ok(DebitOutcome::Applied { balance })
        } else {
            warn!(
                owner_id,
                %amount,
                %shortfall,
                "Debit exceeded balance, floored at zero; ledger drift"
            );
            Ok(DebitOutcome::Floored { balance, shortfall })
        }
    }

    async fn update<R, F>(&mut self, owner_id: &str, change: F) -> DbResult<R>
    where
        F: FnOnce(&mut Owner) -> R,
    {
        let mut owners: Vec<Owner> = load(&mut *self.conn, Collection::Owners).await?;
        let owner = owners
            .iter_mut()
            .find(|o| o.id == owner_id)
            .ok_or_else(|| CoreError::OwnerNotFound(owner_id.to_string()))?;

        let result = change(owner);
        save(&mut *self.conn, Collection::Owners, &owners).await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use podo_core::OwnerStatus;

    fn owner(balance: i64) -> Owner {
        Owner {
            id: "OW001".into(),
            owner_number: "MP001".into(),
            name: "Kim".into(),
            phone: None,
            email: None,
            branch_id: "BR001".into(),
            shelves: vec![],
            balance: Money::won(balance),
            status: OwnerStatus::Active,
            created_at: Utc::now(),
        }
    }

    async fn seeded(balance: i64) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.store().save(Collection::Owners, &[owner(balance)]).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_credit_then_debit_restores() {
        let db = seeded(100).await;
        let mut tx = db.begin_write().await.unwrap();

        let bal = tx.balances().credit(Some("OW001"), Money::won(6_400)).await.unwrap();
        assert_eq!(bal, Some(Money::won(6_500)));

        let out = tx.balances().debit(Some("OW001"), Money::won(6_400)).await.unwrap();
        assert_eq!(out, DebitOutcome::Applied { balance: Money::won(100) });
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_debit_floors_at_zero() {
        let db = seeded(500).await;
        let mut tx = db.begin_write().await.unwrap();

        let out = tx.balances().debit(Some("OW001"), Money::won(800)).await.unwrap();
        assert!(out.is_floored());
        assert_eq!(out.balance(), Some(Money::zero()));
        assert_eq!(out.shortfall(), Money::won(300));
    }

    #[tokio::test]
    async fn test_no_owner_is_noop() {
        let db = seeded(500).await;
        let mut tx = db.begin_write().await.unwrap();

        assert_eq!(tx.balances().credit(None, Money::won(10)).await.unwrap(), None);
        assert_eq!(tx.balances().debit(None, Money::won(10)).await.unwrap(), DebitOutcome::NoOwner);
        assert_eq!(tx.balances().get("OW001").await.unwrap().balance, Money::won(500));
    }

    #[tokio::test]
    async fn test_missing_owner_errors() {
        let db = seeded(500).await;
        let mut tx = db.begin_write().await.unwrap();

        let err = tx.balances().credit(Some("OW999"), Money::won(10)).await.unwrap_err();
        assert!(matches!(err, DbError::Ledger(CoreError::OwnerNotFound(_))));
    }
}
