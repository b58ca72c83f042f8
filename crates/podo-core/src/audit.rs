//! # Balance Audit
//!
//! The sales log is the source of truth for what each owner is owed. The
//! stored balance is a running cache of it, and the zero floor on refunds
//! can make the two disagree. This module recomputes the expected value and
//! reports where they differ.
//!
//! ```text
//! expected(owner) = Σ owner_amount of completed sales
//!                 − Σ owner_amount of completed settlements
//! drift           = stored balance − expected
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::stats::LedgerSnapshot;

/// An owner whose stored balance disagrees with the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    pub owner_id: String,
    pub owner_number: String,
    pub stored: Money,
    pub expected: Money,
    /// `stored - expected`; positive means the owner is over-credited.
    pub drift: Money,
}

/// Expected balance of one owner, recomputed from the log.
pub fn expected_balance(snapshot: &LedgerSnapshot, owner_id: &str) -> Money {
    let earned: Money = snapshot
        .sales
        .iter()
        .filter(|s| s.is_completed() && s.owner_id.as_deref() == Some(owner_id))
        .map(|s| s.owner_amount)
        .sum();
    let settled: Money = snapshot
        .settlements
        .iter()
        .filter(|st| st.is_completed() && st.owner_id == owner_id)
        .map(|st| st.owner_amount)
        .sum();
    earned - settled
}

/// Every owner whose stored balance differs from the recomputed one,
/// in owner order.
pub fn audit_balances(snapshot: &LedgerSnapshot) -> Vec<BalanceDrift> {
    snapshot
        .owners
        .iter()
        .filter_map(|owner| {
            let expected = expected_balance(snapshot, &owner.id);
            (owner.balance != expected).then(|| BalanceDrift {
                owner_id: owner.id.clone(),
                owner_number: owner.owner_number.clone(),
                stored: owner.balance,
                expected,
                drift: owner.balance - expected,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale::Sale;
    use crate::types::{Item, Owner, OwnerStatus, PaymentMethod};
    use chrono::{DateTime, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn owner(id: &str, balance: i64) -> Owner {
        Owner {
            id: id.into(),
            owner_number: "MP001".into(),
            name: "Kim".into(),
            phone: None,
            email: None,
            branch_id: "BR001".into(),
            shelves: vec![],
            balance: Money::won(balance),
            status: OwnerStatus::Active,
            created_at: at("2024-01-01T00:00:00Z"),
        }
    }

    #[test]
    fn test_clean_ledger_has_no_drift() {
        let item = Item::goods("GD1", "BR001", "Card", Money::won(8_000), "handmade", at("2024-12-01T00:00:00Z"))
            .owned_by("OW001", "MP001");
        let snap = LedgerSnapshot {
            owners: vec![owner("OW001", 6_400)],
            sales: vec![Sale::record("SL1", &item, PaymentMethod::Card, at("2024-12-02T00:00:00Z"))],
            ..Default::default()
        };
        assert!(audit_balances(&snap).is_empty());
    }

    #[test]
    fn test_refunded_sales_do_not_count() {
        let item = Item::goods("GD1", "BR001", "Pin", Money::won(1_000), "handmade", at("2024-12-01T00:00:00Z"))
            .owned_by("OW001", "MP001");
        let mut sale = Sale::record("SL1", &item, PaymentMethod::Card, at("2024-12-02T00:00:00Z"));
        sale.refund(at("2024-12-03T00:00:00Z")).unwrap();

        let snap = LedgerSnapshot {
            owners: vec![owner("OW001", 0), owner("OW002", 0)],
            sales: vec![sale],
            ..Default::default()
        };
        assert!(audit_balances(&snap).is_empty());

        // a balance with no sales behind it
        let snap = LedgerSnapshot {
            owners: vec![owner("OW001", 500)],
            ..snap
        };
        let drifts = audit_balances(&snap);
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].expected, Money::zero());
        assert_eq!(drifts[0].drift, Money::won(500));
    }
}
