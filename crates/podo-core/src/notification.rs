//! # Notifications
//!
//! Domain events the ledger announces after a unit commits, and the sink
//! trait it announces them through.
//!
//! ## Visibility
//! ```text
//! ┌──────────────────────────┬───────────────┬───────────────┐
//! │ target                   │ operator view │ owner OW001   │
//! ├──────────────────────────┼───────────────┼───────────────┤
//! │ All                      │      ✓        │      ✓        │
//! │ Owner("OW001")           │      ✓        │      ✓        │
//! │ Owner("OW002")           │      ✓        │      ✗        │
//! └──────────────────────────┴───────────────┴───────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;
use crate::sale::Sale;
use crate::settlement::Settlement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Sale,
    Refund,
    Settlement,
    System,
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target_type", content = "target_id", rename_all = "snake_case")]
pub enum NotificationTarget {
    All,
    Owner(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub target: NotificationTarget,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        message: impl Into<String>,
        target: NotificationTarget,
        now: DateTime<Utc>,
    ) -> Self {
        Notification {
            id: format!("NF-{}", Uuid::new_v4()),
            kind,
            message: message.into(),
            target,
            read: false,
            created_at: now,
        }
    }

    /// Whether `viewer` sees this notification. `None` is the operator.
    pub fn visible_to(&self, viewer: Option<&str>) -> bool {
        match (&self.target, viewer) {
            (_, None) => true,
            (NotificationTarget::All, Some(_)) => true,
            (NotificationTarget::Owner(id), Some(owner)) => id == owner,
        }
    }

    /// Sale announcement for the item's owner. House items announce nothing.
    pub fn for_sale(sale: &Sale, now: DateTime<Utc>) -> Option<Self> {
        let owner_id = sale.owner_id.clone()?;
        Some(Notification::new(
            NotificationKind::Sale,
            format!(
                "{} sold ({} → your share {})",
                sale.item_title, sale.price, sale.owner_amount
            ),
            NotificationTarget::Owner(owner_id),
            now,
        ))
    }

    /// Refund announcement; house items go to everyone.
    pub fn for_refund(sale: &Sale, now: DateTime<Utc>) -> Self {
        let target = match &sale.owner_id {
            Some(id) => NotificationTarget::Owner(id.clone()),
            None => NotificationTarget::All,
        };
        Notification::new(
            NotificationKind::Refund,
            format!("{} refunded ({})", sale.item_title, sale.price),
            target,
            now,
        )
    }

    pub fn for_settlement(settlement: &Settlement, now: DateTime<Utc>) -> Self {
        let payout = if settlement.final_amount.is_negative() {
            format!("rent due {}", Money::zero() - settlement.final_amount)
        } else {
            format!("payout {}", settlement.final_amount)
        };
        Notification::new(
            NotificationKind::Settlement,
            format!("Settlement for {} closed: {}", settlement.period, payout),
            NotificationTarget::Owner(settlement.owner_id.clone()),
            now,
        )
    }
}

// =============================================================================
// Sink
// =============================================================================

/// Receives notifications from the ledger.
///
/// Fire-and-forget: an implementation must not block and must not fail the
/// caller. Dropped notifications are the sink's business to log.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, notification: Notification);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn emit(&self, _notification: Notification) {}
}
