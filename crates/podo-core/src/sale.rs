//! # Sale Records
//!
//! A sale is written once, at checkout, with everything frozen: price,
//! condition, split and owner. Afterwards the only allowed change is the
//! one-way refund flip.
//!
//! ## State Machine
//! ```text
//!   record()                refund(now)
//!  ─────────► [Completed] ─────────────► [Refunded]
//!                                            │
//!                                            │ refund(now)
//!                                            ▼
//!                                     AlreadyRefunded (no change)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::settlement::split;
use crate::types::{Item, ItemCategory, ItemRef, PaymentMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[default]
    Completed,
    Refunded,
}

/// One line in the sales journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub item_id: String,
    pub category: ItemCategory,
    pub item_title: String,
    /// Price at the moment of sale; later catalog edits never touch it.
    pub price: Money,
    pub condition: String,
    pub shop_amount: Money,
    pub owner_amount: Money,
    pub shop_rate: u8,
    pub owner_rate: u8,
    pub owner_id: Option<String>,
    pub owner_number: String,
    pub branch_id: String,
    pub method: PaymentMethod,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Freezes a sale of `item` as it is right now.
    pub fn record(id: impl Into<String>, item: &Item, method: PaymentMethod, now: DateTime<Utc>) -> Sale {
        let category = item.category();
        let split = split(item.price, category, &item.condition);

        Sale {
            id: id.into(),
            item_id: item.id.clone(),
            category,
            item_title: item.title().to_string(),
            price: item.price,
            condition: item.condition.clone(),
            shop_amount: split.shop_amount,
            owner_amount: split.owner_amount,
            shop_rate: split.shop_rate,
            owner_rate: split.owner_rate,
            owner_id: item.owner_id.clone(),
            owner_number: item.owner_number.clone(),
            branch_id: item.branch_id.clone(),
            method,
            status: SaleStatus::Completed,
            created_at: now,
            refunded_at: None,
        }
    }

    /// Flips a completed sale to refunded.
    ///
    /// ## Errors
    /// `AlreadyRefunded` if the flip already happened; the record is left as is.
    pub fn refund(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        match self.status {
            SaleStatus::Completed => {
                self.status = SaleStatus::Refunded;
                self.refunded_at = Some(now);
                Ok(())
            }
            SaleStatus::Refunded => Err(CoreError::AlreadyRefunded(self.id.clone())),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SaleStatus::Completed
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            id: self.item_id.clone(),
            category: self.category,
        }
    }
}
