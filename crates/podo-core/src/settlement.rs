//! # Settlement Module
//!
//! Revenue split between the shop and the owner, and the monthly settlement
//! record that closes an owner's period.
//!
//! ## Rate Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  category   condition tag     shop %   owner %                          │
//! │  ────────   ─────────────     ──────   ───────                          │
//! │  book       order_new            0       100   (ordered in for owner)   │
//! │  book       owner_new           15        85                            │
//! │  book       used                50        50                            │
//! │  goods      house_made         100         0   (shop's own product)     │
//! │  goods      collab              30        70                            │
//! │  goods      handmade            20        80                            │
//! │  goods      consign             20        80                            │
//! │  *          anything else       50        50   (fallback)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Split Rounding
//! Only the shop side is rounded; the owner gets the remainder, so the two
//! amounts always add back up to the price.
//! ```rust
//! use podo_core::money::Money;
//! use podo_core::settlement::split;
//! use podo_core::types::ItemCategory;
//!
//! let s = split(Money::won(10_001), ItemCategory::Goods, "collab");
//! assert_eq!(s.shop_amount, Money::won(3_000));
//! assert_eq!(s.owner_amount, Money::won(7_001));
//! ```

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::sale::Sale;
use crate::types::{ItemCategory, Owner, Shelf};
use crate::DEFAULT_SPLIT_PCT;

// =============================================================================
// Rate Table
// =============================================================================

/// `(category, condition, shop %)`. Owner % is always `100 - shop %`.
const RATE_TABLE: &[(ItemCategory, &str, u8)] = &[
    (ItemCategory::Book, "order_new", 0),
    (ItemCategory::Book, "owner_new", 15),
    (ItemCategory::Book, "used", 50),
    (ItemCategory::Goods, "house_made", 100),
    (ItemCategory::Goods, "collab", 30),
    (ItemCategory::Goods, "handmade", 20),
    (ItemCategory::Goods, "consign", 20),
];

/// Alternative spellings accepted for a table tag.
const TAG_ALIASES: &[(&str, &str)] = &[("podo", "house_made")];

/// Canonical spelling of a condition tag.
///
/// Case and surrounding whitespace are ignored and `-` reads as `_`, so
/// `House-Made`, `house-made` and `house_made` are the same tag.
///
/// ## Example
/// ```rust
/// use podo_core::settlement::normalize_condition;
///
/// assert_eq!(normalize_condition("house-made"), "house_made");
/// assert_eq!(normalize_condition("podo"), "house_made");
/// assert_eq!(normalize_condition(" Used "), "used");
/// ```
pub fn normalize_condition(condition: &str) -> String {
    let tag = condition.trim().to_ascii_lowercase().replace('-', "_");
    TAG_ALIASES
        .iter()
        .find(|(alias, _)| *alias == tag)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(tag)
}

/// Shop percentage for a category and condition tag.
///
/// The tag is normalized first. Unknown tags, including a valid tag of the
/// other category (`used` on goods), fall back to 50.
pub fn shop_rate(category: ItemCategory, condition: &str) -> u8 {
    let normalized = normalize_condition(condition);
    RATE_TABLE
        .iter()
        .find(|(cat, tag, _)| *cat == category && *tag == normalized)
        .map(|(_, _, rate)| *rate)
        .unwrap_or_else(|| {
            debug!(%category, condition, "Unknown condition tag, using default split");
            DEFAULT_SPLIT_PCT
        })
}

/// Condition tags that have an explicit rate for a category.
pub fn known_conditions(category: ItemCategory) -> impl Iterator<Item = &'static str> {
    RATE_TABLE
        .iter()
        .filter(move |(cat, _, _)| *cat == category)
        .map(|(_, tag, _)| *tag)
}

// =============================================================================
// Split
// =============================================================================

/// Result of splitting one sale price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub shop_amount: Money,
    pub owner_amount: Money,
    pub shop_rate: u8,
    pub owner_rate: u8,
}

/// Splits a sale price between shop and owner.
///
/// Total for every input: unknown tags use the 50/50 fallback.
///
/// ## Example
/// ```rust
/// use podo_core::money::Money;
/// use podo_core::settlement::split;
/// use podo_core::types::ItemCategory;
///
/// let s = split(Money::won(12_000), ItemCategory::Book, "used");
/// assert_eq!(s.shop_amount, Money::won(6_000));
/// assert_eq!(s.owner_amount, Money::won(6_000));
/// ```
pub fn split(price: Money, category: ItemCategory, condition: &str) -> Split {
    let rate = shop_rate(category, condition);
    let shop_amount = price.percent(rate);

    Split {
        shop_amount,
        owner_amount: price - shop_amount,
        shop_rate: rate,
        owner_rate: 100 - rate,
    }
}

// =============================================================================
// Settlement Period
// =============================================================================

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SettlementPeriod {
    year: i32,
    month: u32,
}

impl SettlementPeriod {
    /// Builds a period, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::OutOfRange {
                field: "period month".to_string(),
                min: 1,
                max: 12,
            });
        }
        Ok(SettlementPeriod { year, month })
    }

    /// The month a timestamp falls in (UTC).
    pub fn of(at: DateTime<Utc>) -> Self {
        SettlementPeriod {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // month is validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Whether the whole month lies before `now`, so no new sale can land in it.
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        *self < SettlementPeriod::of(now)
    }

    /// Whether a timestamp falls inside this month.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at.year() == self.year && at.month() == self.month
    }
}

impl fmt::Display for SettlementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for SettlementPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "period".to_string(),
            reason: reason.to_string(),
        };

        let (year, month) = s.trim().split_once('-').ok_or_else(|| invalid("expected YYYY-MM"))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid("expected YYYY-MM"));
        }
        let year: i32 = year.parse().map_err(|_| invalid("year is not a number"))?;
        let month: u32 = month.parse().map_err(|_| invalid("month is not a number"))?;

        SettlementPeriod::new(year, month)
    }
}

impl TryFrom<String> for SettlementPeriod {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SettlementPeriod> for String {
    fn from(period: SettlementPeriod) -> Self {
        period.to_string()
    }
}

// =============================================================================
// Settlement Record
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    #[default]
    Pending,
    Completed,
}

/// One owner's closed month.
///
/// `final_amount` is what the shop pays out; it goes negative when rent is
/// larger than the month's owner revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: String,
    pub period: SettlementPeriod,
    pub owner_id: String,
    pub owner_number: String,
    pub total_sales: Money,
    pub shop_amount: Money,
    pub owner_amount: Money,
    pub rent: Money,
    pub final_amount: Money,
    pub sale_count: u32,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Settlement {
    /// Closes `period` for `owner` from the sales log and the owner's shelves.
    ///
    /// Only completed sales of this owner inside the month count. Rent is the
    /// sum of the listed prices of shelves the owner holds right now.
    pub fn close(
        owner: &Owner,
        period: SettlementPeriod,
        sales: &[Sale],
        shelves: &[Shelf],
        now: DateTime<Utc>,
    ) -> Settlement {
        let in_period: Vec<&Sale> = sales
            .iter()
            .filter(|s| s.is_completed())
            .filter(|s| s.owner_id.as_deref() == Some(owner.id.as_str()))
            .filter(|s| period.contains(s.created_at))
            .collect();

        let total_sales: Money = in_period.iter().map(|s| s.price).sum();
        let shop_amount: Money = in_period.iter().map(|s| s.shop_amount).sum();
        let owner_amount: Money = in_period.iter().map(|s| s.owner_amount).sum();
        let rent = rent_for(&owner.id, shelves);

        Settlement {
            id: format!("ST-{}", Uuid::new_v4()),
            period,
            owner_id: owner.id.clone(),
            owner_number: owner.owner_number.clone(),
            total_sales,
            shop_amount,
            owner_amount,
            rent,
            final_amount: owner_amount - rent,
            sale_count: in_period.len() as u32,
            status: SettlementStatus::Completed,
            created_at: now,
            paid_at: Some(now),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SettlementStatus::Completed
    }
}

/// Monthly rent: listed price of every shelf the owner currently holds.
pub fn rent_for(owner_id: &str, shelves: &[Shelf]) -> Money {
    shelves
        .iter()
        .filter(|s| s.owner_id.as_deref() == Some(owner_id))
        .map(|s| s.price)
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale::SaleStatus;
    use crate::types::{Item, OwnerStatus, PaymentMethod, ShelfType};
    use proptest::prelude::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_rate_table_scenarios() {
        let s = split(Money::won(12_000), ItemCategory::Book, "used");
        assert_eq!((s.shop_amount.amount(), s.owner_amount.amount()), (6_000, 6_000));

        let s = split(Money::won(15_000), ItemCategory::Goods, "house_made");
        assert_eq!((s.shop_amount.amount(), s.owner_amount.amount()), (15_000, 0));
        assert_eq!((s.shop_rate, s.owner_rate), (100, 0));

        let s = split(Money::won(10_001), ItemCategory::Goods, "collab");
        assert_eq!((s.shop_amount.amount(), s.owner_amount.amount()), (3_000, 7_001));

        let s = split(Money::won(14_000), ItemCategory::Book, "order_new");
        assert_eq!(s.owner_amount, Money::won(14_000));
    }

    #[test]
    fn test_house_made_spellings_share_one_rate() {
        for tag in ["house-made", "house_made", "House-Made", "podo"] {
            let s = split(Money::won(15_000), ItemCategory::Goods, tag);
            assert_eq!(s.shop_amount, Money::won(15_000), "tag {}", tag);
            assert!(s.owner_amount.is_zero(), "tag {}", tag);
        }

        let s = split(Money::won(12_000), ItemCategory::Book, "owner-new");
        assert_eq!(s.shop_rate, 15);
    }

    #[test]
    fn test_unknown_tag_falls_back_to_even_split() {
        let s = split(Money::won(9_000), ItemCategory::Book, "signed_first_edition");
        assert_eq!((s.shop_rate, s.owner_rate), (50, 50));

        // valid tag, wrong category
        let s = split(Money::won(9_000), ItemCategory::Goods, "used");
        assert_eq!(s.shop_amount, Money::won(4_500));
    }

    #[test]
    fn test_known_conditions() {
        let goods: Vec<_> = known_conditions(ItemCategory::Goods).collect();
        assert_eq!(goods, vec!["house_made", "collab", "handmade", "consign"]);
    }

    proptest! {
        #[test]
        fn split_always_conserves_price(
            price in 0i64..=1_000_000_000_000,
            is_book in any::<bool>(),
            tag in prop::sample::select(vec![
                "order_new", "owner_new", "used", "house_made",
                "collab", "handmade", "consign", "", "mystery",
            ]),
        ) {
            let category = if is_book { ItemCategory::Book } else { ItemCategory::Goods };
            let s = split(Money::won(price), category, tag);
            prop_assert_eq!(s.shop_amount + s.owner_amount, Money::won(price));
            prop_assert!(!s.shop_amount.is_negative());
            prop_assert!(!s.owner_amount.is_negative());
            prop_assert_eq!(s.shop_rate + s.owner_rate, 100);
        }
    }

    #[test]
    fn test_period_parse_and_display() {
        let p: SettlementPeriod = "2024-12".parse().unwrap();
        assert_eq!((p.year(), p.month()), (2024, 12));
        assert_eq!(p.to_string(), "2024-12");
        assert!(p.contains(at("2024-12-31T23:59:59Z")));
        assert!(!p.contains(at("2025-01-01T00:00:00Z")));

        assert!("2024-13".parse::<SettlementPeriod>().is_err());
        assert!("2024/12".parse::<SettlementPeriod>().is_err());
        assert!("24-1".parse::<SettlementPeriod>().is_err());

        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"2024-12\"");
    }

    #[test]
    fn test_period_ends_with_the_month() {
        let dec = SettlementPeriod::new(2024, 12).unwrap();
        assert!(!dec.has_ended(at("2024-12-10T00:00:00Z")));
        assert!(!dec.has_ended(at("2024-12-31T23:59:59Z")));
        assert!(dec.has_ended(at("2025-01-01T00:00:00Z")));
        assert!(!SettlementPeriod::new(2025, 2).unwrap().has_ended(at("2025-01-15T00:00:00Z")));
    }

    #[test]
    fn test_close_counts_only_completed_sales_in_month() {
        let owner = Owner {
            id: "OW001".into(),
            owner_number: "MP001".into(),
            name: "Kim".into(),
            phone: None,
            email: None,
            branch_id: "BR001".into(),
            shelves: vec!["S01".into()],
            balance: Money::zero(),
            status: OwnerStatus::Active,
            created_at: at("2024-01-01T00:00:00Z"),
        };
        let mut shelf = Shelf::new("BR001", "MP", ShelfType::Small, 1);
        shelf.owner_id = Some("OW001".into());

        let item = Item::goods("GD002", "BR001", "Card", Money::won(8_000), "handmade", at("2024-11-01T00:00:00Z"))
            .owned_by("OW001", "MP001");
        let in_month = Sale::record("SL1", &item, PaymentMethod::Card, at("2024-12-03T09:00:00Z"));
        let mut refunded = Sale::record("SL2", &item, PaymentMethod::Cash, at("2024-12-04T09:00:00Z"));
        refunded.refund(at("2024-12-04T10:00:00Z")).unwrap();
        let other_month = Sale::record("SL3", &item, PaymentMethod::Card, at("2024-11-30T09:00:00Z"));
        assert_eq!(refunded.status, SaleStatus::Refunded);

        let st = Settlement::close(
            &owner,
            "2024-12".parse().unwrap(),
            &[in_month, refunded, other_month],
            &[shelf],
            at("2025-01-01T00:00:00Z"),
        );

        assert_eq!(st.sale_count, 1);
        assert_eq!(st.total_sales, Money::won(8_000));
        assert_eq!(st.owner_amount, Money::won(6_400));
        assert_eq!(st.rent, Money::won(10_000));
        assert_eq!(st.final_amount, Money::won(-3_600));
        assert!(st.is_completed());
    }
}
