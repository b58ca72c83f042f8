//! # Stats Rollups
//!
//! Read-only aggregation over a snapshot of every collection. All functions
//! take the current time explicitly so they stay deterministic.
//!
//! ## Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LedgerSnapshot                                                         │
//! │  ├── branches ──► active branch count (always shop-wide)               │
//! │  ├── owners   ──► active owners, balance                               │
//! │  ├── books    ──┐                                                       │
//! │  ├── goods    ──┴► available counts, total items                       │
//! │  ├── shelves  ──► shelf / used shelf counts, rent                      │
//! │  └── sales    ──► revenue, counts, daily buckets (completed only)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::sale::Sale;
use crate::settlement::{rent_for, Settlement, SettlementPeriod};
use crate::types::{Branch, Item, Owner, Shelf};

/// Everything the read side looks at, loaded in one consistent read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub branches: Vec<Branch>,
    pub shelves: Vec<Shelf>,
    pub owners: Vec<Owner>,
    pub books: Vec<Item>,
    pub goods: Vec<Item>,
    pub sales: Vec<Sale>,
    pub settlements: Vec<Settlement>,
}

impl LedgerSnapshot {
    pub fn owner(&self, owner_id: &str) -> Option<&Owner> {
        self.owners.iter().find(|o| o.id == owner_id)
    }

    fn completed_sales(&self) -> impl Iterator<Item = &Sale> {
        self.sales.iter().filter(|s| s.is_completed())
    }
}

// =============================================================================
// Branch Stats
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStats {
    pub active_branches: u32,
    pub active_owners: u32,
    pub available_books: u32,
    pub available_goods: u32,
    pub total_items: u32,
    pub shelf_count: u32,
    pub used_shelves: u32,
    pub total_sales: Money,
    pub shop_revenue: Money,
    pub owner_revenue: Money,
    pub sales_count: u32,
    pub today_sales: Money,
    pub today_count: u32,
}

/// Dashboard numbers for one branch, or the whole shop with `None`.
///
/// `active_branches` is never filtered. "Today" is the UTC date of `now`.
pub fn branch_stats(snapshot: &LedgerSnapshot, branch_id: Option<&str>, now: DateTime<Utc>) -> BranchStats {
    let in_branch = |id: &str| branch_id.map_or(true, |b| b == id);
    let today = now.date_naive();

    let books: Vec<&Item> = snapshot.books.iter().filter(|i| in_branch(i.branch_id.as_str())).collect();
    let goods: Vec<&Item> = snapshot.goods.iter().filter(|i| in_branch(i.branch_id.as_str())).collect();
    let shelves: Vec<&Shelf> = snapshot.shelves.iter().filter(|s| in_branch(s.branch_id.as_str())).collect();
    let sales: Vec<&Sale> = snapshot.completed_sales().filter(|s| in_branch(s.branch_id.as_str())).collect();
    let todays: Vec<&&Sale> = sales.iter().filter(|s| s.created_at.date_naive() == today).collect();

    BranchStats {
        active_branches: count(snapshot.branches.iter().filter(|b| b.is_active())),
        active_owners: count(
            snapshot
                .owners
                .iter()
                .filter(|o| in_branch(o.branch_id.as_str()) && o.is_active()),
        ),
        available_books: count(books.iter().filter(|i| i.is_available())),
        available_goods: count(goods.iter().filter(|i| i.is_available())),
        total_items: (books.len() + goods.len()) as u32,
        shelf_count: shelves.len() as u32,
        used_shelves: count(shelves.iter().filter(|s| s.is_rented())),
        total_sales: sales.iter().map(|s| s.price).sum(),
        shop_revenue: sales.iter().map(|s| s.shop_amount).sum(),
        owner_revenue: sales.iter().map(|s| s.owner_amount).sum(),
        sales_count: sales.len() as u32,
        today_sales: todays.iter().map(|s| s.price).sum(),
        today_count: todays.len() as u32,
    }
}

fn count<I: Iterator>(iter: I) -> u32 {
    iter.count() as u32
}

// =============================================================================
// Owner Stats
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerStats {
    pub owner: Owner,
    pub available_books: u32,
    pub available_goods: u32,
    pub total_items: u32,
    pub shelves: Vec<String>,
    pub shelf_count: u32,
    pub rent: Money,
    pub balance: Money,
    pub total_sales: Money,
    pub total_owner_amount: Money,
    pub month_sales: Money,
    pub month_owner_amount: Money,
    pub month_count: u32,
    /// Month-to-date owner revenue minus rent. Not floored.
    pub expected_settlement: Money,
}

/// An owner's own dashboard.
///
/// ## Errors
/// `OwnerNotFound` when no owner has this id.
pub fn owner_stats(snapshot: &LedgerSnapshot, owner_id: &str, now: DateTime<Utc>) -> CoreResult<OwnerStats> {
    let owner = snapshot
        .owner(owner_id)
        .ok_or_else(|| CoreError::OwnerNotFound(owner_id.to_string()))?;

    let owns = |i: &&Item| i.owner_id.as_deref() == Some(owner_id) && i.is_available();
    let available_books = count(snapshot.books.iter().filter(owns));
    let available_goods = count(snapshot.goods.iter().filter(owns));

    let sales: Vec<&Sale> = snapshot
        .completed_sales()
        .filter(|s| s.owner_id.as_deref() == Some(owner_id))
        .collect();
    let month = SettlementPeriod::of(now);
    let month_sales: Vec<&&Sale> = sales.iter().filter(|s| month.contains(s.created_at)).collect();

    let rent = rent_for(owner_id, &snapshot.shelves);
    let month_owner_amount: Money = month_sales.iter().map(|s| s.owner_amount).sum();

    Ok(OwnerStats {
        owner: owner.clone(),
        available_books,
        available_goods,
        total_items: available_books + available_goods,
        shelves: owner.shelves.clone(),
        shelf_count: count(
            snapshot
                .shelves
                .iter()
                .filter(|s| s.owner_id.as_deref() == Some(owner_id)),
        ),
        rent,
        balance: owner.balance,
        total_sales: sales.iter().map(|s| s.price).sum(),
        total_owner_amount: sales.iter().map(|s| s.owner_amount).sum(),
        month_sales: month_sales.iter().map(|s| s.price).sum(),
        month_owner_amount,
        month_count: month_sales.len() as u32,
        expected_settlement: month_owner_amount - rent,
    })
}

// =============================================================================
// Daily Series
// =============================================================================

/// One day of sales for charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    /// `M/D(Dow)`, e.g. `12/5(Thu)`.
    pub label: String,
    pub amount: Money,
    pub count: u32,
}

/// Exactly `days` buckets ending at `today` inclusive, oldest first.
/// Days without sales are present with zero amounts.
pub fn daily_series(
    snapshot: &LedgerSnapshot,
    days: u32,
    branch_id: Option<&str>,
    owner_id: Option<&str>,
    today: NaiveDate,
) -> Vec<DailyPoint> {
    let sales: Vec<&Sale> = snapshot
        .completed_sales()
        .filter(|s| branch_id.map_or(true, |b| s.branch_id == b))
        .filter(|s| owner_id.map_or(true, |o| s.owner_id.as_deref() == Some(o)))
        .collect();

    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back as u64)))
        .map(|date| {
            let day: Vec<&&Sale> = sales.iter().filter(|s| s.created_at.date_naive() == date).collect();
            DailyPoint {
                date,
                label: date.format("%-m/%-d(%a)").to_string(),
                amount: day.iter().map(|s| s.price).sum(),
                count: day.len() as u32,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookInfo, BranchStatus, OwnerStatus, PaymentMethod, ShelfType};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn owner(id: &str, branch: &str) -> Owner {
        Owner {
            id: id.into(),
            owner_number: format!("{}-no", id),
            name: id.into(),
            phone: None,
            email: None,
            branch_id: branch.into(),
            shelves: vec!["S01".into()],
            balance: Money::won(1_000),
            status: OwnerStatus::Active,
            created_at: at("2024-01-01T00:00:00Z"),
        }
    }

    fn snapshot() -> LedgerSnapshot {
        let branch = |id: &str, status| Branch {
            id: id.into(),
            name: id.into(),
            code: id.into(),
            status,
        };
        let mut s01 = Shelf::new("BR001", "MP", ShelfType::Small, 1);
        s01.owner_id = Some("OW001".into());
        let s02 = Shelf::new("BR001", "MP", ShelfType::Small, 2);
        let mut gh = Shelf::new("BR002", "GH", ShelfType::Large, 1);
        gh.owner_id = Some("OW002".into());

        let info = BookInfo {
            isbn: "9788937460784".into(),
            title: "Demian".into(),
            author: "Hermann Hesse".into(),
            publisher: "Minumsa".into(),
            pub_year: None,
            original_price: Money::won(12_000),
        };
        let book = Item::book("X", "BR001", info, Money::won(10_000), "used", at("2024-11-01T00:00:00Z"));
        let b1 = Item { id: "BK1".into(), ..book.clone() }.owned_by("OW001", "MP001");
        let b2 = Item { id: "BK2".into(), branch_id: "BR002".into(), ..book.clone() }
            .owned_by("OW002", "GH001")
            .with_quantity(0);
        let g1 = Item::goods("GD1", "BR002", "Mug", Money::won(5_000), "collab", at("2024-11-01T00:00:00Z"))
            .owned_by("OW002", "GH001");

        let mut sales = vec![
            Sale::record("SL1", &b1, PaymentMethod::Card, at("2024-12-05T09:00:00Z")),
            Sale::record("SL2", &g1, PaymentMethod::Cash, at("2024-12-04T09:00:00Z")),
            Sale::record("SL3", &g1, PaymentMethod::Cash, at("2024-11-20T09:00:00Z")),
            Sale::record("SL4", &b1, PaymentMethod::Cash, at("2024-12-05T11:00:00Z")),
        ];
        sales[3].refund(at("2024-12-05T12:00:00Z")).unwrap();

        LedgerSnapshot {
            branches: vec![
                branch("BR001", BranchStatus::Active),
                branch("BR002", BranchStatus::Active),
                branch("BR003", BranchStatus::Pending),
            ],
            shelves: vec![s01, s02, gh],
            owners: vec![owner("OW001", "BR001"), owner("OW002", "BR002")],
            books: vec![b1, b2],
            goods: vec![g1],
            sales,
            settlements: vec![],
        }
    }

    #[test]
    fn test_branch_stats_whole_shop() {
        let stats = branch_stats(&snapshot(), None, at("2024-12-05T20:00:00Z"));
        assert_eq!(stats.active_branches, 2);
        assert_eq!(stats.active_owners, 2);
        assert_eq!(stats.available_books, 1);
        assert_eq!(stats.available_goods, 1);
        assert_eq!(stats.total_items, 3);
        assert_eq!((stats.shelf_count, stats.used_shelves), (3, 2));
        assert_eq!(stats.sales_count, 3);
        assert_eq!(stats.total_sales, Money::won(20_000));
        assert_eq!(stats.today_count, 1);
        assert_eq!(stats.today_sales, Money::won(10_000));
        assert_eq!(stats.shop_revenue + stats.owner_revenue, stats.total_sales);
    }

    #[test]
    fn test_branch_totals_add_up() {
        let snap = snapshot();
        let now = at("2024-12-05T20:00:00Z");
        let all = branch_stats(&snap, None, now);
        let parts: Vec<BranchStats> = snap
            .branches
            .iter()
            .map(|b| branch_stats(&snap, Some(&b.id), now))
            .collect();

        assert_eq!(all.total_sales, parts.iter().map(|p| p.total_sales).sum());
        assert_eq!(all.shop_revenue, parts.iter().map(|p| p.shop_revenue).sum());
        assert_eq!(all.owner_revenue, parts.iter().map(|p| p.owner_revenue).sum());
        assert_eq!(all.sales_count, parts.iter().map(|p| p.sales_count).sum::<u32>());
        assert_eq!(all.today_sales, parts.iter().map(|p| p.today_sales).sum());
        assert!(parts.iter().all(|p| p.active_branches == 2));
    }

    #[test]
    fn test_owner_stats_month_window_and_rent() {
        let stats = owner_stats(&snapshot(), "OW002", at("2024-12-05T20:00:00Z")).unwrap();
        assert_eq!(stats.available_goods, 1);
        assert_eq!(stats.available_books, 0);
        assert_eq!(stats.rent, Money::won(20_000));
        assert_eq!(stats.total_sales, Money::won(10_000));
        assert_eq!(stats.month_count, 1);
        assert_eq!(stats.month_owner_amount, Money::won(3_500));
        assert_eq!(stats.expected_settlement, Money::won(-16_500));
    }

    #[test]
    fn test_owner_stats_unknown_owner() {
        let err = owner_stats(&snapshot(), "OW999", at("2024-12-05T20:00:00Z")).unwrap_err();
        assert_eq!(err, CoreError::OwnerNotFound("OW999".into()));
    }

    #[test]
    fn test_daily_series_shape() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 5).unwrap();
        let series = daily_series(&snapshot(), 7, None, None, today);

        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 11, 29).unwrap());
        assert_eq!(series[6].date, today);
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(series[6].label, "12/5(Thu)");
        assert_eq!(series[6].count, 1);
        assert_eq!(series[5].amount, Money::won(5_000));
        assert!(series[0].amount.is_zero());
    }

    #[test]
    fn test_daily_series_owner_filter() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 5).unwrap();
        let series = daily_series(&snapshot(), 3, Some("BR001"), Some("OW002"), today);
        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|p| p.count == 0));
        assert!(daily_series(&snapshot(), 0, None, None, today).is_empty());
    }
}
