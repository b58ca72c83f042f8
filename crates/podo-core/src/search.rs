//! # Item Search
//!
//! Counter lookup over the shelves: what can still be sold, matched by a
//! free-text query.
//!
//! ```text
//! books  ── title | author | isbn | owner number ──┐
//! goods  ── name  | owner number ──────────────────┴─► available only
//!                                                      ├─ branch scope
//!                                                      └─ + owner / branch names
//! ```
//!
//! Matching is a case-insensitive substring test. An empty query matches
//! every available item in scope.

use serde::{Deserialize, Serialize};

use crate::stats::LedgerSnapshot;
use crate::types::{Item, ItemKind};

/// A matching item with the display names joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemHit {
    pub item: Item,
    /// `None` for house items and owners missing from the snapshot.
    pub owner_name: Option<String>,
    pub branch_name: Option<String>,
}

/// Available books, then available goods, matching `query`.
///
/// `branch_id` limits the search to one branch; `None` searches the whole shop.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use podo_core::{search_items, Item, LedgerSnapshot, Money};
///
/// let snapshot = LedgerSnapshot {
///     goods: vec![Item::goods("GD001", "BR001", "Eco Bag", Money::won(15_000), "house_made", Utc::now())],
///     ..Default::default()
/// };
///
/// assert_eq!(search_items(&snapshot, "eco", None).len(), 1);
/// assert!(search_items(&snapshot, "eco", Some("BR002")).is_empty());
/// ```
pub fn search_items(snapshot: &LedgerSnapshot, query: &str, branch_id: Option<&str>) -> Vec<ItemHit> {
    let needle = query.trim().to_lowercase();

    snapshot
        .books
        .iter()
        .chain(&snapshot.goods)
        .filter(|item| item.is_available())
        .filter(|item| branch_id.map_or(true, |b| b == item.branch_id))
        .filter(|item| matches(item, &needle))
        .map(|item| ItemHit {
            item: item.clone(),
            owner_name: item
                .owner_id
                .as_deref()
                .and_then(|id| snapshot.owner(id))
                .map(|o| o.name.clone()),
            branch_name: snapshot
                .branches
                .iter()
                .find(|b| b.id == item.branch_id)
                .map(|b| b.name.clone()),
        })
        .collect()
}

fn matches(item: &Item, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);

    if contains(&item.owner_number) {
        return true;
    }
    match &item.kind {
        ItemKind::Book(info) => contains(&info.title) || contains(&info.author) || info.isbn.contains(needle),
        ItemKind::Goods(info) => contains(&info.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{BookInfo, Branch, BranchStatus, Owner, OwnerStatus};
    use chrono::{DateTime, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn book(id: &str, branch: &str, title: &str, author: &str, isbn: &str) -> Item {
        let info = BookInfo {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            publisher: "Minumsa".into(),
            pub_year: None,
            original_price: Money::won(12_000),
        };
        Item::book(id, branch, info, Money::won(12_000), "used", at("2024-09-01T00:00:00Z"))
    }

    fn snapshot() -> LedgerSnapshot {
        let branch = |id: &str, name: &str| Branch {
            id: id.into(),
            name: name.into(),
            code: "MP".into(),
            status: BranchStatus::Active,
        };
        let owner = Owner {
            id: "OW001".into(),
            owner_number: "MP001".into(),
            name: "Kim Podo".into(),
            phone: None,
            email: None,
            branch_id: "BR001".into(),
            shelves: vec![],
            balance: Money::zero(),
            status: OwnerStatus::Active,
            created_at: at("2024-06-15T00:00:00Z"),
        };

        LedgerSnapshot {
            branches: vec![branch("BR001", "Mokpo"), branch("BR002", "Ganghwa")],
            owners: vec![owner],
            books: vec![
                book("BK001", "BR001", "Demian", "Hermann Hesse", "9788937460784").owned_by("OW001", "MP001"),
                book("BK002", "BR002", "Steppenwolf", "Hermann Hesse", "9788937461033"),
            ],
            goods: vec![Item::goods("GD001", "BR001", "Hesse Postcards", Money::won(8_000), "handmade", at("2024-09-01T00:00:00Z"))
                .owned_by("OW001", "MP001")],
            ..Default::default()
        }
    }

    fn ids(hits: &[ItemHit]) -> Vec<&str> {
        hits.iter().map(|h| h.item.id.as_str()).collect()
    }

    #[test]
    fn test_matches_every_searchable_field() {
        let snap = snapshot();
        assert_eq!(ids(&search_items(&snap, "DEMIAN", None)), ["BK001"]);
        assert_eq!(ids(&search_items(&snap, "hesse", None)), ["BK001", "BK002", "GD001"]);
        assert_eq!(ids(&search_items(&snap, "9788937461", None)), ["BK002"]);
        assert_eq!(ids(&search_items(&snap, "mp001", None)), ["BK001", "GD001"]);
        assert!(search_items(&snap, "Minumsa", None).is_empty());
    }

    #[test]
    fn test_branch_scope() {
        let snap = snapshot();
        assert_eq!(ids(&search_items(&snap, "hesse", Some("BR002"))), ["BK002"]);
        assert_eq!(ids(&search_items(&snap, "hesse", Some("BR001"))), ["BK001", "GD001"]);
        assert!(search_items(&snap, "hesse", Some("BR404")).is_empty());
        assert_eq!(search_items(&snap, "", None).len(), 3);
    }

    #[test]
    fn test_sold_items_are_not_found() {
        let mut snap = snapshot();
        snap.books[0].sell_one().unwrap();

        assert!(search_items(&snap, "demian", None).is_empty());
        assert_eq!(ids(&search_items(&snap, "hesse", None)), ["BK002", "GD001"]);
    }

    #[test]
    fn test_hits_carry_owner_and_branch_names() {
        let snap = snapshot();
        let hits = search_items(&snap, "hesse", None);

        assert_eq!(hits[0].owner_name.as_deref(), Some("Kim Podo"));
        assert_eq!(hits[0].branch_name.as_deref(), Some("Mokpo"));
        // unowned book
        assert_eq!(hits[1].owner_name, None);
        assert_eq!(hits[1].branch_name.as_deref(), Some("Ganghwa"));
    }
}
