//! # Domain Types
//!
//! Catalog-side types: branches, shelves, owners and the items they consign.
//! Sale and settlement records live in [`crate::sale`] and [`crate::settlement`].
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Branch      │   │      Shelf      │   │      Owner      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id   "BR001"   │◄──│  branch_id      │   │  owner_number   │       │
//! │  │  code "MP"      │   │  code  "S01"    │──►│  shelves [S01]  │       │
//! │  │  status         │   │  price (rent)   │   │  balance        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                      ▲                  │
//! │  ┌──────────────────────────────────────────────┐    │                  │
//! │  │  Item  (common shape)                        │────┘ owner_id (opt)   │
//! │  │  price · quantity · condition · availability │                       │
//! │  │  ┌────────────────┐   ┌────────────────┐     │                       │
//! │  │  │ Book           │   │ Goods          │     │                       │
//! │  │  │ isbn, title... │   │ name           │     │                       │
//! │  │  └────────────────┘   └────────────────┘     │                       │
//! │  └──────────────────────────────────────────────┘                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Branch
// =============================================================================

/// Whether a branch is trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    #[default]
    Active,
    /// Opening soon; shelves exist but nothing is sold yet.
    Pending,
}

/// A shop location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub name: String,
    /// Owner-number prefix, e.g. "MP" → MP001.
    pub code: String,
    pub status: BranchStatus,
}

impl Branch {
    pub fn is_active(&self) -> bool {
        self.status == BranchStatus::Active
    }
}

// =============================================================================
// Shelf
// =============================================================================

/// Physical shelf size. The letter is the prefix of the shelf code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShelfType {
    /// Mini shelf, code `Mnn`.
    #[serde(rename = "M")]
    Mini,
    /// Small bookcase, code `Snn`.
    #[serde(rename = "S")]
    Small,
    /// Large bookcase, code `Lnn`.
    #[serde(rename = "L")]
    Large,
    /// Flat display table, code `Fnn`.
    #[serde(rename = "F")]
    Flat,
}

impl ShelfType {
    /// All shelf types, smallest first.
    pub const ALL: [ShelfType; 4] = [ShelfType::Mini, ShelfType::Small, ShelfType::Large, ShelfType::Flat];

    /// Listed monthly rent.
    pub const fn monthly_price(&self) -> Money {
        match self {
            ShelfType::Mini => Money::won(3_000),
            ShelfType::Small => Money::won(10_000),
            ShelfType::Large => Money::won(20_000),
            ShelfType::Flat => Money::won(30_000),
        }
    }

    /// Rough number of items the shelf holds.
    pub const fn capacity(&self) -> u32 {
        match self {
            ShelfType::Mini => 10,
            ShelfType::Small => 30,
            ShelfType::Large => 60,
            ShelfType::Flat => 100,
        }
    }

    /// Code prefix letter.
    pub const fn letter(&self) -> char {
        match self {
            ShelfType::Mini => 'M',
            ShelfType::Small => 'S',
            ShelfType::Large => 'L',
            ShelfType::Flat => 'F',
        }
    }

    /// Shelf code for the n-th shelf of this type, e.g. `S01`.
    pub fn code(&self, n: u32) -> String {
        format!("{}{:02}", self.letter(), n)
    }
}

/// A rentable shelf in a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    pub id: String,
    pub code: String,
    pub branch_id: String,
    pub shelf_type: ShelfType,
    /// Listed price at the time the shelf was created; rent uses this value.
    pub price: Money,
    pub owner_id: Option<String>,
}

impl Shelf {
    /// Creates an unassigned shelf priced from its type.
    pub fn new(branch_id: impl Into<String>, branch_code: &str, shelf_type: ShelfType, n: u32) -> Self {
        let code = shelf_type.code(n);
        Shelf {
            id: format!("SH-{}-{}", branch_code, code),
            code,
            branch_id: branch_id.into(),
            shelf_type,
            price: shelf_type.monthly_price(),
            owner_id: None,
        }
    }

    pub fn is_rented(&self) -> bool {
        self.owner_id.is_some()
    }
}

// =============================================================================
// Owner
// =============================================================================

/// Whether an owner is currently consigning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerStatus {
    #[default]
    Active,
    Inactive,
}

/// A consignor renting shelves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    /// Display code, branch prefix + sequence (`MP001`).
    pub owner_number: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub branch_id: String,
    /// Codes of the shelves this owner holds.
    pub shelves: Vec<String>,
    /// Unpaid revenue share. Only `OwnerBalanceLedger` writes this.
    pub balance: Money,
    pub status: OwnerStatus,
    pub created_at: DateTime<Utc>,
}

impl Owner {
    pub fn is_active(&self) -> bool {
        self.status == OwnerStatus::Active
    }
}

// =============================================================================
// Item Category & Availability
// =============================================================================

/// Item kind; selects which rate table applies and which collection holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Book,
    Goods,
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemCategory::Book => write!(f, "book"),
            ItemCategory::Goods => write!(f, "goods"),
        }
    }
}

impl FromStr for ItemCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "book" | "books" => Ok(ItemCategory::Book),
            "goods" => Ok(ItemCategory::Goods),
            other => Err(ValidationError::InvalidFormat {
                field: "category".to_string(),
                reason: format!("unknown category '{}'", other),
            }),
        }
    }
}

/// Sale state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    Sold,
}

// =============================================================================
// Item
// =============================================================================

/// Book-specific catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInfo {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub pub_year: Option<String>,
    /// List price printed on the book; the selling price may be lower.
    pub original_price: Money,
}

/// Goods-specific catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsInfo {
    pub name: String,
}

/// Category-specific part of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Book(BookInfo),
    Goods(GoodsInfo),
}

/// Pointer to an item in either collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: String,
    pub category: ItemCategory,
}

impl ItemRef {
    pub fn book(id: impl Into<String>) -> Self {
        ItemRef {
            id: id.into(),
            category: ItemCategory::Book,
        }
    }

    pub fn goods(id: impl Into<String>) -> Self {
        ItemRef {
            id: id.into(),
            category: ItemCategory::Goods,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.id)
    }
}

/// A consigned book or goods item.
///
/// ## Quantity / Availability Coupling
/// ```text
/// quantity > 0  ⇔  Available
///
/// sell_one:    3 Available ──► 2 Available
///              1 Available ──► 0 Sold        (one step, never 0 Available)
///              0 Sold      ──► ItemSoldOut
///
/// restock_one: 0 Sold      ──► 1 Available
///              2 Available ──► 3 Available
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub branch_id: String,
    /// Shelf code; `None` for items displayed at the counter.
    pub shelf: Option<String>,
    /// `None` for house items that belong to the shop itself.
    pub owner_id: Option<String>,
    pub owner_number: String,
    pub price: Money,
    pub quantity: u32,
    /// Condition tag looked up in the rate table (`used`, `collab`, ...).
    pub condition: String,
    pub availability: Availability,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    /// Creates a single-copy, available, unowned book.
    pub fn book(
        id: impl Into<String>,
        branch_id: impl Into<String>,
        info: BookInfo,
        price: Money,
        condition: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::with_kind(id, branch_id, ItemKind::Book(info), price, condition, created_at)
    }

    /// Creates a single-copy, available, unowned goods item.
    pub fn goods(
        id: impl Into<String>,
        branch_id: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        condition: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let info = GoodsInfo { name: name.into() };
        Self::with_kind(id, branch_id, ItemKind::Goods(info), price, condition, created_at)
    }

    fn with_kind(
        id: impl Into<String>,
        branch_id: impl Into<String>,
        kind: ItemKind,
        price: Money,
        condition: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Item {
            id: id.into(),
            branch_id: branch_id.into(),
            shelf: None,
            owner_id: None,
            owner_number: String::new(),
            price,
            quantity: 1,
            condition: condition.into(),
            availability: Availability::Available,
            created_at,
            kind,
        }
    }

    /// Assigns the item to an owner.
    pub fn owned_by(mut self, owner_id: impl Into<String>, owner_number: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self.owner_number = owner_number.into();
        self
    }

    /// Places the item on a shelf.
    pub fn on_shelf(mut self, code: impl Into<String>) -> Self {
        self.shelf = Some(code.into());
        self
    }

    /// Sets the stock count; zero marks the item sold.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self.availability = if quantity > 0 {
            Availability::Available
        } else {
            Availability::Sold
        };
        self
    }

    pub fn category(&self) -> ItemCategory {
        match self.kind {
            ItemKind::Book(_) => ItemCategory::Book,
            ItemKind::Goods(_) => ItemCategory::Goods,
        }
    }

    /// Book title or goods name.
    pub fn title(&self) -> &str {
        match &self.kind {
            ItemKind::Book(info) => &info.title,
            ItemKind::Goods(info) => &info.name,
        }
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            id: self.id.clone(),
            category: self.category(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    /// Takes one unit off the shelf for a sale.
    ///
    /// ## Errors
    /// `ItemSoldOut` when the item is already sold or has no stock left.
    pub fn sell_one(&mut self) -> CoreResult<()> {
        if !self.is_available() || self.quantity == 0 {
            return Err(CoreError::ItemSoldOut {
                category: self.category(),
                id: self.id.clone(),
            });
        }

        if self.quantity > 1 {
            self.quantity -= 1;
        } else {
            self.quantity = 0;
            self.availability = Availability::Sold;
        }
        Ok(())
    }

    /// Puts one unit back after a refund. Always leaves the item available.
    pub fn restock_one(&mut self) {
        self.quantity += 1;
        self.availability = Availability::Available;
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid. Informational only; it does not affect the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    Cash,
    /// Bank transfer.
    Transfer,
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" | "bank" | "account" => Ok(PaymentMethod::Transfer),
            other => Err(ValidationError::InvalidFormat {
                field: "method".to_string(),
                reason: format!("unknown payment method '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2024-12-05T10:00:00Z".parse().unwrap()
    }

    fn demian() -> Item {
        Item::book(
            "BK001",
            "BR001",
            BookInfo {
                isbn: "9788937460784".into(),
                title: "Demian".into(),
                author: "Hermann Hesse".into(),
                publisher: "Minumsa".into(),
                pub_year: Some("2009".into()),
                original_price: Money::won(12_000),
            },
            Money::won(12_000),
            "used",
            now(),
        )
        .owned_by("OW001", "MP001")
        .on_shelf("S01")
    }

    #[test]
    fn test_sell_last_unit_flips_to_sold() {
        let mut item = demian();
        item.sell_one().unwrap();
        assert_eq!(item.quantity, 0);
        assert_eq!(item.availability, Availability::Sold);
    }

    #[test]
    fn test_sell_from_stack_keeps_available() {
        let mut item = demian().with_quantity(3);
        item.sell_one().unwrap();
        assert_eq!(item.quantity, 2);
        assert!(item.is_available());
    }

    #[test]
    fn test_sell_sold_item_fails() {
        let mut item = demian();
        item.sell_one().unwrap();
        let err = item.sell_one().unwrap_err();
        assert!(matches!(err, CoreError::ItemSoldOut { .. }));
        assert_eq!(item.quantity, 0);
    }

    #[test]
    fn test_restock_forces_available() {
        let mut item = demian();
        item.sell_one().unwrap();
        item.restock_one();
        assert_eq!(item.quantity, 1);
        assert!(item.is_available());
    }

    #[test]
    fn test_item_json_shape_is_flat_and_tagged() {
        let json = serde_json::to_value(demian()).unwrap();
        assert_eq!(json["type"], "book");
        assert_eq!(json["title"], "Demian");
        assert_eq!(json["price"], 12_000);
        assert_eq!(json["availability"], "available");

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, demian());
    }

    #[test]
    fn test_goods_title_and_category() {
        let bag = Item::goods("GD001", "BR001", "Eco bag", Money::won(15_000), "house_made", now());
        assert_eq!(bag.title(), "Eco bag");
        assert_eq!(bag.category(), ItemCategory::Goods);
        assert_eq!(bag.item_ref(), ItemRef::goods("GD001"));
        assert!(bag.owner_id.is_none());
    }

    #[test]
    fn test_shelf_codes_and_prices() {
        let shelf = Shelf::new("BR001", "MP", ShelfType::Large, 1);
        assert_eq!(shelf.code, "L01");
        assert_eq!(shelf.id, "SH-MP-L01");
        assert_eq!(shelf.price, Money::won(20_000));
        assert_eq!(ShelfType::Flat.capacity(), 100);
        assert!(!shelf.is_rented());
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("Debit".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("account".parse::<PaymentMethod>().unwrap(), PaymentMethod::Transfer);
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }
}
