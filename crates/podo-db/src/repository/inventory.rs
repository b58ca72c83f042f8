//! # Inventory Ledger
//!
//! Stock changes for consigned items. Books and goods live in separate
//! collections; an [`ItemRef`] says which one to touch.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  decrement_on_sale     qty 3 → 2            (still available)          │
//! │                        qty 1 → 0 + sold     (same write)               │
//! │                        sold  → ItemSoldOut  (nothing written)          │
//! │                                                                         │
//! │  increment_on_refund   qty n → n+1 + available                         │
//! │                                                                         │
//! │  missing id            → ItemNotFound                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::store::{load, save, Collection};
use podo_core::validation::validate_item;
use podo_core::{CoreError, Item, ItemCategory, ItemRef, Money, ValidationError};

/// Item stock, scoped to one transaction.
pub struct InventoryLedger<'a> {
    conn: &'a mut SqliteConnection,
}

fn collection_for(category: ItemCategory) -> Collection {
    match category {
        ItemCategory::Book => Collection::Books,
        ItemCategory::Goods => Collection::Goods,
    }
}

fn not_found(item: &ItemRef) -> CoreError {
    CoreError::ItemNotFound {
        category: item.category,
        id: item.id.clone(),
    }
}

impl<'a> InventoryLedger<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        InventoryLedger { conn }
    }

    /// All items of one category, in intake order.
    pub async fn list(&mut self, category: ItemCategory) -> DbResult<Vec<Item>> {
        load(&mut *self.conn, collection_for(category)).await
    }

    pub async fn find(&mut self, item: &ItemRef) -> DbResult<Item> {
        self.list(item.category)
            .await?
            .into_iter()
            .find(|i| i.id == item.id)
            .ok_or_else(|| not_found(item).into())
    }

    /// Catalog intake. Rejects invalid items and duplicate ids.
    pub async fn insert(&mut self, item: Item) -> DbResult<Item> {
        validate_item(&item).map_err(CoreError::from)?;

        let collection = collection_for(item.category());
        let mut items: Vec<Item> = load(&mut *self.conn, collection).await?;
        if items.iter().any(|i| i.id == item.id) {
            return Err(CoreError::from(ValidationError::InvalidFormat {
                field: "id".to_string(),
                reason: format!("{} already exists", item.id),
            })
            .into());
        }

        debug!(id = %item.id, category = %item.category(), "Adding item to catalog");
        items.push(item.clone());
        save(&mut *self.conn, collection, &items).await?;
        Ok(item)
    }

    /// Takes one unit off the shelf. Returns the item after the change.
    pub async fn decrement_on_sale(&mut self, item: &ItemRef) -> DbResult<Item> {
        self.update(item, |i| i.sell_one()).await
    }

    /// Puts one unit back. Returns the item after the change.
    pub async fn increment_on_refund(&mut self, item: &ItemRef) -> DbResult<Item> {
        self.update(item, |i| {
            i.restock_one();
            Ok(())
        })
        .await
    }

    /// Changes the listed price. Past sales keep the price they were sold at.
    pub async fn reprice(&mut self, item: &ItemRef, price: Money) -> DbResult<Item> {
        podo_core::validation::validate_price(price).map_err(CoreError::from)?;
        self.update(item, |i| {
            i.price = price;
            Ok(())
        })
        .await
    }

    /// Removes an item from the catalog.
    pub async fn remove(&mut self, item: &ItemRef) -> DbResult<Item> {
        let collection = collection_for(item.category);
        let mut items: Vec<Item> = load(&mut *self.conn, collection).await?;
        let idx = items
            .iter()
            .position(|i| i.id == item.id)
            .ok_or_else(|| not_found(item))?;

        let removed = items.remove(idx);
        save(&mut *self.conn, collection, &items).await?;
        debug!(%item, "Removed item from catalog");
        Ok(removed)
    }

    async fn update<F>(&mut self, item: &ItemRef, change: F) -> DbResult<Item>
    where
        F: FnOnce(&mut Item) -> Result<(), CoreError>,
    {
        let collection = collection_for(item.category);
        let mut items: Vec<Item> = load(&mut *self.conn, collection).await?;
        let target = items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| not_found(item))?;

        change(target)?;
        let updated = target.clone();

        save(&mut *self.conn, collection, &items).await?;
        debug!(%item, quantity = updated.quantity, availability = ?updated.availability, "Stock updated");
        Ok(updated)
    }
}
