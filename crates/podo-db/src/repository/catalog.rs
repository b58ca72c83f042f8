//! # Catalog
//!
//! Branches, shelves and owner registration. Everything here is set up
//! before trading starts; the ledger only reads it (shelf rent, owner lookup).

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::store::{load, save, Collection};
use podo_core::validation::{next_owner_number, validate_branch_code};
use podo_core::{Branch, CoreError, Money, Owner, OwnerStatus, Shelf, ValidationError};

/// Details supplied when signing up a new owner.
#[derive(Debug, Clone, Default)]
pub struct NewOwner {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub branch_id: String,
}

/// Catalog records, scoped to one transaction.
pub struct Catalog<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> Catalog<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Catalog { conn }
    }

    // =========================================================================
    // Branches
    // =========================================================================

    pub async fn branches(&mut self) -> DbResult<Vec<Branch>> {
        load(&mut *self.conn, Collection::Branches).await
    }

    pub async fn add_branch(&mut self, branch: Branch) -> DbResult<Branch> {
        validate_branch_code(&branch.code).map_err(CoreError::from)?;

        let mut branches = self.branches().await?;
        if branches.iter().any(|b| b.id == branch.id || b.code == branch.code) {
            return Err(duplicate("branch", &branch.id));
        }

        info!(id = %branch.id, code = %branch.code, "Adding branch");
        branches.push(branch.clone());
        save(&mut *self.conn, Collection::Branches, &branches).await?;
        Ok(branch)
    }

    // =========================================================================
    // Shelves
    // =========================================================================

    pub async fn shelves(&mut self) -> DbResult<Vec<Shelf>> {
        load(&mut *self.conn, Collection::Shelves).await
    }

    pub async fn add_shelf(&mut self, shelf: Shelf) -> DbResult<Shelf> {
        let mut shelves = self.shelves().await?;
        if shelves.iter().any(|s| s.id == shelf.id) {
            return Err(duplicate("shelf", &shelf.id));
        }

        debug!(id = %shelf.id, price = %shelf.price, "Adding shelf");
        shelves.push(shelf.clone());
        save(&mut *self.conn, Collection::Shelves, &shelves).await?;
        Ok(shelf)
    }

    /// Rents a shelf to an owner and records the code on the owner.
    pub async fn assign_shelf(&mut self, shelf_id: &str, owner_id: &str) -> DbResult<Shelf> {
        let mut owners: Vec<Owner> = load(&mut *self.conn, Collection::Owners).await?;
        let owner = owners
            .iter_mut()
            .find(|o| o.id == owner_id)
            .ok_or_else(|| CoreError::OwnerNotFound(owner_id.to_string()))?;

        let mut shelves = self.shelves().await?;
        let shelf = shelves
            .iter_mut()
            .find(|s| s.id == shelf_id)
            .ok_or_else(|| not_found("shelf", shelf_id))?;

        if shelf.owner_id.as_deref().is_some_and(|current| current != owner_id) {
            return Err(CoreError::from(ValidationError::InvalidFormat {
                field: "shelf".to_string(),
                reason: format!("{} is already rented", shelf.code),
            })
            .into());
        }

        shelf.owner_id = Some(owner_id.to_string());
        if !owner.shelves.contains(&shelf.code) {
            owner.shelves.push(shelf.code.clone());
        }
        let assigned = shelf.clone();

        save(&mut *self.conn, Collection::Shelves, &shelves).await?;
        save(&mut *self.conn, Collection::Owners, &owners).await?;
        info!(shelf = %assigned.code, owner_id, "Shelf assigned");
        Ok(assigned)
    }

    // =========================================================================
    // Owners
    // =========================================================================

    /// Signs up an owner under the next free number of their branch.
    /// The balance starts at zero.
    pub async fn register_owner(&mut self, new: NewOwner, now: DateTime<Utc>) -> DbResult<Owner> {
        if new.name.trim().is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "name".to_string(),
            })
            .into());
        }

        let branch = self
            .branches()
            .await?
            .into_iter()
            .find(|b| b.id == new.branch_id)
            .ok_or_else(|| not_found("branch", &new.branch_id))?;

        let mut owners: Vec<Owner> = load(&mut *self.conn, Collection::Owners).await?;
        let owner_number = next_owner_number(&branch.code, owners.iter().map(|o| o.owner_number.as_str()))
            .map_err(CoreError::from)?;

        let owner = Owner {
            id: format!("OW-{}", Uuid::new_v4()),
            owner_number,
            name: new.name,
            phone: new.phone,
            email: new.email,
            branch_id: branch.id,
            shelves: Vec::new(),
            balance: Money::zero(),
            status: OwnerStatus::Active,
            created_at: now,
        };

        info!(id = %owner.id, number = %owner.owner_number, "Owner registered");
        owners.push(owner.clone());
        save(&mut *self.conn, Collection::Owners, &owners).await?;
        Ok(owner)
    }

    /// Inserts an owner record as-is (imports and seeding).
    pub async fn import_owner(&mut self, owner: Owner) -> DbResult<Owner> {
        let mut owners: Vec<Owner> = load(&mut *self.conn, Collection::Owners).await?;
        if owners
            .iter()
            .any(|o| o.id == owner.id || o.owner_number == owner.owner_number)
        {
            return Err(duplicate("owner", &owner.id));
        }
        owners.push(owner.clone());
        save(&mut *self.conn, Collection::Owners, &owners).await?;
        Ok(owner)
    }
}

fn duplicate(entity: &str, id: &str) -> crate::error::DbError {
    CoreError::from(ValidationError::InvalidFormat {
        field: entity.to_string(),
        reason: format!("{} already exists", id),
    })
    .into()
}

fn not_found(entity: &str, id: &str) -> crate::error::DbError {
    crate::error::DbError::not_found(entity, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use podo_core::{BranchStatus, ShelfType};

    fn mokpo() -> Branch {
        Branch {
            id: "BR001".into(),
            name: "Mokpo".into(),
            code: "MP".into(),
            status: BranchStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_register_assigns_sequential_numbers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        tx.catalog().add_branch(mokpo()).await.unwrap();

        let new = NewOwner {
            name: "Kim".into(),
            branch_id: "BR001".into(),
            ..Default::default()
        };
        let first = tx.catalog().register_owner(new.clone(), Utc::now()).await.unwrap();
        let second = tx.catalog().register_owner(new, Utc::now()).await.unwrap();

        assert_eq!(first.owner_number, "MP001");
        assert_eq!(second.owner_number, "MP002");
        assert!(second.balance.is_zero());
    }

    #[tokio::test]
    async fn test_assign_shelf_links_both_sides() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        tx.catalog().add_branch(mokpo()).await.unwrap();
        let shelf = tx
            .catalog()
            .add_shelf(Shelf::new("BR001", "MP", ShelfType::Small, 1))
            .await
            .unwrap();
        let owner = tx
            .catalog()
            .register_owner(
                NewOwner {
                    name: "Kim".into(),
                    branch_id: "BR001".into(),
                    ..Default::default()
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let assigned = tx.catalog().assign_shelf(&shelf.id, &owner.id).await.unwrap();
        assert_eq!(assigned.owner_id.as_deref(), Some(owner.id.as_str()));

        let owner = tx.balances().get(&owner.id).await.unwrap();
        assert_eq!(owner.shelves, vec!["S01".to_string()]);

        assert!(tx.catalog().assign_shelf(&shelf.id, "OW-other").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_branch_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin_write().await.unwrap();
        let new = NewOwner {
            name: "Kim".into(),
            branch_id: "BR404".into(),
            ..Default::default()
        };
        assert!(tx.catalog().register_owner(new, Utc::now()).await.is_err());
    }
}
