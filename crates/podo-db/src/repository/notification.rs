//! # Notification Ring
//!
//! Capped, newest-first store of notifications with read/unread state.
//!
//! ## Ring Behavior
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  push(n)   [n, a, b, c, ... , y, z]  ──►  len > capacity? drop z       │
//! │             ▲ newest                          oldest ▲                  │
//! │                                                                         │
//! │  recent(Some("OW001"), 20)   All + Owner("OW001") targets, first 20    │
//! │  recent(None, 20)            operator view, everything                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use crate::error::DbResult;
use crate::pool::Database;
use crate::store::{load, save, Collection};
use podo_core::Notification;

/// Notification store backed by the `notifications` collection.
///
/// Writes go through the database writer gate like every ledger unit.
#[derive(Debug, Clone)]
pub struct NotificationRing {
    db: Database,
    capacity: usize,
}

impl NotificationRing {
    pub fn new(db: Database, capacity: usize) -> Self {
        NotificationRing {
            db,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adds a notification at the front, dropping the oldest past capacity.
    pub async fn push(&self, notification: Notification) -> DbResult<()> {
        let mut tx = self.db.begin_write().await?;
        let mut ring: Vec<Notification> = tx.load(Collection::Notifications).await?;

        ring.insert(0, notification);
        let dropped = ring.len().saturating_sub(self.capacity);
        ring.truncate(self.capacity);

        tx.save(Collection::Notifications, &ring).await?;
        tx.commit().await?;

        debug!(len = ring.len(), dropped, "Notification stored");
        Ok(())
    }

    /// Up to `limit` notifications visible to `viewer`, newest first.
    pub async fn recent(&self, viewer: Option<&str>, limit: usize) -> DbResult<Vec<Notification>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|n| n.visible_to(viewer))
            .take(limit)
            .collect())
    }

    pub async fn unread_count(&self, viewer: Option<&str>) -> DbResult<usize> {
        Ok(self
            .all()
            .await?
            .iter()
            .filter(|n| !n.read && n.visible_to(viewer))
            .count())
    }

    /// Marks everything `viewer` can see as read. Returns how many changed.
    pub async fn mark_all_read(&self, viewer: Option<&str>) -> DbResult<usize> {
        let mut tx = self.db.begin_write().await?;
        let mut ring: Vec<Notification> = tx.load(Collection::Notifications).await?;

        let mut changed = 0;
        for n in ring.iter_mut().filter(|n| !n.read && n.visible_to(viewer)) {
            n.read = true;
            changed += 1;
        }

        if changed > 0 {
            tx.save(Collection::Notifications, &ring).await?;
        }
        tx.commit().await?;
        Ok(changed)
    }

    async fn all(&self) -> DbResult<Vec<Notification>> {
        let mut conn = self.db.pool().acquire().await?;
        load(&mut conn, Collection::Notifications).await
    }

    /// Replaces the whole ring (seeding).
    pub async fn replace(&self, notifications: &[Notification]) -> DbResult<()> {
        let mut conn = self.db.pool().acquire().await?;
        let kept = &notifications[..notifications.len().min(self.capacity)];
        save(&mut conn, Collection::Notifications, kept).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use chrono::Utc;
    use podo_core::{NotificationKind, NotificationTarget};

    fn note(msg: &str, target: NotificationTarget) -> Notification {
        Notification::new(NotificationKind::System, msg, target, Utc::now())
    }

    #[tokio::test]
    async fn test_ring_is_capped_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ring = NotificationRing::new(db, 3);

        for i in 0..5 {
            ring.push(note(&format!("n{}", i), NotificationTarget::All)).await.unwrap();
        }

        let msgs: Vec<String> = ring.recent(None, 10).await.unwrap().into_iter().map(|n| n.message).collect();
        assert_eq!(msgs, vec!["n4", "n3", "n2"]);
    }

    #[tokio::test]
    async fn test_visibility_and_read_state() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ring = NotificationRing::new(db, 100);

        ring.push(note("everyone", NotificationTarget::All)).await.unwrap();
        ring.push(note("for one", NotificationTarget::Owner("OW001".into()))).await.unwrap();
        ring.push(note("for two", NotificationTarget::Owner("OW002".into()))).await.unwrap();

        assert_eq!(ring.unread_count(None).await.unwrap(), 3);
        assert_eq!(ring.unread_count(Some("OW001")).await.unwrap(), 2);
        assert_eq!(ring.recent(Some("OW001"), 1).await.unwrap()[0].message, "for one");

        assert_eq!(ring.mark_all_read(Some("OW001")).await.unwrap(), 2);
        assert_eq!(ring.unread_count(Some("OW001")).await.unwrap(), 0);
        assert_eq!(ring.unread_count(Some("OW002")).await.unwrap(), 1);
        assert_eq!(ring.unread_count(None).await.unwrap(), 1);
    }
}
