use std::sync::Arc;

use chrono::Utc;
use rusqlite::params;
use tracing::debug;

use filelink_core::{BotError, BotResult};

use crate::db::Database;

/// Headline numbers for the `/users` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
}

impl UserStats {
    pub fn blocked(&self) -> u64 {
        self.total - self.active
    }
}

/// The `users` collection: everyone who ever started the bot.
pub struct UserStore {
    db: Arc<Database>,
}

impl UserStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Record a user on first contact; repeat starts are no-ops.
    pub async fn record(&self, user_id: i64, username: Option<&str>) -> BotResult<()> {
        let conn = self.db.conn.lock().await;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO users (user_id, username, joined_at) VALUES (?1, ?2, ?3)",
                params![user_id, username, Utc::now().to_rfc3339()],
            )
            .map_err(BotError::storage)?;
        if inserted > 0 {
            debug!(user_id, "New user recorded");
        }
        Ok(())
    }

    pub async fn stats(&self) -> BotResult<UserStats> {
        let conn = self.db.conn.lock().await;
        let total: u64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(BotError::storage)?;
        let active: u64 = conn
            .query_row("SELECT COUNT(*) FROM users WHERE blocked = 0", [], |row| {
                row.get(0)
            })
            .map_err(BotError::storage)?;
        Ok(UserStats { total, active })
    }

    /// Broadcast audience: every user not flagged as blocked, oldest first.
    pub async fn broadcast_targets(&self) -> BotResult<Vec<i64>> {
        let conn = self.db.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT user_id FROM users WHERE blocked = 0 ORDER BY rowid")
            .map_err(BotError::storage)?;
        let ids = stmt
            .query_map([], |row| row.get(0))
            .map_err(BotError::storage)?
            .filter_map(|row| row.ok())
            .collect();
        Ok(ids)
    }

    /// Flag a user whose broadcast delivery bounced with a blocked error.
    pub async fn mark_blocked(&self, user_id: i64) -> BotResult<()> {
        let conn = self.db.conn.lock().await;
        conn.execute(
            "UPDATE users SET blocked = 1 WHERE user_id = ?1",
            params![user_id],
        )
        .map_err(BotError::storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> UserStore {
        UserStore::new(Arc::new(Database::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn repeat_starts_do_not_duplicate_users() {
        let store = store();
        store.record(1, Some("alice")).await.unwrap();
        store.record(1, Some("alice")).await.unwrap();
        store.record(2, None).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 2);
    }

    #[tokio::test]
    async fn blocked_users_leave_the_broadcast_audience() {
        let store = store();
        store.record(1, None).await.unwrap();
        store.record(2, None).await.unwrap();
        store.mark_blocked(1).await.unwrap();

        assert_eq!(store.broadcast_targets().await.unwrap(), vec![2]);
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.blocked(), 1);
    }
}
