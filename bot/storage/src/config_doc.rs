//! The `bot_config` collection: a single JSON document, updated one field
//! at a time the way the settings store asks for it.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use filelink_config::{BotConfig, ConfigPersist};

use crate::db::Database;

const CONFIG_DOC_ID: &str = "bot_config";

pub struct ConfigDoc {
    db: Arc<Database>,
}

impl ConfigDoc {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConfigPersist for ConfigDoc {
    async fn load(&self) -> Result<Option<BotConfig>> {
        let conn = self.db.conn.lock().await;
        let raw: Option<String> = conn
            .query_row(
                "SELECT doc FROM bot_config WHERE id = ?1",
                params![CONFIG_DOC_ID],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read config document")?;
        match raw {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).context("Malformed config document")?,
            )),
            None => Ok(None),
        }
    }

    async fn store(&self, config: &BotConfig) -> Result<()> {
        let conn = self.db.conn.lock().await;
        let doc = serde_json::to_string(config)?;
        conn.execute(
            "INSERT OR REPLACE INTO bot_config (id, doc) VALUES (?1, ?2)",
            params![CONFIG_DOC_ID, doc],
        )
        .context("Failed to write config document")?;
        Ok(())
    }

    async fn store_field(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let conn = self.db.conn.lock().await;
        let raw: Option<String> = conn
            .query_row(
                "SELECT doc FROM bot_config WHERE id = ?1",
                params![CONFIG_DOC_ID],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read config document")?;

        let mut doc: serde_json::Value = match raw {
            Some(raw) => serde_json::from_str(&raw).context("Malformed config document")?,
            None => serde_json::json!({}),
        };
        if let Some(map) = doc.as_object_mut() {
            map.insert(key.to_string(), value);
        }
        conn.execute(
            "INSERT OR REPLACE INTO bot_config (id, doc) VALUES (?1, ?2)",
            params![CONFIG_DOC_ID, doc.to_string()],
        )
        .context("Failed to update config document")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filelink_config::{Setting, SettingsStore};

    #[tokio::test]
    async fn settings_survive_a_store_reload() {
        let db = Arc::new(Database::in_memory().unwrap());
        let persist = Arc::new(ConfigDoc::new(db.clone()));

        let store = SettingsStore::load_or_init(persist.clone()).await.unwrap();
        store
            .set(Setting::RemoveNames(vec!["mkvcinemas".into()]))
            .await
            .unwrap();

        let reloaded = SettingsStore::load_or_init(persist).await.unwrap();
        assert_eq!(
            reloaded.snapshot().await.remove_names,
            vec!["mkvcinemas".to_string()]
        );
    }

    #[tokio::test]
    async fn store_field_updates_only_the_named_key() {
        let db = Arc::new(Database::in_memory().unwrap());
        let persist = ConfigDoc::new(db);
        let mut config = BotConfig::default();
        config.prefix_name = "@CinemazBD".to_string();
        persist.store(&config).await.unwrap();

        persist
            .store_field("auto_delete_time", serde_json::json!(5))
            .await
            .unwrap();

        let loaded = persist.load().await.unwrap().unwrap();
        assert_eq!(loaded.auto_delete_time, 5);
        assert_eq!(loaded.prefix_name, "@CinemazBD");
    }
}
