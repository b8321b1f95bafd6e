use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::schema::{BotConfig, Setting, SettingKey};

/// Persistence seam for the configuration document. Implemented by the
/// storage layer; [`crate::MemoryPersist`] covers tests and ephemeral runs.
#[async_trait]
pub trait ConfigPersist: Send + Sync {
    /// Load the document, `None` on first run.
    async fn load(&self) -> Result<Option<BotConfig>>;

    /// Write the whole document (first-run initialization).
    async fn store(&self, config: &BotConfig) -> Result<()>;

    /// Write a single changed field.
    async fn store_field(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Process-wide settings singleton.
///
/// Handlers take cheap snapshots; every mutation updates the in-memory copy
/// and persists just the changed field. Last write wins; settings changes
/// are rare administrative actions.
pub struct SettingsStore {
    current: RwLock<BotConfig>,
    persist: Arc<dyn ConfigPersist>,
}

impl SettingsStore {
    /// Load the persisted document, or initialize it from env-derived
    /// defaults when absent.
    pub async fn load_or_init(persist: Arc<dyn ConfigPersist>) -> Result<Arc<Self>> {
        let config = match persist.load().await? {
            Some(config) => {
                info!("Loaded bot configuration");
                config
            }
            None => {
                let config = BotConfig::from_env();
                persist.store(&config).await?;
                info!("Initialized bot configuration from defaults");
                config
            }
        };
        Ok(Arc::new(Self {
            current: RwLock::new(config),
            persist,
        }))
    }

    /// Build a store around an already-known config (tests, tooling).
    pub fn with_config(config: BotConfig, persist: Arc<dyn ConfigPersist>) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(config),
            persist,
        })
    }

    pub async fn snapshot(&self) -> BotConfig {
        self.current.read().await.clone()
    }

    /// Apply one typed update: in-memory first, then the single field on disk.
    pub async fn set(&self, setting: Setting) -> Result<()> {
        let key = setting.key();
        {
            let mut current = self.current.write().await;
            setting.apply(&mut current);
        }
        self.persist
            .store_field(key.as_str(), setting.value_json())
            .await?;
        debug!(key = key.as_str(), "Setting updated");
        Ok(())
    }

    /// Restore one field to its (env-derived) default.
    pub async fn reset(&self, key: SettingKey) -> Result<()> {
        self.set(Setting::default_for(key)).await
    }

    /// Admin check: the fixed admin identity or any configured sudo user.
    pub async fn is_authorized(&self, user_id: i64, admin_id: i64) -> bool {
        if user_id == admin_id {
            return true;
        }
        self.current.read().await.sudo_users.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPersist;
    use crate::schema::ShortenerConfig;

    #[tokio::test]
    async fn first_run_persists_defaults() {
        let persist = Arc::new(MemoryPersist::default());
        let store = SettingsStore::load_or_init(persist.clone()).await.unwrap();
        assert!(persist.stored().await.is_some());
        assert_eq!(store.snapshot().await.link_enabled, true);
    }

    #[tokio::test]
    async fn second_load_reuses_the_stored_document() {
        let persist = Arc::new(MemoryPersist::default());
        let store = SettingsStore::load_or_init(persist.clone()).await.unwrap();
        store
            .set(Setting::PrefixName("@CinemazBD".into()))
            .await
            .unwrap();

        let reloaded = SettingsStore::load_or_init(persist).await.unwrap();
        assert_eq!(reloaded.snapshot().await.prefix_name, "@CinemazBD");
    }

    #[tokio::test]
    async fn set_updates_memory_and_persists_one_field() {
        let persist = Arc::new(MemoryPersist::default());
        let store = SettingsStore::load_or_init(persist.clone()).await.unwrap();

        store.set(Setting::AutoDeleteTime(5)).await.unwrap();

        assert_eq!(store.snapshot().await.auto_delete_time, 5);
        let writes = persist.field_writes().await;
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "auto_delete_time");
        assert_eq!(writes[0].1, serde_json::json!(5));
    }

    #[tokio::test]
    async fn reset_restores_the_default_value() {
        let persist = Arc::new(MemoryPersist::default());
        let store = SettingsStore::load_or_init(persist).await.unwrap();

        store
            .set(Setting::Shortener(ShortenerConfig {
                enabled: true,
                api_key: "k".into(),
                api_url: "https://sho.rt/api".into(),
            }))
            .await
            .unwrap();
        store.reset(SettingKey::Shortener).await.unwrap();

        assert_eq!(store.snapshot().await.shortener, ShortenerConfig::default());
    }

    #[tokio::test]
    async fn sudo_users_pass_the_authorization_check() {
        let persist = Arc::new(MemoryPersist::default());
        let store = SettingsStore::load_or_init(persist).await.unwrap();
        store.set(Setting::SudoUsers(vec![777])).await.unwrap();

        assert!(store.is_authorized(1, 1).await); // admin
        assert!(store.is_authorized(777, 1).await); // sudo
        assert!(!store.is_authorized(778, 1).await);
    }
}
