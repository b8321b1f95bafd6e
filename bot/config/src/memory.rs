//! In-memory [`ConfigPersist`] for tests and ephemeral runs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::schema::BotConfig;
use crate::store::ConfigPersist;

#[derive(Default)]
pub struct MemoryPersist {
    document: Mutex<Option<serde_json::Value>>,
    field_writes: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MemoryPersist {
    pub async fn stored(&self) -> Option<BotConfig> {
        let document = self.document.lock().await;
        document
            .as_ref()
            .and_then(|doc| serde_json::from_value(doc.clone()).ok())
    }

    /// Every `(key, value)` handed to `store_field`, in call order.
    pub async fn field_writes(&self) -> Vec<(String, serde_json::Value)> {
        self.field_writes.lock().await.clone()
    }
}

#[async_trait]
impl ConfigPersist for MemoryPersist {
    async fn load(&self) -> Result<Option<BotConfig>> {
        let document = self.document.lock().await;
        match document.as_ref() {
            Some(doc) => Ok(Some(
                serde_json::from_value(doc.clone()).context("malformed config document")?,
            )),
            None => Ok(None),
        }
    }

    async fn store(&self, config: &BotConfig) -> Result<()> {
        let mut document = self.document.lock().await;
        *document = Some(serde_json::to_value(config)?);
        Ok(())
    }

    async fn store_field(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut document = self.document.lock().await;
        let doc = document.get_or_insert_with(|| serde_json::json!({}));
        if let Some(map) = doc.as_object_mut() {
            map.insert(key.to_string(), value.clone());
        }
        self.field_writes
            .lock()
            .await
            .push((key.to_string(), value));
        Ok(())
    }
}
