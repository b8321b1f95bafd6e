//! Auto-deletion of delivered messages.
//!
//! The configured delay is read once per delivery, at scheduling time: a
//! settings change applies to the next delivery, never retroactively to
//! messages already in flight. Each message gets its own detached task; a
//! deletion that fails (say the user already removed the message) is logged
//! and forgotten, and never touches its siblings.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use filelink_config::SettingsStore;
use filelink_core::MessageHandle;

/// Transport seam for removing a delivered message.
#[async_trait]
pub trait MessageDeleter: Send + Sync + 'static {
    async fn delete(&self, message: &MessageHandle) -> anyhow::Result<()>;
}

pub struct AutoDeleteScheduler {
    settings: Arc<SettingsStore>,
    deleter: Arc<dyn MessageDeleter>,
}

impl AutoDeleteScheduler {
    pub fn new(settings: Arc<SettingsStore>, deleter: Arc<dyn MessageDeleter>) -> Self {
        Self { settings, deleter }
    }

    /// Schedule every handle for deletion after the currently configured
    /// delay. A delay of zero schedules nothing at all.
    pub async fn schedule_deletion(&self, messages: Vec<MessageHandle>) {
        let minutes = self.settings.snapshot().await.auto_delete_time;
        if minutes == 0 {
            debug!(
                messages = messages.len(),
                "Auto-delete disabled, keeping messages"
            );
            return;
        }

        let delay = Duration::from_secs(u64::from(minutes) * 60);
        for message in messages {
            let deleter = Arc::clone(&self.deleter);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(error) = deleter.delete(&message).await {
                    debug!(
                        chat_id = message.chat_id,
                        message_id = message.message_id,
                        error = %error,
                        "Scheduled deletion failed, ignoring"
                    );
                }
            });
        }
    }
}
