//! Settings input: after an admin taps "change" in the settings menu, their
//! next text message is consumed as the new value.

use std::collections::HashMap;

use tokio::sync::Mutex;

/// Which value the settings menu is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsPrompt {
    AutoDeleteTime,
    PrefixName,
    SudoUsers,
    RemoveNames,
    ShortenerApiKey,
    ShortenerApiUrl,
}

#[derive(Default)]
pub struct SettingsInput {
    pending: Mutex<HashMap<i64, SettingsPrompt>>,
}

impl SettingsInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the prompt; a later prompt replaces an earlier one.
    pub async fn expect(&self, user_id: i64, prompt: SettingsPrompt) {
        self.pending.lock().await.insert(user_id, prompt);
    }

    /// Consume the pending prompt, if any.
    pub async fn take(&self, user_id: i64) -> Option<SettingsPrompt> {
        self.pending.lock().await.remove(&user_id)
    }
}
