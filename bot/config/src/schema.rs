//! Configuration document schema and typed setting updates.

use serde::{Deserialize, Serialize};

/// Default auto-delete delay in minutes when no env override is present.
pub const DEFAULT_AUTO_DELETE_MINUTES: u32 = 30;

/// Default shortener endpoint placeholder.
pub const DEFAULT_SHORTENER_API_URL: &str = "https://example.com/api";

/// The persisted configuration document (singleton, id `bot_config`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Minutes before delivered messages are deleted; 0 disables deletion.
    #[serde(default = "default_auto_delete_time")]
    pub auto_delete_time: u32,

    /// Text prepended to every delivered caption.
    #[serde(default)]
    pub prefix_name: String,

    /// Users granted admin-equivalent privileges.
    #[serde(default)]
    pub sudo_users: Vec<i64>,

    /// Terms excised from captions at save and delivery time.
    #[serde(default)]
    pub remove_names: Vec<String>,

    /// When false, URLs are stripped from captions before saving.
    #[serde(default = "default_link_enabled")]
    pub link_enabled: bool,

    #[serde(default)]
    pub shortener: ShortenerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortenerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_shortener_api_url")]
    pub api_url: String,
}

fn default_auto_delete_time() -> u32 {
    DEFAULT_AUTO_DELETE_MINUTES
}

fn default_link_enabled() -> bool {
    true
}

fn default_shortener_api_url() -> String {
    DEFAULT_SHORTENER_API_URL.to_string()
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            api_url: default_shortener_api_url(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            auto_delete_time: default_auto_delete_time(),
            prefix_name: String::new(),
            sudo_users: Vec::new(),
            remove_names: Vec::new(),
            link_enabled: default_link_enabled(),
            shortener: ShortenerConfig::default(),
        }
    }
}

impl BotConfig {
    /// First-run defaults, seeded from `AUTO_DELETE_TIME` and `PREFIX_NAME`
    /// when those env vars are set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("AUTO_DELETE_TIME") {
            if let Ok(minutes) = raw.trim().parse() {
                config.auto_delete_time = minutes;
            }
        }
        if let Ok(prefix) = std::env::var("PREFIX_NAME") {
            config.prefix_name = prefix;
        }
        config
    }
}

/// Identifies one persisted field of [`BotConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    AutoDeleteTime,
    PrefixName,
    SudoUsers,
    RemoveNames,
    LinkEnabled,
    Shortener,
}

impl SettingKey {
    /// The document key the field is persisted under.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::AutoDeleteTime => "auto_delete_time",
            SettingKey::PrefixName => "prefix_name",
            SettingKey::SudoUsers => "sudo_users",
            SettingKey::RemoveNames => "remove_names",
            SettingKey::LinkEnabled => "link_enabled",
            SettingKey::Shortener => "shortener",
        }
    }
}

/// A typed single-field update.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    AutoDeleteTime(u32),
    PrefixName(String),
    SudoUsers(Vec<i64>),
    RemoveNames(Vec<String>),
    LinkEnabled(bool),
    Shortener(ShortenerConfig),
}

impl Setting {
    pub fn key(&self) -> SettingKey {
        match self {
            Setting::AutoDeleteTime(_) => SettingKey::AutoDeleteTime,
            Setting::PrefixName(_) => SettingKey::PrefixName,
            Setting::SudoUsers(_) => SettingKey::SudoUsers,
            Setting::RemoveNames(_) => SettingKey::RemoveNames,
            Setting::LinkEnabled(_) => SettingKey::LinkEnabled,
            Setting::Shortener(_) => SettingKey::Shortener,
        }
    }

    pub(crate) fn apply(&self, config: &mut BotConfig) {
        match self {
            Setting::AutoDeleteTime(minutes) => config.auto_delete_time = *minutes,
            Setting::PrefixName(prefix) => config.prefix_name = prefix.clone(),
            Setting::SudoUsers(users) => config.sudo_users = users.clone(),
            Setting::RemoveNames(names) => config.remove_names = names.clone(),
            Setting::LinkEnabled(enabled) => config.link_enabled = *enabled,
            Setting::Shortener(shortener) => config.shortener = shortener.clone(),
        }
    }

    pub(crate) fn value_json(&self) -> serde_json::Value {
        match self {
            Setting::AutoDeleteTime(minutes) => serde_json::json!(minutes),
            Setting::PrefixName(prefix) => serde_json::json!(prefix),
            Setting::SudoUsers(users) => serde_json::json!(users),
            Setting::RemoveNames(names) => serde_json::json!(names),
            Setting::LinkEnabled(enabled) => serde_json::json!(enabled),
            Setting::Shortener(shortener) => {
                serde_json::to_value(shortener).unwrap_or(serde_json::Value::Null)
            }
        }
    }

    /// The default value for a key, as used by reset-to-default. Defaults are
    /// env-derived, matching first-run initialization.
    pub fn default_for(key: SettingKey) -> Setting {
        let defaults = BotConfig::from_env();
        match key {
            SettingKey::AutoDeleteTime => Setting::AutoDeleteTime(defaults.auto_delete_time),
            SettingKey::PrefixName => Setting::PrefixName(defaults.prefix_name),
            SettingKey::SudoUsers => Setting::SudoUsers(defaults.sudo_users),
            SettingKey::RemoveNames => Setting::RemoveNames(defaults.remove_names),
            SettingKey::LinkEnabled => Setting::LinkEnabled(defaults.link_enabled),
            SettingKey::Shortener => Setting::Shortener(defaults.shortener),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let config: BotConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BotConfig::default());
        assert_eq!(config.auto_delete_time, DEFAULT_AUTO_DELETE_MINUTES);
        assert!(config.link_enabled);
        assert!(!config.shortener.enabled);
    }

    #[test]
    fn document_keys_match_the_persisted_names() {
        let json = serde_json::to_value(BotConfig::default()).unwrap();
        for key in [
            SettingKey::AutoDeleteTime,
            SettingKey::PrefixName,
            SettingKey::SudoUsers,
            SettingKey::RemoveNames,
            SettingKey::LinkEnabled,
            SettingKey::Shortener,
        ] {
            assert!(json.get(key.as_str()).is_some(), "missing {}", key.as_str());
        }
    }

    #[test]
    fn apply_touches_only_its_field() {
        let mut config = BotConfig::default();
        Setting::PrefixName("@CinemazBD".into()).apply(&mut config);
        assert_eq!(config.prefix_name, "@CinemazBD");
        assert_eq!(config.auto_delete_time, DEFAULT_AUTO_DELETE_MINUTES);
    }
}
