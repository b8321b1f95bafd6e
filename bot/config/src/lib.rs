//! Persisted bot configuration.
//!
//! One singleton document holds every tunable: auto-delete delay, caption
//! prefix, sudo users, caption removal terms, link saving, and the URL
//! shortener credentials. The [`SettingsStore`] keeps an in-memory copy that
//! handlers snapshot, and pushes every change back through a [`ConfigPersist`]
//! implementation one field at a time.

pub mod memory;
pub mod schema;
pub mod store;

pub use memory::MemoryPersist;
pub use schema::{BotConfig, Setting, SettingKey, ShortenerConfig};
pub use store::{ConfigPersist, SettingsStore};
