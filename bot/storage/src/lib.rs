//! SQLite-backed persistence.
//!
//! One table per collection (`files`, `batches`, `users`, `bot_config`);
//! batch contents and the configuration document are JSON text columns.
//! Every write the registry performs is a single-row statement.

pub mod config_doc;
pub mod db;
pub mod registry;
pub mod users;

pub use config_doc::ConfigDoc;
pub use db::Database;
pub use registry::{LinkRegistry, PurgeScope, Resolved};
pub use users::{UserStats, UserStore};
