//! Telegram adapter.
//!
//! Everything that touches the transport lives here: the command tree and
//! its handlers, the single media send dispatch point, redelivery, the
//! broadcast loop, the settings and search keyboards, and the outbound
//! shortener/direct-link clients. Handlers never let an error escape: the
//! outcome reporter turns the error taxonomy into user-facing text and logs
//! the rest.

pub mod broadcast;
pub mod commands;
pub mod delivery;
pub mod direct_link;
pub mod find;
pub mod media;
pub mod restart;
pub mod schema;
pub mod settings_menu;
pub mod shortener;
pub mod transport;
pub mod types;
pub mod uploads;

pub use delivery::DeliveryService;
pub use schema::schema;
pub use shortener::ShortenerClient;
pub use transport::{MediaTransport, TelegramTransport};
pub use types::{HandlerDeps, HandlerResult, RuntimeEnv};
