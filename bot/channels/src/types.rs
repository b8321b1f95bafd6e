//! Handler plumbing: shared dependencies and the outcome reporter.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{MaybeInaccessibleMessage, MessageId};
use tracing::error;

use filelink_config::SettingsStore;
use filelink_core::{BotError, BotResult};
use filelink_scheduler::AutoDeleteScheduler;
use filelink_search::SearchCache;
use filelink_sessions::{BatchIntake, CaptionEditSessions, SettingsInput};
use filelink_storage::{LinkRegistry, UserStore};

use crate::delivery::DeliveryService;
use crate::shortener::ShortenerClient;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Environment-derived runtime identity.
#[derive(Debug, Clone)]
pub struct RuntimeEnv {
    /// The fixed admin identity from `ADMIN_ID`.
    pub admin_id: i64,
    /// Base URL share links are minted under (`WORKER_URL`).
    pub worker_url: String,
}

/// Everything a handler needs, injected through the dispatcher rather than
/// held as ambient state.
#[derive(Clone)]
pub struct HandlerDeps {
    pub registry: Arc<LinkRegistry>,
    pub users: Arc<UserStore>,
    pub settings: Arc<SettingsStore>,
    pub intake: Arc<BatchIntake>,
    pub caption_edit: Arc<CaptionEditSessions>,
    pub settings_input: Arc<SettingsInput>,
    pub search_cache: Arc<SearchCache>,
    pub scheduler: Arc<AutoDeleteScheduler>,
    pub delivery: Arc<DeliveryService>,
    pub shortener: Arc<ShortenerClient>,
    pub env: Arc<RuntimeEnv>,
}

pub const NO_PERMISSION: &str = "You don't have permission to use this command!";

const GENERIC_FAILURE: &str = "Sorry, something went wrong. Please try again.";

/// The chat and message a callback keyboard is attached to, when Telegram
/// still lets us see it.
pub fn callback_anchor(q: &CallbackQuery) -> Option<(ChatId, MessageId)> {
    match q.message.as_ref()? {
        MaybeInaccessibleMessage::Regular(msg) => Some((msg.chat.id, msg.id)),
        MaybeInaccessibleMessage::Inaccessible(msg) => Some((msg.chat.id, msg.message_id)),
    }
}

/// Admin gate: the fixed admin or any configured sudo user.
pub async fn ensure_admin(deps: &HandlerDeps, user_id: i64) -> BotResult<()> {
    if deps.settings.is_authorized(user_id, deps.env.admin_id).await {
        Ok(())
    } else {
        Err(BotError::Unauthorized)
    }
}

/// Convert a handler outcome into at most one user-facing message.
///
/// Validation and not-found errors carry corrective text; authorization
/// failures get one generic line that doesn't say which check failed;
/// anything else is logged server-side and apologized for.
pub async fn report_outcome(bot: &Bot, chat_id: ChatId, outcome: BotResult<()>) -> HandlerResult {
    let Err(err) = outcome else {
        return Ok(());
    };

    let text = match &err {
        BotError::Validation(msg) => format!("❌ {msg}"),
        BotError::NotFound(what) if what.starts_with("batch_") => "❌ Batch not found!".to_string(),
        BotError::NotFound(_) => "❌ File not found!".to_string(),
        BotError::Unauthorized => NO_PERMISSION.to_string(),
        BotError::EmptyBatch => "❌ A batch needs at least one file!".to_string(),
        other => {
            error!(error = %other, chat_id = chat_id.0, "Handler failed");
            GENERIC_FAILURE.to_string()
        }
    };
    if let Err(send_err) = bot.send_message(chat_id, text).await {
        error!(error = %send_err, chat_id = chat_id.0, "Could not report failure to user");
    }
    Ok(())
}
