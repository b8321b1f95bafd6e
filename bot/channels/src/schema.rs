//! The dispatcher handler tree.
//!
//! Commands first; media messages next (caption edit → batch intake →
//! single upload precedence lives inside the media router); plain
//! non-command text last (caption step, settings value prompt). Callback
//! queries split on their data prefix.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::commands::{handle_command, Command};
use crate::media::incoming_file;
use crate::types::{HandlerDeps, HandlerResult};
use crate::{find, settings_menu, uploads};

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let message_branch = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| incoming_file(&msg).is_some())
                .endpoint(uploads::handle_media),
        )
        .branch(
            dptree::filter(|msg: Message| {
                msg.text().is_some_and(|text| !text.starts_with('/'))
            })
            .endpoint(uploads::handle_text),
        );

    let callback_branch = Update::filter_callback_query().endpoint(route_callback);

    dptree::entry()
        .branch(message_branch)
        .branch(callback_branch)
}

async fn route_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> HandlerResult {
    match q.data.as_deref() {
        Some(data) if data.starts_with("find_") => find::handle_callback(bot, q, deps).await,
        Some(data) if data.starts_with("bset_") => {
            settings_menu::handle_callback(bot, q, deps).await
        }
        _ => {
            let _ = bot.answer_callback_query(q.id.clone()).await;
            Ok(())
        }
    }
}
