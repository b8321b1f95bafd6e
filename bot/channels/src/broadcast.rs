//! `/broadcast`: send one message to every known user.
//!
//! Failures are counted, never fatal; a user who blocked the bot is flagged
//! so later broadcasts skip them. Progress is edited into the status
//! message every 25 sends.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::{ApiError, RequestError};
use tracing::{debug, info};

use filelink_core::{BotError, BotResult};

use crate::types::{ensure_admin, HandlerDeps};

const PROGRESS_EVERY: usize = 25;
const SEND_GAP: Duration = Duration::from_millis(50);

pub async fn handle_broadcast(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    user_id: i64,
    args: &str,
) -> BotResult<()> {
    ensure_admin(deps, user_id).await?;

    // Message text: the replied-to message wins, then the inline arguments.
    let text = msg
        .reply_to_message()
        .and_then(|reply| reply.text().or(reply.caption()))
        .map(str::to_string)
        .or_else(|| (!args.is_empty()).then(|| args.to_string()))
        .ok_or_else(|| {
            BotError::validation(
                "Please either:\n1. Reply to a message with /broadcast\n\
                 2. Use /broadcast with your message\n\nExample: /broadcast Hello everyone!",
            )
        })?;

    let targets = deps.users.broadcast_targets().await?;
    let total = targets.len();
    let status = bot
        .send_message(msg.chat.id, "Broadcasting message...")
        .await
        .map_err(anyhow::Error::from)?;

    let mut successful = 0usize;
    let mut failed = 0usize;
    for target in targets {
        match bot
            .send_message(ChatId(target), text.as_str())
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => successful += 1,
            Err(RequestError::Api(ApiError::BotBlocked)) => {
                failed += 1;
                let _ = deps.users.mark_blocked(target).await;
                debug!(user_id = target, "User blocked the bot, flagged");
            }
            Err(error) => {
                failed += 1;
                debug!(user_id = target, error = %error, "Broadcast send failed");
            }
        }

        if (successful + failed) % PROGRESS_EVERY == 0 {
            let _ = bot
                .edit_message_text(
                    msg.chat.id,
                    status.id,
                    format!(
                        "Broadcasting...\nProgress: {}/{total}\nSuccess: {successful}\nFailed: {failed}",
                        successful + failed
                    ),
                )
                .await;
        }
        tokio::time::sleep(SEND_GAP).await;
    }

    info!(total, successful, failed, "Broadcast finished");
    bot.edit_message_text(
        msg.chat.id,
        status.id,
        format!(
            "✅ Broadcast completed!\n\nTotal users: {total}\nSuccessful: {successful}\nFailed: {failed}"
        ),
    )
    .await
    .map_err(anyhow::Error::from)?;
    Ok(())
}
