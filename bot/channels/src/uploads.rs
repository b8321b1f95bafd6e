//! Media and plain-text routing.
//!
//! A media message belongs, in precedence order, to the caption-edit flow,
//! then an open batch intake session, then the single-file upload path. A
//! plain text message belongs to the caption-edit caption step, then the
//! settings value prompt.

use teloxide::prelude::*;
use tracing::debug;

use filelink_core::{BotError, BotResult, LinkTarget};
use filelink_sessions::IntakeOutcome;

use crate::commands::minted_link;
use crate::media::incoming_file;
use crate::settings_menu;
use crate::types::{ensure_admin, report_outcome, HandlerDeps, HandlerResult};

pub async fn handle_media(bot: Bot, msg: Message, deps: HandlerDeps) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;

    let outcome = route_media(&bot, &msg, &deps, user_id).await;
    report_outcome(&bot, chat_id, outcome).await
}

async fn route_media(bot: &Bot, msg: &Message, deps: &HandlerDeps, user_id: i64) -> BotResult<()> {
    let Some(incoming) = incoming_file(msg) else {
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let config = deps.settings.snapshot().await;

    // Caption-edit flow: this file is the one whose caption changes next.
    if deps.caption_edit.is_awaiting_file(user_id).await {
        let file = incoming.into_batch_file(&config);
        let prompt = bot
            .send_message(
                chat_id,
                "✏️ Now send me the new caption for this file.\n\n\
                 ✏️ এখন এই ফাইলের জন্য নতুন ক্যাপশন পাঠান।",
            )
            .await
            .map_err(anyhow::Error::from)?;

        let timeout_bot = bot.clone();
        let prompt_id = prompt.id;
        deps.caption_edit
            .provide_file(user_id, file, async move {
                let _ = timeout_bot
                    .edit_message_text(
                        chat_id,
                        prompt_id,
                        "⌛ Caption change timed out. Send /setcaption to start again.\n\n\
                         ⌛ সময় শেষ। আবার শুরু করতে /setcaption পাঠান।",
                    )
                    .await;
            })
            .await;
        return Ok(());
    }

    // Batch intake.
    let file = incoming.clone().into_batch_file(&config);
    match deps.intake.receive_file(user_id, file).await {
        IntakeOutcome::Progress {
            received,
            requested,
        } => {
            bot.send_message(
                chat_id,
                format!(
                    "File {received} of {requested} received.\nSend {} more files.",
                    requested - received
                ),
            )
            .await
            .map_err(anyhow::Error::from)?;
            return Ok(());
        }
        IntakeOutcome::Complete {
            files,
            target_batch_code,
        } => {
            let added = files.len();
            match target_batch_code {
                Some(code) => {
                    let total = deps.registry.append_to_batch(&code, files).await?;
                    let link = minted_link(deps, &LinkTarget::Batch(code)).await;
                    bot.send_message(
                        chat_id,
                        format!(
                            "✅ Batch updated successfully!\n\n\
                             Added {added} new file(s)\nTotal files in batch: {total}\nBatch link: {link}"
                        ),
                    )
                    .await
                    .map_err(anyhow::Error::from)?;
                }
                None => {
                    let batch = deps.registry.create_batch(files, user_id).await?;
                    let link = minted_link(deps, &LinkTarget::Batch(batch.code)).await;
                    bot.send_message(
                        chat_id,
                        format!("Batch complete!\nHere's your batch shareable link:\n{link}"),
                    )
                    .await
                    .map_err(anyhow::Error::from)?;
                }
            }
            return Ok(());
        }
        IntakeOutcome::NotCollecting => {}
    }

    // Single-file upload, authorized users only.
    if ensure_admin(deps, user_id).await.is_err() {
        bot.send_message(chat_id, "You don't have permission to use this feature!")
            .await
            .map_err(anyhow::Error::from)?;
        return Ok(());
    }

    let display = incoming.display_name.clone();
    let stored = deps
        .registry
        .create_single(incoming.into_new_file(user_id, &config))
        .await?;
    let link = minted_link(deps, &LinkTarget::Single(stored.code.clone())).await;
    let label = stored
        .caption
        .clone()
        .or(display)
        .unwrap_or_else(|| "No Name".to_string());
    bot.send_message(
        chat_id,
        format!("Here's your permanent shareable link:\n{link}\n\nFile: {label}"),
    )
    .await
    .map_err(anyhow::Error::from)?;
    Ok(())
}

pub async fn handle_text(bot: Bot, msg: Message, deps: HandlerDeps) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let outcome = route_text(&bot, chat_id, &deps, user_id, text).await;
    report_outcome(&bot, chat_id, outcome).await
}

async fn route_text(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user_id: i64,
    text: &str,
) -> BotResult<()> {
    // Caption-edit completion. If the expiry timer already won the race,
    // take_pending is empty and the text falls through like any other.
    if let Some(file) = deps.caption_edit.take_pending(user_id).await {
        let new_caption = text.trim();
        deps.registry
            .set_caption(&file.file_ref, Some(new_caption))
            .await?;

        let preview = format!("<b>{new_caption}</b>");
        let send = deps
            .delivery
            .transport()
            .send_media(chat_id.0, &file, &preview)
            .await;
        match send {
            Ok(_) => {
                bot.send_message(
                    chat_id,
                    "✅ Caption updated successfully!\n\n✅ ক্যাপশন সফলভাবে আপডেট করা হয়েছে!",
                )
                .await
                .map_err(anyhow::Error::from)?;
            }
            Err(error) => {
                debug!(error = %error, "Preview send failed after caption update");
                bot.send_message(
                    chat_id,
                    "❌ Failed to send file with new caption.\n\n\
                     ❌ নতুন ক্যাপশন সহ ফাইল পাঠানো যায়নি।",
                )
                .await
                .map_err(anyhow::Error::from)?;
            }
        }
        return Ok(());
    }

    // Settings value prompt.
    if let Some(prompt) = deps.settings_input.take(user_id).await {
        if ensure_admin(deps, user_id).await.is_err() {
            return Err(BotError::Unauthorized);
        }
        settings_menu::apply_input(bot, chat_id, deps, prompt, text).await?;
        return Ok(());
    }

    Ok(())
}
