//! `/bset`: the inline settings menu.
//!
//! Every button either flips a value in place, arms a value prompt (the
//! next text message becomes the new value), or resets a field to its
//! env-derived default. All of it is admin-gated.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use filelink_config::{BotConfig, Setting, SettingKey};
use filelink_core::{BotError, BotResult};
use filelink_sessions::SettingsPrompt;

use crate::types::{ensure_admin, report_outcome, HandlerDeps, HandlerResult, NO_PERMISSION};

pub async fn handle_bset(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user_id: i64,
) -> BotResult<()> {
    ensure_admin(deps, user_id).await?;
    let config = deps.settings.snapshot().await;
    bot.send_message(chat_id, menu_text(&config))
        .parse_mode(ParseMode::Html)
        .reply_markup(menu_markup())
        .await
        .map_err(anyhow::Error::from)?;
    Ok(())
}

pub async fn handle_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> HandlerResult {
    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    let user_id = q.from.id.0 as i64;

    if ensure_admin(&deps, user_id).await.is_err() {
        let _ = bot
            .answer_callback_query(q.id.clone())
            .text(NO_PERMISSION)
            .show_alert(true)
            .await;
        return Ok(());
    }

    let Some((chat_id, message_id)) = crate::types::callback_anchor(&q) else {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return Ok(());
    };
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let outcome = dispatch(&bot, chat_id, message_id, &deps, user_id, &data).await;
    report_outcome(&bot, chat_id, outcome).await
}

async fn dispatch(
    bot: &Bot,
    chat_id: ChatId,
    message_id: teloxide::types::MessageId,
    deps: &HandlerDeps,
    user_id: i64,
    data: &str,
) -> BotResult<()> {
    let edit = |text: String, markup: InlineKeyboardMarkup| {
        bot.edit_message_text(chat_id, message_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(markup)
    };

    match data {
        "bset_menu" => {
            let config = deps.settings.snapshot().await;
            edit(menu_text(&config), menu_markup())
                .await
                .map_err(anyhow::Error::from)?;
        }
        "bset_close" => {
            let _ = bot.delete_message(chat_id, message_id).await;
        }
        "bset_toggle_link" => {
            let enabled = !deps.settings.snapshot().await.link_enabled;
            deps.settings.set(Setting::LinkEnabled(enabled)).await?;
            let config = deps.settings.snapshot().await;
            edit(menu_text(&config), menu_markup())
                .await
                .map_err(anyhow::Error::from)?;
        }
        "bset_toggle_shortener" => {
            let mut shortener = deps.settings.snapshot().await.shortener;
            shortener.enabled = !shortener.enabled;
            deps.settings.set(Setting::Shortener(shortener)).await?;
            let config = deps.settings.snapshot().await;
            edit(view_text(&config, "shortener"), view_markup("shortener"))
                .await
                .map_err(anyhow::Error::from)?;
        }
        _ if data.starts_with("bset_view_") => {
            let key = &data["bset_view_".len()..];
            let config = deps.settings.snapshot().await;
            edit(view_text(&config, key), view_markup(key))
                .await
                .map_err(anyhow::Error::from)?;
        }
        _ if data.starts_with("bset_reset_") => {
            let key = &data["bset_reset_".len()..];
            let setting_key = match key {
                "autodelete" => SettingKey::AutoDeleteTime,
                "prefix" => SettingKey::PrefixName,
                "sudo" => SettingKey::SudoUsers,
                "removenames" => SettingKey::RemoveNames,
                "shortener" => SettingKey::Shortener,
                _ => return Ok(()),
            };
            deps.settings.reset(setting_key).await?;
            let config = deps.settings.snapshot().await;
            edit(
                format!("✅ Reset to default!\n\n{}", menu_text(&config)),
                menu_markup(),
            )
            .await
            .map_err(anyhow::Error::from)?;
        }
        _ if data.starts_with("bset_edit_") => {
            let key = &data["bset_edit_".len()..];
            let (prompt, hint) = match key {
                "autodelete" => (
                    SettingsPrompt::AutoDeleteTime,
                    "Send the auto-delete delay in minutes (0 disables).",
                ),
                "prefix" => (SettingsPrompt::PrefixName, "Send the new caption prefix."),
                "sudo" => (
                    SettingsPrompt::SudoUsers,
                    "Send the sudo user ids, comma-separated (replaces the current list).",
                ),
                "removenames" => (
                    SettingsPrompt::RemoveNames,
                    "Send the terms to remove from captions, comma-separated.",
                ),
                "shortkey" => (SettingsPrompt::ShortenerApiKey, "Send the shortener API key."),
                "shorturl" => (SettingsPrompt::ShortenerApiUrl, "Send the shortener API URL."),
                _ => return Ok(()),
            };
            deps.settings_input.expect(user_id, prompt).await;
            edit(format!("✏️ {hint}"), back_markup())
                .await
                .map_err(anyhow::Error::from)?;
        }
        _ => {}
    }
    Ok(())
}

/// Apply the text an admin sent after an edit prompt.
pub async fn apply_input(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    prompt: SettingsPrompt,
    text: &str,
) -> BotResult<()> {
    let text = text.trim();
    let setting = match prompt {
        SettingsPrompt::AutoDeleteTime => {
            let minutes: u32 = text
                .parse()
                .map_err(|_| BotError::validation("Please send a whole number of minutes."))?;
            Setting::AutoDeleteTime(minutes)
        }
        SettingsPrompt::PrefixName => Setting::PrefixName(text.to_string()),
        SettingsPrompt::SudoUsers => {
            let users = text
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::parse)
                .collect::<Result<Vec<i64>, _>>()
                .map_err(|_| {
                    BotError::validation("Please send numeric user ids, comma-separated.")
                })?;
            Setting::SudoUsers(users)
        }
        SettingsPrompt::RemoveNames => {
            let names = text
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect();
            Setting::RemoveNames(names)
        }
        SettingsPrompt::ShortenerApiKey => {
            let mut shortener = deps.settings.snapshot().await.shortener;
            shortener.api_key = text.to_string();
            Setting::Shortener(shortener)
        }
        SettingsPrompt::ShortenerApiUrl => {
            let mut shortener = deps.settings.snapshot().await.shortener;
            shortener.api_url = text.to_string();
            Setting::Shortener(shortener)
        }
    };
    deps.settings.set(setting).await?;
    bot.send_message(chat_id, "✅ Setting updated!")
        .await
        .map_err(anyhow::Error::from)?;
    Ok(())
}

fn menu_text(config: &BotConfig) -> String {
    format!(
        "🛠 <b>Bot Settings</b>\n\n\
         • <b>Auto Delete:</b> {}\n\
         • <b>Prefix:</b> {}\n\
         • <b>Sudo Users:</b> {}\n\
         • <b>Remove Names:</b> {}\n\
         • <b>Link Saving:</b> {}\n\
         • <b>Shortener:</b> {}",
        if config.auto_delete_time == 0 {
            "disabled".to_string()
        } else {
            format!("{} minutes", config.auto_delete_time)
        },
        if config.prefix_name.is_empty() {
            "Not set"
        } else {
            &config.prefix_name
        },
        config.sudo_users.len(),
        config.remove_names.len(),
        if config.link_enabled { "Enabled" } else { "Disabled" },
        if config.shortener.enabled {
            "Enabled"
        } else {
            "Disabled"
        },
    )
}

fn menu_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("⏱ Auto Delete", "bset_view_autodelete"),
            InlineKeyboardButton::callback("🏷 Prefix", "bset_view_prefix"),
        ],
        vec![
            InlineKeyboardButton::callback("👥 Sudo Users", "bset_view_sudo"),
            InlineKeyboardButton::callback("🧹 Remove Names", "bset_view_removenames"),
        ],
        vec![
            InlineKeyboardButton::callback("🔗 Shortener", "bset_view_shortener"),
            InlineKeyboardButton::callback("💾 Toggle Link Saving", "bset_toggle_link"),
        ],
        vec![InlineKeyboardButton::callback("❌ Close", "bset_close")],
    ])
}

fn view_text(config: &BotConfig, key: &str) -> String {
    match key {
        "autodelete" => format!(
            "⏱ <b>Auto Delete</b>\n\nCurrent: {} minutes (0 disables)",
            config.auto_delete_time
        ),
        "prefix" => format!(
            "🏷 <b>Prefix</b>\n\nCurrent: {}",
            if config.prefix_name.is_empty() {
                "Not set"
            } else {
                &config.prefix_name
            }
        ),
        "sudo" => format!(
            "👥 <b>Sudo Users</b>\n\nCurrent: {}",
            if config.sudo_users.is_empty() {
                "none".to_string()
            } else {
                config
                    .sudo_users
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        ),
        "removenames" => format!(
            "🧹 <b>Remove Names</b>\n\nCurrent: {}",
            if config.remove_names.is_empty() {
                "none".to_string()
            } else {
                config.remove_names.join(", ")
            }
        ),
        "shortener" => format!(
            "🔗 <b>Shortener</b>\n\nEnabled: {}\nAPI URL: {}\nAPI key: {}",
            config.shortener.enabled,
            config.shortener.api_url,
            if config.shortener.api_key.is_empty() {
                "not set"
            } else {
                "set"
            },
        ),
        _ => "Unknown setting".to_string(),
    }
}

fn view_markup(key: &str) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    match key {
        "shortener" => {
            rows.push(vec![
                InlineKeyboardButton::callback("🔁 Toggle", "bset_toggle_shortener"),
                InlineKeyboardButton::callback("🔑 API Key", "bset_edit_shortkey"),
                InlineKeyboardButton::callback("🌐 API URL", "bset_edit_shorturl"),
            ]);
            rows.push(vec![InlineKeyboardButton::callback(
                "🔄 Reset to Default",
                "bset_reset_shortener",
            )]);
        }
        other => {
            rows.push(vec![
                InlineKeyboardButton::callback("✏️ Change", format!("bset_edit_{other}")),
                InlineKeyboardButton::callback("🔄 Reset to Default", format!("bset_reset_{other}")),
            ]);
        }
    }
    rows.push(vec![InlineKeyboardButton::callback("⬅️ Back", "bset_menu")]);
    InlineKeyboardMarkup::new(rows)
}

fn back_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "⬅️ Back",
        "bset_menu",
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_text_reflects_the_configuration() {
        let config = BotConfig {
            auto_delete_time: 0,
            prefix_name: "@CinemazBD".into(),
            sudo_users: vec![1, 2],
            ..BotConfig::default()
        };
        let text = menu_text(&config);
        assert!(text.contains("disabled"));
        assert!(text.contains("@CinemazBD"));
        assert!(text.contains("<b>Sudo Users:</b> 2"));
    }
}
