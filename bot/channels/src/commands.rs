//! Slash commands.

use once_cell::sync::Lazy;
use regex::Regex;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::info;

use filelink_core::{parse_link, share_link, BotError, BotResult, LinkTarget};
use filelink_storage::PurgeScope;

use crate::broadcast;
use crate::direct_link;
use crate::find;
use crate::restart;
use crate::settings_menu;
use crate::types::{ensure_admin, report_outcome, HandlerDeps, HandlerResult};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "File sharing bot commands:")]
pub enum Command {
    #[command(description = "start, or open a share link")]
    Start(String),
    #[command(description = "collect files into a batch: /batch <count> or /batch <link> <count>")]
    Batch(String),
    #[command(description = "change a stored file's caption")]
    Setcaption,
    #[command(description = "prefix every caption in a batch: /bsetcaption <link> -add <text>")]
    Bsetcaption(String),
    #[command(description = "delete a shared file or batch")]
    Del(String),
    #[command(description = "wipe the registry: /purge <all|singles|batches>")]
    Purge(String),
    #[command(description = "fuzzy-search stored files")]
    Find(String),
    #[command(description = "user statistics")]
    Users,
    #[command(description = "broadcast a message to every user")]
    Broadcast(String),
    #[command(description = "bot settings")]
    Bset,
    #[command(description = "build a direct link from a Drive link")]
    Gdirect(String),
    #[command(description = "restart the bot")]
    Restart,
}

const WELCOME: &str = "👋 Welcome!\n\n\
    📤 Send me any file and I'll give you a permanent shareable link.\n\n\
    🌐 আপনাকে স্বাগতম! আমাকে যেকোনো ফাইল পাঠান এবং আমি আপনাকে একটি শেয়ারযোগ্য লিঙ্ক দেব।\n\n\
    🔗 Enjoy sharing your files easily!";

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    deps: HandlerDeps,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;

    let outcome = match cmd {
        Command::Start(payload) => start(&bot, &msg, &deps, payload.trim()).await,
        Command::Batch(args) => batch(&bot, chat_id, &deps, user_id, args.trim()).await,
        Command::Setcaption => setcaption(&bot, chat_id, &deps, user_id).await,
        Command::Bsetcaption(args) => bsetcaption(&bot, chat_id, &deps, user_id, args.trim()).await,
        Command::Del(args) => del(&bot, chat_id, &deps, user_id, args.trim()).await,
        Command::Purge(args) => purge(&bot, chat_id, &deps, user_id, args.trim()).await,
        Command::Find(query) => find::handle_find(&bot, &msg, &deps, query.trim()).await,
        Command::Users => users(&bot, chat_id, &deps, user_id).await,
        Command::Broadcast(args) => {
            broadcast::handle_broadcast(&bot, &msg, &deps, user_id, args.trim()).await
        }
        Command::Bset => settings_menu::handle_bset(&bot, chat_id, &deps, user_id).await,
        Command::Gdirect(args) => gdirect(&bot, chat_id, &deps, user_id, args.trim()).await,
        Command::Restart => restart_cmd(&bot, chat_id, &deps, user_id).await,
    };
    report_outcome(&bot, chat_id, outcome).await
}

async fn start(bot: &Bot, msg: &Message, deps: &HandlerDeps, payload: &str) -> BotResult<()> {
    if let Some(user) = msg.from() {
        deps.users
            .record(user.id.0 as i64, user.username.as_deref())
            .await?;
    }

    if payload.is_empty() {
        bot.send_message(msg.chat.id, WELCOME)
            .await
            .map_err(anyhow::Error::from)?;
        return Ok(());
    }

    let target = parse_link(payload)
        .ok_or_else(|| BotError::validation("That doesn't look like a share link."))?;
    deps.delivery.deliver(&target, msg.chat.id.0).await?;
    Ok(())
}

async fn batch(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user_id: i64,
    args: &str,
) -> BotResult<()> {
    ensure_admin(deps, user_id).await?;

    let parts: Vec<&str> = args.split_whitespace().collect();
    match parts.as_slice() {
        [] => Err(BotError::validation(
            "Please specify how many files you want to batch.\nExample: /batch 4",
        )),
        [count] => {
            let count: usize = count.parse().map_err(|_| {
                BotError::validation("Please provide a valid number.\nExample: /batch 4")
            })?;
            deps.intake.start(user_id, count, None).await?;
            bot.send_message(
                chat_id,
                format!("Please send {count} files one by one.\nFiles received: 0/{count}"),
            )
            .await
            .map_err(anyhow::Error::from)?;
            Ok(())
        }
        [link, count] => {
            let count: usize = count.parse().map_err(|_| {
                BotError::validation("Please provide a valid number of files to add.")
            })?;
            let code = parse_link(link)
                .map(|target| target.code().to_string())
                .ok_or_else(|| {
                    BotError::validation(
                        "Invalid batch link format!\nAccepted: a batch link, batch_<code>, or the bare code.",
                    )
                })?;
            // Confirm the code really is a batch before collecting anything.
            deps.registry
                .resolve(&LinkTarget::Batch(code.clone()))
                .await?;
            deps.intake.start(user_id, count, Some(code)).await?;
            bot.send_message(
                chat_id,
                format!(
                    "✅ Ready to update batch!\n\nPlease send {count} file{} to add.\nProgress: 0/{count} files added",
                    if count == 1 { "" } else { "s" }
                ),
            )
            .await
            .map_err(anyhow::Error::from)?;
            Ok(())
        }
        _ => Err(BotError::validation(
            "Usage:\n/batch <count>\n/batch <batch-link> <count>",
        )),
    }
}

async fn setcaption(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, user_id: i64) -> BotResult<()> {
    ensure_admin(deps, user_id).await?;
    deps.caption_edit.begin(user_id).await;
    bot.send_message(
        chat_id,
        "📤 Send me the file you want to change the caption of.\n\n\
         📤 যে ফাইলের ক্যাপশন পরিবর্তন করতে চান সেই ফাইলটি পাঠান।",
    )
    .await
    .map_err(anyhow::Error::from)?;
    Ok(())
}

static BSETCAPTION_ARGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\S+)\s+-add\s+(.+)$").unwrap());

async fn bsetcaption(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user_id: i64,
    args: &str,
) -> BotResult<()> {
    ensure_admin(deps, user_id).await?;

    let usage = || {
        BotError::validation(
            "Correct format:\n/bsetcaption <batch_link> -add <prefix_text>\n\n\
             Example:\n/bsetcaption https://example.com/batch_12ab34cd -add Drama Name S01",
        )
    };
    let caps = BSETCAPTION_ARGS.captures(args).ok_or_else(usage)?;
    let link = caps.get(1).map(|m| m.as_str()).ok_or_else(usage)?;
    let prefix = caps.get(2).map(|m| m.as_str().trim()).ok_or_else(usage)?;

    let Some(LinkTarget::Batch(code)) = parse_link(link) else {
        return Err(usage());
    };

    let updated = deps.registry.prefix_batch_captions(&code, prefix).await?;
    bot.send_message(
        chat_id,
        format!(
            "✅ Successfully updated captions for {updated} files!\n\n\
             Added prefix: {prefix}\nBatch code: {code}"
        ),
    )
    .await
    .map_err(anyhow::Error::from)?;
    Ok(())
}

async fn del(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user_id: i64,
    args: &str,
) -> BotResult<()> {
    ensure_admin(deps, user_id).await?;

    if args.is_empty() {
        return Err(BotError::validation(
            "Please provide a link to delete.\n\nExample:\n/del https://t.me/botname?start=12ab34cd",
        ));
    }
    let target = parse_link(args).ok_or_else(|| BotError::validation("Invalid link format!"))?;

    if deps.registry.delete(&target).await? {
        let text = if target.is_batch() {
            "✅ Batch and all its files deleted successfully!"
        } else {
            "✅ File deleted successfully!"
        };
        bot.send_message(chat_id, text)
            .await
            .map_err(anyhow::Error::from)?;
        Ok(())
    } else {
        Err(BotError::NotFound(target.payload()))
    }
}

async fn purge(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user_id: i64,
    args: &str,
) -> BotResult<()> {
    ensure_admin(deps, user_id).await?;

    let scope = match args {
        "all" => PurgeScope::All,
        "singles" => PurgeScope::Singles,
        "batches" => PurgeScope::Batches,
        _ => {
            return Err(BotError::validation(
                "This wipes the registry and cannot be undone.\nUsage: /purge <all|singles|batches>",
            ))
        }
    };
    let removed = deps.registry.purge(scope).await?;
    info!(user_id, ?scope, removed, "Registry purged");
    bot.send_message(chat_id, format!("🗑 Purged {removed} entries."))
        .await
        .map_err(anyhow::Error::from)?;
    Ok(())
}

async fn users(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, user_id: i64) -> BotResult<()> {
    ensure_admin(deps, user_id).await?;

    let stats = deps.users.stats().await?;
    bot.send_message(
        chat_id,
        format!(
            "📊 <b>Bot Statistics</b>\n\nTotal Users: {}\nActive Users: {}\nBlocked Users: {}",
            stats.total,
            stats.active,
            stats.blocked()
        ),
    )
    .parse_mode(teloxide::types::ParseMode::Html)
    .await
    .map_err(anyhow::Error::from)?;
    Ok(())
}

async fn gdirect(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user_id: i64,
    args: &str,
) -> BotResult<()> {
    ensure_admin(deps, user_id).await?;

    if args.is_empty() {
        return Err(BotError::validation("Please provide a Google Drive link."));
    }
    let file_id = direct_link::drive_file_id(args)
        .ok_or_else(|| BotError::validation("Invalid Google Drive link."))?;
    let link = direct_link::build_direct_link(
        &deps.env.worker_url,
        file_id,
        chrono::Utc::now().timestamp_millis(),
    );
    bot.send_message(
        chat_id,
        format!("✅ Here is your direct link (valid for 6 hours):\n{link}"),
    )
    .await
    .map_err(anyhow::Error::from)?;
    Ok(())
}

async fn restart_cmd(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, user_id: i64) -> BotResult<()> {
    ensure_admin(deps, user_id).await?;
    bot.send_message(chat_id, "Restarting the bot...")
        .await
        .map_err(anyhow::Error::from)?;
    restart::reexec()?;
    Ok(())
}

/// Build the outbound share link for a freshly created target, shortened
/// when the shortener is enabled.
pub async fn minted_link(deps: &HandlerDeps, target: &LinkTarget) -> String {
    let long = share_link(&deps.env.worker_url, target);
    let config = deps.settings.snapshot().await;
    deps.shortener.shorten(&config.shortener, &long).await
}
