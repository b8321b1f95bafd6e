//! `/find`: fuzzy search with paged inline-keyboard results.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tracing::debug;

use filelink_core::{share_link, BotError, BotResult, LinkTarget};
use filelink_search::{search, Page, PageItem, SearchState, ViewFilter};

use crate::types::{HandlerDeps, HandlerResult};

pub async fn handle_find(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    query: &str,
) -> BotResult<()> {
    if query.is_empty() {
        return Err(BotError::validation(
            "Please provide what to search!\n\nExample:\n/find avengers\n/find spider man",
        ));
    }
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;

    // Read failures just mean an empty result page.
    let files = deps.registry.all_files().await.unwrap_or_default();
    let batches = deps.registry.all_batches().await.unwrap_or_default();
    let results = search(query, &files, &batches);

    if results.is_empty() {
        bot.send_message(msg.chat.id, format!("❌ No files found matching: {query}"))
            .await
            .map_err(anyhow::Error::from)?;
        return Ok(());
    }

    deps.search_cache.put(user_id, results).await;
    let rendered = deps
        .search_cache
        .update(user_id, |state| render(state, user_id, &deps.env.worker_url))
        .await;
    if let Some((text, keyboard)) = rendered {
        bot.send_message(msg.chat.id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await
            .map_err(anyhow::Error::from)?;
    }
    Ok(())
}

pub async fn handle_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> HandlerResult {
    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    let caller = q.from.id.0 as i64;

    let Some(action) = CallbackAction::parse(&data) else {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return Ok(());
    };

    if action.user_id != caller {
        let _ = bot
            .answer_callback_query(q.id.clone())
            .text("This is not your search result!")
            .show_alert(true)
            .await;
        return Ok(());
    }

    let Some((chat_id, message_id)) = crate::types::callback_anchor(&q) else {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return Ok(());
    };

    if matches!(action.kind, ActionKind::Close) {
        deps.search_cache.remove(caller).await;
        let _ = bot.answer_callback_query(q.id.clone()).await;
        let _ = bot.delete_message(chat_id, message_id).await;
        return Ok(());
    }

    let rendered = deps
        .search_cache
        .update(caller, |state| {
            match action.kind {
                ActionKind::Prev => state.page = state.page.saturating_sub(1),
                ActionKind::Next => state.page += 1,
                ActionKind::Filter(filter) => {
                    state.filter = filter;
                    state.page = 0;
                }
                ActionKind::Close => {}
            }
            // Clamp against the filtered total, then remember where we landed.
            let page = state.results.page(state.page, state.filter);
            state.page = page.number;
            render(state, caller, &deps.env.worker_url)
        })
        .await;

    let Some((text, keyboard)) = rendered else {
        let _ = bot
            .answer_callback_query(q.id.clone())
            .text("Search results expired. Please search again.")
            .show_alert(true)
            .await;
        return Ok(());
    };

    let _ = bot.answer_callback_query(q.id.clone()).await;
    if let Err(error) = bot
        .edit_message_text(chat_id, message_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await
    {
        debug!(error = %error, "Could not refresh search results message");
    }
    Ok(())
}

enum ActionKind {
    Prev,
    Next,
    Filter(ViewFilter),
    Close,
}

struct CallbackAction {
    user_id: i64,
    kind: ActionKind,
}

impl CallbackAction {
    /// `find_prev_<uid>`, `find_next_<uid>`, `find_close_<uid>`,
    /// `find_filter_<uid>_<mode>`.
    fn parse(data: &str) -> Option<Self> {
        let rest = data.strip_prefix("find_")?;
        let mut parts = rest.split('_');
        let verb = parts.next()?;
        let user_id: i64 = parts.next()?.parse().ok()?;
        let kind = match verb {
            "prev" => ActionKind::Prev,
            "next" => ActionKind::Next,
            "close" => ActionKind::Close,
            "filter" => ActionKind::Filter(ViewFilter::parse(parts.next()?)?),
            _ => return None,
        };
        Some(Self { user_id, kind })
    }
}

fn render(state: &SearchState, user_id: i64, worker_url: &str) -> (String, InlineKeyboardMarkup) {
    let page = state.results.page(state.page, state.filter);

    let mut text = String::new();
    text.push_str("🔍 <b>Search Results</b>\n");
    text.push_str(&format!("└ Query: <code>{}</code>\n\n", state.results.query));
    text.push_str("📊 <b>Stats</b>\n");
    text.push_str(&format!("├ Total Files: {}\n", state.results.files.len()));
    text.push_str(&format!("├ Total Batches: {}\n", state.results.batches.len()));
    text.push_str(&format!(
        "└ Page: {}/{}\n",
        page.number + 1,
        page.total_pages
    ));

    let mut shown_file_header = false;
    let mut shown_batch_header = false;
    for (offset, item) in page.items.iter().enumerate() {
        let position = page.number * filelink_search::PAGE_SIZE + offset + 1;
        match item {
            PageItem::File(scored) => {
                if !shown_file_header {
                    text.push_str("\n📁 <b>Single Files</b>\n");
                    shown_file_header = true;
                }
                let name = scored
                    .file
                    .display_name
                    .as_deref()
                    .or(scored.file.caption.as_deref())
                    .unwrap_or("No name");
                let size = scored
                    .file
                    .file_size
                    .map(|bytes| format!(" [{}]", format_size(bytes)))
                    .unwrap_or_default();
                let link = share_link(worker_url, &LinkTarget::Single(scored.file.code.clone()));
                text.push_str(&format!(
                    "\n{position}. <b>{}</b>{size} ({}% match)\n├ Name: <code>{name}</code>\n└ Link: {link}\n",
                    scored.file.kind.as_str().to_uppercase(),
                    scored.score,
                ));
            }
            PageItem::Batch(scored) => {
                if !shown_batch_header {
                    text.push_str("\n📚 <b>Batches</b>\n");
                    shown_batch_header = true;
                }
                let link = share_link(worker_url, &LinkTarget::Batch(scored.batch.code.clone()));
                text.push_str(&format!(
                    "\n{position}. <b>Batch</b> [{} files] ({}% match)\n├ Link: {link}\n└ Preview:\n",
                    scored.matching.len(),
                    scored.score,
                ));
                for (index, member) in scored.matching.iter().take(3).enumerate() {
                    let name = member
                        .file
                        .display_name
                        .as_deref()
                        .or(member.file.caption.as_deref())
                        .unwrap_or("No name");
                    text.push_str(&format!(
                        "   {}. <code>{name}</code> ({}% match)\n",
                        index + 1,
                        member.score
                    ));
                }
                if scored.matching.len() > 3 {
                    text.push_str(&format!(
                        "      ↳ ...and {} more files\n",
                        scored.matching.len() - 3
                    ));
                }
            }
        }
    }

    (text, keyboard(state, user_id, &page))
}

fn keyboard(state: &SearchState, user_id: i64, page: &Page<'_>) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    let filters = [
        ("🔄 All", ViewFilter::All),
        ("📄 Files", ViewFilter::SinglesOnly),
        ("📚 Batch", ViewFilter::BatchesOnly),
    ];
    rows.push(
        filters
            .into_iter()
            .map(|(label, filter)| {
                let label = if state.filter == filter {
                    format!("✅ {label}")
                } else {
                    label.to_string()
                };
                InlineKeyboardButton::callback(
                    label,
                    format!("find_filter_{user_id}_{}", filter.as_str()),
                )
            })
            .collect(),
    );

    let mut nav = Vec::new();
    if page.number > 0 {
        nav.push(InlineKeyboardButton::callback(
            "◀️",
            format!("find_prev_{user_id}"),
        ));
    }
    nav.push(InlineKeyboardButton::callback(
        format!("📄 {}/{}", page.number + 1, page.total_pages),
        "find_noop".to_string(),
    ));
    if page.number + 1 < page.total_pages {
        nav.push(InlineKeyboardButton::callback(
            "▶️",
            format!("find_next_{user_id}"),
        ));
    }
    rows.push(nav);

    rows.push(vec![InlineKeyboardButton::callback(
        "❌ Close",
        format!("find_close_{user_id}"),
    )]);

    InlineKeyboardMarkup::new(rows)
}

fn format_size(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb >= 1024.0 {
        format!("{:.1}GB", mb / 1024.0)
    } else {
        format!("{mb:.1}MB")
    }
}
