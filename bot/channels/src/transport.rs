//! The outbound transport seam.
//!
//! [`MediaTransport`] is what redelivery talks to; [`TelegramTransport`] is
//! the real implementation and the single place that branches on a file's
//! kind to pick the right typed send.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ParseMode};

use filelink_core::{BatchFile, FileKind, MessageHandle};
use filelink_scheduler::MessageDeleter;

#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Send an HTML notice message.
    async fn send_notice(&self, chat_id: i64, html: &str) -> anyhow::Result<MessageHandle>;

    /// Re-send a stored file with an HTML caption.
    async fn send_media(
        &self,
        chat_id: i64,
        file: &BatchFile,
        caption_html: &str,
    ) -> anyhow::Result<MessageHandle>;
}

pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

pub(crate) fn handle_of(msg: &Message) -> MessageHandle {
    MessageHandle {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
    }
}

#[async_trait]
impl MediaTransport for TelegramTransport {
    async fn send_notice(&self, chat_id: i64, html: &str) -> anyhow::Result<MessageHandle> {
        let msg = self
            .bot
            .send_message(ChatId(chat_id), html)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(handle_of(&msg))
    }

    async fn send_media(
        &self,
        chat_id: i64,
        file: &BatchFile,
        caption_html: &str,
    ) -> anyhow::Result<MessageHandle> {
        let chat = ChatId(chat_id);
        let input = InputFile::file_id(file.file_ref.clone());
        let msg = match file.kind {
            FileKind::Photo => {
                self.bot
                    .send_photo(chat, input)
                    .caption(caption_html)
                    .parse_mode(ParseMode::Html)
                    .await?
            }
            FileKind::Video => {
                self.bot
                    .send_video(chat, input)
                    .caption(caption_html)
                    .parse_mode(ParseMode::Html)
                    .await?
            }
            FileKind::Audio => {
                self.bot
                    .send_audio(chat, input)
                    .caption(caption_html)
                    .parse_mode(ParseMode::Html)
                    .await?
            }
            FileKind::Voice => {
                self.bot
                    .send_voice(chat, input)
                    .caption(caption_html)
                    .parse_mode(ParseMode::Html)
                    .await?
            }
            FileKind::VideoNote => self.bot.send_video_note(chat, input).await?,
            FileKind::Document => {
                self.bot
                    .send_document(chat, input)
                    .caption(caption_html)
                    .parse_mode(ParseMode::Html)
                    .await?
            }
        };
        Ok(handle_of(&msg))
    }
}

#[async_trait]
impl MessageDeleter for TelegramTransport {
    async fn delete(&self, message: &MessageHandle) -> anyhow::Result<()> {
        self.bot
            .delete_message(ChatId(message.chat_id), MessageId(message.message_id))
            .await?;
        Ok(())
    }
}
