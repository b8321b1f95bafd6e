//! Inbound media normalization.
//!
//! Telegram hands each media kind over with a slightly different attribute
//! set; this module flattens all of them into one shape at ingestion so the
//! rest of the bot never branches on transport-specific structs.

use teloxide::types::Message;

use filelink_caption::{clean_caption, strip_links};
use filelink_config::BotConfig;
use filelink_core::{BatchFile, FileKind, NewFile};

/// A media item as received, before caption processing.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_ref: String,
    pub kind: FileKind,
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
    pub caption: Option<String>,
}

/// Extract the media payload from a message, largest photo size winning.
pub fn incoming_file(msg: &Message) -> Option<IncomingFile> {
    let caption = msg.caption().map(str::to_string);

    if let Some(doc) = msg.document() {
        return Some(IncomingFile {
            file_ref: doc.file.id.clone(),
            kind: FileKind::Document,
            display_name: doc.file_name.clone(),
            mime_type: doc.mime_type.as_ref().map(|m| m.to_string()),
            file_size: Some(u64::from(doc.file.size)),
            caption,
        });
    }
    if let Some(video) = msg.video() {
        return Some(IncomingFile {
            file_ref: video.file.id.clone(),
            kind: FileKind::Video,
            display_name: video.file_name.clone(),
            mime_type: video.mime_type.as_ref().map(|m| m.to_string()),
            file_size: Some(u64::from(video.file.size)),
            caption,
        });
    }
    if let Some(audio) = msg.audio() {
        return Some(IncomingFile {
            file_ref: audio.file.id.clone(),
            kind: FileKind::Audio,
            display_name: audio.file_name.clone(),
            mime_type: audio.mime_type.as_ref().map(|m| m.to_string()),
            file_size: Some(u64::from(audio.file.size)),
            caption,
        });
    }
    if let Some(sizes) = msg.photo() {
        let largest = sizes.last()?;
        return Some(IncomingFile {
            file_ref: largest.file.id.clone(),
            kind: FileKind::Photo,
            display_name: None,
            mime_type: None,
            file_size: Some(u64::from(largest.file.size)),
            caption,
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(IncomingFile {
            file_ref: voice.file.id.clone(),
            kind: FileKind::Voice,
            display_name: None,
            mime_type: voice.mime_type.as_ref().map(|m| m.to_string()),
            file_size: Some(u64::from(voice.file.size)),
            caption,
        });
    }
    if let Some(note) = msg.video_note() {
        return Some(IncomingFile {
            file_ref: note.file.id.clone(),
            kind: FileKind::VideoNote,
            display_name: None,
            mime_type: None,
            file_size: Some(u64::from(note.file.size)),
            caption,
        });
    }
    None
}

/// Caption processing applied once at save time: configured terms come out,
/// and URLs too when link saving is off.
pub fn prepared_caption(raw: Option<&str>, config: &BotConfig) -> Option<String> {
    let cleaned = clean_caption(raw, &config.remove_names)?;
    let cleaned = if config.link_enabled {
        cleaned
    } else {
        strip_links(&cleaned)
    };
    (!cleaned.is_empty()).then_some(cleaned)
}

impl IncomingFile {
    pub fn into_batch_file(self, config: &BotConfig) -> BatchFile {
        let caption = prepared_caption(self.caption.as_deref(), config);
        BatchFile {
            file_ref: self.file_ref,
            kind: self.kind,
            display_name: self.display_name,
            mime_type: self.mime_type,
            file_size: self.file_size,
            caption,
        }
    }

    pub fn into_new_file(self, owner_id: i64, config: &BotConfig) -> NewFile {
        let caption = prepared_caption(self.caption.as_deref(), config);
        NewFile {
            file_ref: self.file_ref,
            kind: self.kind,
            display_name: self.display_name,
            mime_type: self.mime_type,
            file_size: self.file_size,
            caption,
            owner_id,
        }
    }
}
