use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a stored media item, normalized once at ingestion so that
/// downstream code only branches on it at the single re-send dispatch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Document,
    Video,
    Audio,
    Photo,
    Voice,
    VideoNote,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Document => "document",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Photo => "photo",
            FileKind::Voice => "voice",
            FileKind::VideoNote => "video_note",
        }
    }

}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = crate::error::BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(FileKind::Document),
            "video" => Ok(FileKind::Video),
            "audio" => Ok(FileKind::Audio),
            "photo" => Ok(FileKind::Photo),
            "voice" => Ok(FileKind::Voice),
            "video_note" => Ok(FileKind::VideoNote),
            other => Err(crate::error::BotError::Storage(format!(
                "unknown file kind: {other}"
            ))),
        }
    }
}

/// A single shareable file as persisted in the `files` collection.
///
/// `file_ref` is the provider-issued token for the uploaded content; the
/// bytes themselves are never stored. `caption` has the configured removal
/// terms already excised at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub file_ref: String,
    pub code: String,
    pub kind: FileKind,
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
    pub caption: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

impl StoredFile {
    pub fn as_batch_file(&self) -> BatchFile {
        BatchFile {
            file_ref: self.file_ref.clone(),
            kind: self.kind,
            display_name: self.display_name.clone(),
            mime_type: self.mime_type.clone(),
            file_size: self.file_size,
            caption: self.caption.clone(),
        }
    }
}

/// Upload payload before the registry has assigned a code.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub file_ref: String,
    pub kind: FileKind,
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
    pub caption: Option<String>,
    pub owner_id: i64,
}

/// A file embedded in a batch. This is a copy of the file's metadata, not a
/// reference into the `files` collection, so a batch keeps delivering even
/// after a mirrored single-file row is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFile {
    pub file_ref: String,
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// An ordered collection of files shared under one `batch_<code>` link.
///
/// `files` is non-empty at creation and append-only afterwards; the only
/// removal path is deleting the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub code: String,
    pub files: Vec<BatchFile>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Address of a message the bot has sent, kept around so the auto-delete
/// scheduler can remove it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_round_trips_through_str() {
        for kind in [
            FileKind::Document,
            FileKind::Video,
            FileKind::Audio,
            FileKind::Photo,
            FileKind::Voice,
            FileKind::VideoNote,
        ] {
            assert_eq!(kind.as_str().parse::<FileKind>().unwrap(), kind);
        }
    }

    #[test]
    fn batch_file_serialization_skips_absent_fields() {
        let file = BatchFile {
            file_ref: "AgAD".into(),
            kind: FileKind::Photo,
            display_name: None,
            mime_type: None,
            file_size: None,
            caption: None,
        };
        let json = serde_json::to_string(&file).unwrap();
        assert!(!json.contains("display_name"));
        let back: BatchFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, file);
    }
}
