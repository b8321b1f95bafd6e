pub mod code;
pub mod error;
pub mod link;
pub mod types;

pub use code::{is_valid_code, CodeGenerator, DigestCodeGenerator, CODE_LEN};
pub use error::{BotError, BotResult};
pub use link::{parse_link, share_link, LinkTarget, BATCH_PREFIX};
pub use types::{BatchEntry, BatchFile, FileKind, MessageHandle, NewFile, StoredFile};
