//! Per-user session state for multi-step flows.
//!
//! Each flow keeps its own store keyed by user id, injected into handlers
//! rather than captured as ambient handler state. Sessions live until
//! completion, timeout, or process restart; they are deliberately not
//! durable.

pub mod caption_edit;
pub mod intake;
pub mod settings_input;

pub use caption_edit::{CaptionEditSessions, CAPTION_PROMPT_TIMEOUT};
pub use intake::{BatchIntake, IntakeOutcome, MAX_BATCH_FILES, MIN_BATCH_FILES};
pub use settings_input::{SettingsInput, SettingsPrompt};
