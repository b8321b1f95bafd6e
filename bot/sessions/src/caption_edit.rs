//! Caption edit flow: the admin sends a file, then the replacement caption.
//!
//! The caption step carries a soft expiry. Both the expiry task and the
//! completion path remove the session by taking it out of the map under the
//! lock, so exactly one of them ever acts on it; completion additionally
//! aborts the timer. Each pending step carries a token so a stale timer can
//! never clear a session that was recreated after it was armed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use filelink_core::BatchFile;

/// How long the caption prompt waits before giving up.
pub const CAPTION_PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

enum CaptionState {
    AwaitingFile,
    AwaitingCaption {
        file: BatchFile,
        token: u64,
        timer: JoinHandle<()>,
    },
}

#[derive(Default)]
pub struct CaptionEditSessions {
    inner: Arc<Mutex<HashMap<i64, CaptionState>>>,
    next_token: AtomicU64,
}

impl CaptionEditSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the flow: the next file from this user belongs to it.
    pub async fn begin(&self, user_id: i64) {
        let mut sessions = self.inner.lock().await;
        if let Some(CaptionState::AwaitingCaption { timer, .. }) =
            sessions.insert(user_id, CaptionState::AwaitingFile)
        {
            timer.abort();
        }
        debug!(user_id, "Caption edit started");
    }

    pub async fn is_awaiting_file(&self, user_id: i64) -> bool {
        matches!(
            self.inner.lock().await.get(&user_id),
            Some(CaptionState::AwaitingFile)
        )
    }

    /// Advance to the caption step, arming the expiry timer.
    ///
    /// `on_timeout` runs only if the prompt expires unanswered. Returns false
    /// (and does nothing) when the user was not in the file step.
    pub async fn provide_file<F>(&self, user_id: i64, file: BatchFile, on_timeout: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut sessions = self.inner.lock().await;
        if !matches!(sessions.get(&user_id), Some(CaptionState::AwaitingFile)) {
            return false;
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let map = Arc::clone(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(CAPTION_PROMPT_TIMEOUT).await;
            let expired = {
                let mut sessions = map.lock().await;
                match sessions.get(&user_id) {
                    Some(CaptionState::AwaitingCaption { token: t, .. }) if *t == token => {
                        sessions.remove(&user_id);
                        true
                    }
                    _ => false,
                }
            };
            if expired {
                debug!(user_id, "Caption prompt expired");
                on_timeout.await;
            }
        });

        sessions.insert(
            user_id,
            CaptionState::AwaitingCaption { file, token, timer },
        );
        true
    }

    /// Complete the flow, returning the pending file. Cancels the expiry
    /// timer; returns `None` when the timer already won the race (or the
    /// user never reached the caption step).
    pub async fn take_pending(&self, user_id: i64) -> Option<BatchFile> {
        let mut sessions = self.inner.lock().await;
        match sessions.remove(&user_id) {
            Some(CaptionState::AwaitingCaption { file, timer, .. }) => {
                timer.abort();
                Some(file)
            }
            Some(state @ CaptionState::AwaitingFile) => {
                sessions.insert(user_id, state);
                None
            }
            None => None,
        }
    }

    pub async fn is_awaiting_caption(&self, user_id: i64) -> bool {
        matches!(
            self.inner.lock().await.get(&user_id),
            Some(CaptionState::AwaitingCaption { .. })
        )
    }
}
