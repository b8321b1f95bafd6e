//! Batch intake: collect N files from one user, then materialize a batch.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::debug;

use filelink_core::{BatchFile, BotError, BotResult};

/// Smallest accepted batch size.
pub const MIN_BATCH_FILES: usize = 1;
/// Largest accepted batch size.
pub const MAX_BATCH_FILES: usize = 32;

struct IntakeSession {
    requested: usize,
    collected: Vec<BatchFile>,
    /// Set when appending to an existing batch instead of creating one.
    target_batch_code: Option<String>,
}

/// Result of feeding one file into a user's intake session.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeOutcome {
    /// No session for this user; the file belongs to another flow.
    NotCollecting,
    Progress {
        received: usize,
        requested: usize,
    },
    /// Target count reached; the session is already gone. The caller now
    /// creates the batch (or appends, when a target code is present) and
    /// announces the link.
    Complete {
        files: Vec<BatchFile>,
        target_batch_code: Option<String>,
    },
}

/// Intake sessions keyed by user id. Transport ordering serializes one
/// user's messages in practice, but every mutation still goes through the
/// store lock.
#[derive(Default)]
pub struct BatchIntake {
    sessions: Mutex<HashMap<i64, IntakeSession>>,
}

impl BatchIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or silently replace) a session expecting `requested` files.
    ///
    /// A second `start` while collecting overwrites the previous session,
    /// no merge. `target_batch_code` is validated by the caller against the
    /// registry before it gets here.
    pub async fn start(
        &self,
        user_id: i64,
        requested: usize,
        target_batch_code: Option<String>,
    ) -> BotResult<()> {
        if !(MIN_BATCH_FILES..=MAX_BATCH_FILES).contains(&requested) {
            return Err(BotError::validation(format!(
                "batch size must be between {MIN_BATCH_FILES} and {MAX_BATCH_FILES}"
            )));
        }
        let mut sessions = self.sessions.lock().await;
        let replaced = sessions
            .insert(
                user_id,
                IntakeSession {
                    requested,
                    collected: Vec::with_capacity(requested),
                    target_batch_code,
                },
            )
            .is_some();
        debug!(user_id, requested, replaced, "Intake session started");
        Ok(())
    }

    /// Feed one already-transformed file into the user's session.
    pub async fn receive_file(&self, user_id: i64, file: BatchFile) -> IntakeOutcome {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(&user_id) else {
            return IntakeOutcome::NotCollecting;
        };

        session.collected.push(file);
        if session.collected.len() >= session.requested {
            // Discard the session in the same critical section that filled it.
            if let Some(done) = sessions.remove(&user_id) {
                debug!(user_id, files = done.collected.len(), "Intake complete");
                return IntakeOutcome::Complete {
                    files: done.collected,
                    target_batch_code: done.target_batch_code,
                };
            }
            return IntakeOutcome::NotCollecting;
        }
        IntakeOutcome::Progress {
            received: session.collected.len(),
            requested: session.requested,
        }
    }

    pub async fn is_collecting(&self, user_id: i64) -> bool {
        self.sessions.lock().await.contains_key(&user_id)
    }

    pub async fn cancel(&self, user_id: i64) -> bool {
        self.sessions.lock().await.remove(&user_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filelink_core::FileKind;

    fn file(n: usize) -> BatchFile {
        BatchFile {
            file_ref: format!("ref-{n}"),
            kind: FileKind::Document,
            display_name: None,
            mime_type: None,
            file_size: None,
            caption: None,
        }
    }

    #[tokio::test]
    async fn rejects_out_of_range_counts() {
        let intake = BatchIntake::new();
        assert!(matches!(
            intake.start(1, 0, None).await,
            Err(BotError::Validation(_))
        ));
        assert!(matches!(
            intake.start(1, 33, None).await,
            Err(BotError::Validation(_))
        ));
        assert!(intake.start(1, 32, None).await.is_ok());
    }

    #[tokio::test]
    async fn files_outside_a_session_are_not_handled() {
        let intake = BatchIntake::new();
        assert_eq!(
            intake.receive_file(1, file(0)).await,
            IntakeOutcome::NotCollecting
        );
    }

    #[tokio::test]
    async fn progress_counts_up_and_completes_exactly_once() {
        let intake = BatchIntake::new();
        intake.start(1, 32, None).await.unwrap();

        for n in 1..32 {
            assert_eq!(
                intake.receive_file(1, file(n)).await,
                IntakeOutcome::Progress {
                    received: n,
                    requested: 32
                }
            );
        }

        match intake.receive_file(1, file(32)).await {
            IntakeOutcome::Complete {
                files,
                target_batch_code,
            } => {
                assert_eq!(files.len(), 32);
                assert_eq!(target_batch_code, None);
            }
            other => panic!("expected completion, got {other:?}"),
        }

        // Session is gone the instant the count was reached.
        assert!(!intake.is_collecting(1).await);
        assert_eq!(
            intake.receive_file(1, file(33)).await,
            IntakeOutcome::NotCollecting
        );
    }

    #[tokio::test]
    async fn completion_keeps_arrival_order() {
        let intake = BatchIntake::new();
        intake.start(1, 3, None).await.unwrap();
        intake.receive_file(1, file(1)).await;
        intake.receive_file(1, file(2)).await;
        let IntakeOutcome::Complete { files, .. } = intake.receive_file(1, file(3)).await else {
            panic!("expected completion");
        };
        let refs: Vec<&str> = files.iter().map(|f| f.file_ref.as_str()).collect();
        assert_eq!(refs, ["ref-1", "ref-2", "ref-3"]);
    }

    #[tokio::test]
    async fn restart_overwrites_the_previous_session() {
        let intake = BatchIntake::new();
        intake.start(1, 5, None).await.unwrap();
        intake.receive_file(1, file(1)).await;

        intake.start(1, 2, Some("abc123de".into())).await.unwrap();
        assert_eq!(
            intake.receive_file(1, file(2)).await,
            IntakeOutcome::Progress {
                received: 1,
                requested: 2
            }
        );
        let IntakeOutcome::Complete {
            target_batch_code, ..
        } = intake.receive_file(1, file(3)).await
        else {
            panic!("expected completion");
        };
        assert_eq!(target_batch_code.as_deref(), Some("abc123de"));
    }

    #[tokio::test]
    async fn users_do_not_interfere() {
        let intake = BatchIntake::new();
        intake.start(1, 2, None).await.unwrap();
        intake.start(2, 2, None).await.unwrap();

        intake.receive_file(1, file(1)).await;
        assert_eq!(
            intake.receive_file(2, file(9)).await,
            IntakeOutcome::Progress {
                received: 1,
                requested: 2
            }
        );
    }
}
