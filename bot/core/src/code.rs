//! Share-code derivation.
//!
//! Codes are exactly [`CODE_LEN`] characters of `[0-9a-z]`, rendered from a
//! SHA-256 digest of the content reference and the uploader identity. Batch
//! codes use the same alphabet; batch-ness is carried by the `batch_` link
//! prefix, never inferred from the code's shape. Collision handling lives in
//! the registry, which bumps `attempt` and asks again.

use sha2::{Digest, Sha256};

/// Canonical length of a share code.
pub const CODE_LEN: usize = 8;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Derives short public codes for files and batches.
pub trait CodeGenerator: Send + Sync {
    /// Deterministic for a given `(content_key, owner_id, attempt)`; a bumped
    /// `attempt` must yield a different code so the registry can retry past
    /// collisions.
    fn generate(&self, content_key: &str, owner_id: i64, attempt: u32) -> String;
}

/// Default generator: SHA-256 digest truncated to a base-36 code.
pub struct DigestCodeGenerator;

impl CodeGenerator for DigestCodeGenerator {
    fn generate(&self, content_key: &str, owner_id: i64, attempt: u32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content_key.as_bytes());
        hasher.update(owner_id.to_be_bytes());
        if attempt > 0 {
            hasher.update(attempt.to_be_bytes());
        }
        let digest = hasher.finalize();

        let mut acc: u64 = 0;
        for byte in digest.iter().take(8) {
            acc = (acc << 8) | u64::from(*byte);
        }

        let mut buf = [0u8; CODE_LEN];
        for slot in buf.iter_mut().rev() {
            *slot = ALPHABET[(acc % 36) as usize];
            acc /= 36;
        }
        // buf is ASCII by construction.
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Whether `s` is a well-formed share code: [`CODE_LEN`] chars of `[0-9a-z]`.
pub fn is_valid_code(s: &str) -> bool {
    s.len() == CODE_LEN
        && s.bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}
