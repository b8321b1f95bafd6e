//! The link registry: everything a share code resolves to.
//!
//! Code assignment lives here, not in the generator: on a collision the
//! registry bumps the attempt counter and asks the generator again, so a
//! single well-known codepath owns uniqueness.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use filelink_core::{
    BatchEntry, BatchFile, BotError, BotResult, CodeGenerator, LinkTarget, NewFile, StoredFile,
};

use crate::db::Database;

/// Collision retries before giving up with `DuplicateCode`.
const MAX_CODE_ATTEMPTS: u32 = 16;

/// What a share code resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Single(StoredFile),
    Batch(BatchEntry),
}

/// Scope of a bulk purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeScope {
    All,
    Singles,
    Batches,
}

pub struct LinkRegistry {
    db: Arc<Database>,
    codegen: Arc<dyn CodeGenerator>,
}

impl LinkRegistry {
    pub fn new(db: Arc<Database>, codegen: Arc<dyn CodeGenerator>) -> Self {
        Self { db, codegen }
    }

    /// Insert a single file and hand back the stored record with its code.
    pub async fn create_single(&self, new: NewFile) -> BotResult<StoredFile> {
        let conn = self.db.conn.lock().await;
        let code = self.assign_code(&conn, "files", &new.file_ref, new.owner_id)?;
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO files (code, file_ref, kind, display_name, mime_type, file_size, caption, owner_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                code,
                new.file_ref,
                new.kind.as_str(),
                new.display_name,
                new.mime_type,
                new.file_size,
                new.caption,
                new.owner_id,
                created_at.to_rfc3339(),
            ],
        )
        .map_err(BotError::storage)?;
        info!(code = %code, kind = %new.kind, "Stored file");
        Ok(StoredFile {
            file_ref: new.file_ref,
            code,
            kind: new.kind,
            display_name: new.display_name,
            mime_type: new.mime_type,
            file_size: new.file_size,
            caption: new.caption,
            owner_id: new.owner_id,
            created_at,
        })
    }

    /// Materialize a batch from an ordered, non-empty file list.
    pub async fn create_batch(&self, files: Vec<BatchFile>, owner_id: i64) -> BotResult<BatchEntry> {
        if files.is_empty() {
            return Err(BotError::EmptyBatch);
        }
        let conn = self.db.conn.lock().await;
        let content_key = files
            .iter()
            .map(|file| file.file_ref.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let code = self.assign_code(&conn, "batches", &content_key, owner_id)?;
        let created_at = Utc::now();
        let files_json = serde_json::to_string(&files).map_err(BotError::storage)?;
        conn.execute(
            "INSERT INTO batches (code, owner_id, files, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![code, owner_id, files_json, created_at.to_rfc3339()],
        )
        .map_err(BotError::storage)?;
        info!(code = %code, files = files.len(), "Created batch");
        Ok(BatchEntry {
            code,
            files,
            owner_id,
            created_at,
        })
    }

    /// Append files to an existing batch; returns the new total file count.
    pub async fn append_to_batch(
        &self,
        code: &str,
        new_files: Vec<BatchFile>,
    ) -> BotResult<usize> {
        if new_files.is_empty() {
            return Err(BotError::validation("nothing to append"));
        }
        let conn = self.db.conn.lock().await;
        let mut batch = query_batch(&conn, code)?
            .ok_or_else(|| BotError::NotFound(format!("batch_{code}")))?;
        batch.files.extend(new_files);
        let files_json = serde_json::to_string(&batch.files).map_err(BotError::storage)?;
        conn.execute(
            "UPDATE batches SET files = ?1 WHERE code = ?2",
            params![files_json, code],
        )
        .map_err(BotError::storage)?;
        info!(code = %code, total = batch.files.len(), "Appended to batch");
        Ok(batch.files.len())
    }

    /// Single lookup by parsed link target. The `batch_` convention decided
    /// which table to hit before we got here.
    pub async fn resolve(&self, target: &LinkTarget) -> BotResult<Resolved> {
        let conn = self.db.conn.lock().await;
        match target {
            LinkTarget::Single(code) => query_file(&conn, code)?
                .map(Resolved::Single)
                .ok_or_else(|| BotError::NotFound(target.payload())),
            LinkTarget::Batch(code) => query_batch(&conn, code)?
                .map(Resolved::Batch)
                .ok_or_else(|| BotError::NotFound(target.payload())),
        }
    }

    /// Delete whatever the target points at; returns whether anything went.
    ///
    /// Batch deletion also removes single-file rows that mirror the batch's
    /// file refs, best-effort; a missing mirror is not an error.
    pub async fn delete(&self, target: &LinkTarget) -> BotResult<bool> {
        let conn = self.db.conn.lock().await;
        match target {
            LinkTarget::Single(code) => {
                let deleted = conn
                    .execute("DELETE FROM files WHERE code = ?1", params![code])
                    .map_err(BotError::storage)?;
                Ok(deleted > 0)
            }
            LinkTarget::Batch(code) => {
                let Some(batch) = query_batch(&conn, code)? else {
                    return Ok(false);
                };
                for file in &batch.files {
                    let mirrors = conn
                        .execute(
                            "DELETE FROM files WHERE file_ref = ?1",
                            params![file.file_ref],
                        )
                        .map_err(BotError::storage)?;
                    if mirrors > 0 {
                        debug!(code = %code, file_ref = %file.file_ref, "Removed mirrored file row");
                    }
                }
                conn.execute("DELETE FROM batches WHERE code = ?1", params![code])
                    .map_err(BotError::storage)?;
                info!(code = %code, "Deleted batch");
                Ok(true)
            }
        }
    }

    /// Unconditional bulk delete; returns how many rows went.
    pub async fn purge(&self, scope: PurgeScope) -> BotResult<u64> {
        let conn = self.db.conn.lock().await;
        let mut removed = 0u64;
        if matches!(scope, PurgeScope::All | PurgeScope::Singles) {
            removed += conn
                .execute("DELETE FROM files", [])
                .map_err(BotError::storage)? as u64;
        }
        if matches!(scope, PurgeScope::All | PurgeScope::Batches) {
            removed += conn
                .execute("DELETE FROM batches", [])
                .map_err(BotError::storage)? as u64;
        }
        info!(?scope, removed, "Purged registry");
        Ok(removed)
    }

    /// Full caption replace on every row holding this file ref.
    pub async fn set_caption(&self, file_ref: &str, caption: Option<&str>) -> BotResult<usize> {
        let conn = self.db.conn.lock().await;
        let updated = conn
            .execute(
                "UPDATE files SET caption = ?1 WHERE file_ref = ?2",
                params![caption, file_ref],
            )
            .map_err(BotError::storage)?;
        Ok(updated)
    }

    /// Prepend `prefix` to every caption in a batch (bare prefix where a file
    /// had none), mirroring the change onto matching single-file rows.
    /// Returns the number of files touched.
    pub async fn prefix_batch_captions(&self, code: &str, prefix: &str) -> BotResult<usize> {
        let conn = self.db.conn.lock().await;
        let mut batch = query_batch(&conn, code)?
            .ok_or_else(|| BotError::NotFound(format!("batch_{code}")))?;

        for file in &mut batch.files {
            let caption = match file.caption.as_deref().filter(|c| !c.is_empty()) {
                Some(old) => format!("{prefix} {old}"),
                None => prefix.to_string(),
            };
            conn.execute(
                "UPDATE files SET caption = ?1 WHERE file_ref = ?2",
                params![caption, file.file_ref],
            )
            .map_err(BotError::storage)?;
            file.caption = Some(caption);
        }

        let files_json = serde_json::to_string(&batch.files).map_err(BotError::storage)?;
        conn.execute(
            "UPDATE batches SET files = ?1 WHERE code = ?2",
            params![files_json, code],
        )
        .map_err(BotError::storage)?;
        info!(code = %code, files = batch.files.len(), "Prefixed batch captions");
        Ok(batch.files.len())
    }

    /// Every stored single file, in insertion order (search scan).
    pub async fn all_files(&self) -> BotResult<Vec<StoredFile>> {
        let conn = self.db.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT code, file_ref, kind, display_name, mime_type, file_size, caption, owner_id, created_at
                 FROM files ORDER BY rowid",
            )
            .map_err(BotError::storage)?;
        let files = stmt
            .query_map([], row_to_file)
            .map_err(BotError::storage)?
            .filter_map(|row| row.ok())
            .collect();
        Ok(files)
    }

    /// Every batch, in insertion order (search scan).
    pub async fn all_batches(&self) -> BotResult<Vec<BatchEntry>> {
        let conn = self.db.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT code, owner_id, files, created_at FROM batches ORDER BY rowid")
            .map_err(BotError::storage)?;
        let batches = stmt
            .query_map([], row_to_batch)
            .map_err(BotError::storage)?
            .filter_map(|row| row.ok())
            .collect();
        Ok(batches)
    }

    fn assign_code(
        &self,
        conn: &Connection,
        table: &str,
        content_key: &str,
        owner_id: i64,
    ) -> BotResult<String> {
        for attempt in 0..MAX_CODE_ATTEMPTS {
            let code = self.codegen.generate(content_key, owner_id, attempt);
            let taken: bool = conn
                .query_row(
                    &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE code = ?1)"),
                    params![code],
                    |row| row.get(0),
                )
                .map_err(BotError::storage)?;
            if !taken {
                return Ok(code);
            }
            debug!(code = %code, attempt, table, "Code collision, regenerating");
        }
        Err(BotError::DuplicateCode(format!(
            "no free code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }
}

fn query_file(conn: &Connection, code: &str) -> BotResult<Option<StoredFile>> {
    conn.query_row(
        "SELECT code, file_ref, kind, display_name, mime_type, file_size, caption, owner_id, created_at
         FROM files WHERE code = ?1",
        params![code],
        row_to_file,
    )
    .optional()
    .map_err(BotError::storage)
}

fn query_batch(conn: &Connection, code: &str) -> BotResult<Option<BatchEntry>> {
    conn.query_row(
        "SELECT code, owner_id, files, created_at FROM batches WHERE code = ?1",
        params![code],
        row_to_batch,
    )
    .optional()
    .map_err(BotError::storage)
}

fn row_to_file(row: &Row<'_>) -> rusqlite::Result<StoredFile> {
    let kind: String = row.get(2)?;
    let created_at: String = row.get(8)?;
    Ok(StoredFile {
        code: row.get(0)?,
        file_ref: row.get(1)?,
        kind: kind.parse().unwrap_or(filelink_core::FileKind::Document),
        display_name: row.get(3)?,
        mime_type: row.get(4)?,
        file_size: row.get(5)?,
        caption: row.get(6)?,
        owner_id: row.get(7)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn row_to_batch(row: &Row<'_>) -> rusqlite::Result<BatchEntry> {
    let files_json: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    Ok(BatchEntry {
        code: row.get(0)?,
        owner_id: row.get(1)?,
        files: serde_json::from_str(&files_json).unwrap_or_default(),
        created_at: parse_timestamp(&created_at),
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filelink_core::{DigestCodeGenerator, FileKind};

    /// Always emits the same code on attempt 0, unique codes afterwards.
    struct CollidingGenerator;

    impl CodeGenerator for CollidingGenerator {
        fn generate(&self, content_key: &str, owner_id: i64, attempt: u32) -> String {
            if attempt == 0 {
                "aaaaaaaa".to_string()
            } else {
                DigestCodeGenerator.generate(content_key, owner_id, attempt)
            }
        }
    }

    /// Never produces a fresh code.
    struct StuckGenerator;

    impl CodeGenerator for StuckGenerator {
        fn generate(&self, _: &str, _: i64, _: u32) -> String {
            "aaaaaaaa".to_string()
        }
    }

    fn registry_with(codegen: Arc<dyn CodeGenerator>) -> LinkRegistry {
        LinkRegistry::new(Arc::new(Database::in_memory().unwrap()), codegen)
    }

    fn registry() -> LinkRegistry {
        registry_with(Arc::new(DigestCodeGenerator))
    }

    fn new_file(file_ref: &str, caption: Option<&str>) -> NewFile {
        NewFile {
            file_ref: file_ref.to_string(),
            kind: FileKind::Document,
            display_name: Some(format!("{file_ref}.mkv")),
            mime_type: Some("video/x-matroska".to_string()),
            file_size: Some(700 << 20),
            caption: caption.map(str::to_string),
            owner_id: 42,
        }
    }

    fn batch_file(file_ref: &str) -> BatchFile {
        BatchFile {
            file_ref: file_ref.to_string(),
            kind: FileKind::Video,
            display_name: Some(format!("{file_ref}.mp4")),
            mime_type: None,
            file_size: None,
            caption: None,
        }
    }

    #[tokio::test]
    async fn single_file_round_trips() {
        let registry = registry();
        let stored = registry
            .create_single(new_file("AgAD-1", Some("Avengers")))
            .await
            .unwrap();

        let resolved = registry
            .resolve(&LinkTarget::Single(stored.code.clone()))
            .await
            .unwrap();
        assert_eq!(resolved, Resolved::Single(stored));
    }

    #[tokio::test]
    async fn collision_is_retried_with_a_bumped_attempt() {
        let registry = registry_with(Arc::new(CollidingGenerator));
        let first = registry.create_single(new_file("AgAD-1", None)).await.unwrap();
        let second = registry.create_single(new_file("AgAD-2", None)).await.unwrap();

        assert_eq!(first.code, "aaaaaaaa");
        assert_ne!(second.code, "aaaaaaaa");
    }

    #[tokio::test]
    async fn exhausted_retries_surface_duplicate_code() {
        let registry = registry_with(Arc::new(StuckGenerator));
        registry.create_single(new_file("AgAD-1", None)).await.unwrap();
        let err = registry
            .create_single(new_file("AgAD-2", None))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::DuplicateCode(_)));
    }

    #[tokio::test]
    async fn empty_batches_are_rejected() {
        let err = registry().create_batch(Vec::new(), 42).await.unwrap_err();
        assert!(matches!(err, BotError::EmptyBatch));
    }

    #[tokio::test]
    async fn batch_files_keep_their_order_across_create_and_append() {
        let registry = registry();
        let batch = registry
            .create_batch(vec![batch_file("ep-1"), batch_file("ep-2")], 42)
            .await
            .unwrap();

        let total = registry
            .append_to_batch(&batch.code, vec![batch_file("ep-3")])
            .await
            .unwrap();
        assert_eq!(total, 3);

        let resolved = registry
            .resolve(&LinkTarget::Batch(batch.code.clone()))
            .await
            .unwrap();
        let Resolved::Batch(entry) = resolved else {
            panic!("expected a batch");
        };
        let refs: Vec<&str> = entry.files.iter().map(|f| f.file_ref.as_str()).collect();
        assert_eq!(refs, ["ep-1", "ep-2", "ep-3"]);
    }

    #[tokio::test]
    async fn appending_to_an_unknown_batch_is_not_found() {
        let err = registry()
            .append_to_batch("zzzzzzzz", vec![batch_file("ep-1")])
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::NotFound(_)));
    }

    #[tokio::test]
    async fn appending_nothing_is_a_validation_error() {
        let registry = registry();
        let batch = registry
            .create_batch(vec![batch_file("ep-1")], 42)
            .await
            .unwrap();
        let err = registry
            .append_to_batch(&batch.code, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Validation(_)));
    }

    #[tokio::test]
    async fn deleting_a_single_file_reports_whether_it_existed() {
        let registry = registry();
        let stored = registry.create_single(new_file("AgAD-1", None)).await.unwrap();
        let target = LinkTarget::Single(stored.code);

        assert!(registry.delete(&target).await.unwrap());
        assert!(!registry.delete(&target).await.unwrap());
    }

    #[tokio::test]
    async fn batch_delete_cascades_to_mirrored_file_rows() {
        let registry = registry();
        let mirrored = registry.create_single(new_file("shared-ref", None)).await.unwrap();
        let batch = registry
            .create_batch(
                vec![batch_file("shared-ref"), batch_file("batch-only-ref")],
                42,
            )
            .await
            .unwrap();

        assert!(registry
            .delete(&LinkTarget::Batch(batch.code))
            .await
            .unwrap());

        // Mirrored row went with the batch; its absence for the second file
        // was not an error.
        let err = registry
            .resolve(&LinkTarget::Single(mirrored.code))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::NotFound(_)));
    }

    #[tokio::test]
    async fn batch_survives_deletion_of_a_mirrored_single() {
        let registry = registry();
        let mirrored = registry.create_single(new_file("shared-ref", None)).await.unwrap();
        let batch = registry
            .create_batch(vec![batch_file("shared-ref")], 42)
            .await
            .unwrap();

        registry
            .delete(&LinkTarget::Single(mirrored.code))
            .await
            .unwrap();

        let resolved = registry
            .resolve(&LinkTarget::Batch(batch.code))
            .await
            .unwrap();
        let Resolved::Batch(entry) = resolved else {
            panic!("expected a batch");
        };
        assert_eq!(entry.files.len(), 1);
    }

    #[tokio::test]
    async fn purge_scopes_hit_the_right_tables() {
        let registry = registry();
        registry.create_single(new_file("AgAD-1", None)).await.unwrap();
        registry
            .create_batch(vec![batch_file("ep-1")], 42)
            .await
            .unwrap();

        assert_eq!(registry.purge(PurgeScope::Singles).await.unwrap(), 1);
        assert_eq!(registry.all_batches().await.unwrap().len(), 1);
        assert_eq!(registry.purge(PurgeScope::All).await.unwrap(), 1);
        assert!(registry.all_batches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_caption_is_a_full_replace() {
        let registry = registry();
        let stored = registry
            .create_single(new_file("AgAD-1", Some("old text")))
            .await
            .unwrap();

        registry
            .set_caption("AgAD-1", Some("new text"))
            .await
            .unwrap();

        let resolved = registry
            .resolve(&LinkTarget::Single(stored.code))
            .await
            .unwrap();
        let Resolved::Single(file) = resolved else {
            panic!("expected a file");
        };
        assert_eq!(file.caption.as_deref(), Some("new text"));
    }

    #[tokio::test]
    async fn prefixing_batch_captions_updates_batch_and_mirrors() {
        let registry = registry();
        let mirrored = registry
            .create_single(new_file("shared-ref", Some("E01")))
            .await
            .unwrap();
        let batch = registry
            .create_batch(
                vec![
                    BatchFile {
                        caption: Some("E01".to_string()),
                        ..batch_file("shared-ref")
                    },
                    batch_file("no-caption-ref"),
                ],
                42,
            )
            .await
            .unwrap();

        let updated = registry
            .prefix_batch_captions(&batch.code, "Drama S01")
            .await
            .unwrap();
        assert_eq!(updated, 2);

        let Resolved::Batch(entry) = registry
            .resolve(&LinkTarget::Batch(batch.code))
            .await
            .unwrap()
        else {
            panic!("expected a batch");
        };
        assert_eq!(entry.files[0].caption.as_deref(), Some("Drama S01 E01"));
        assert_eq!(entry.files[1].caption.as_deref(), Some("Drama S01"));

        let Resolved::Single(file) = registry
            .resolve(&LinkTarget::Single(mirrored.code))
            .await
            .unwrap()
        else {
            panic!("expected a file");
        };
        assert_eq!(file.caption.as_deref(), Some("Drama S01 E01"));
    }
}
