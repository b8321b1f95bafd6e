use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::info;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS files (
        code         TEXT PRIMARY KEY,
        file_ref     TEXT NOT NULL,
        kind         TEXT NOT NULL,
        display_name TEXT,
        mime_type    TEXT,
        file_size    INTEGER,
        caption      TEXT,
        owner_id     INTEGER NOT NULL,
        created_at   TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_files_file_ref ON files(file_ref);

    CREATE TABLE IF NOT EXISTS batches (
        code       TEXT PRIMARY KEY,
        owner_id   INTEGER NOT NULL,
        files      TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users (
        user_id   INTEGER PRIMARY KEY,
        username  TEXT,
        joined_at TEXT NOT NULL,
        blocked   INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS bot_config (
        id  TEXT PRIMARY KEY,
        doc TEXT NOT NULL
    );
";

/// Shared handle to the bot's SQLite database.
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .context("Failed to open SQLite database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize schema")?;
        info!(path = %path.as_ref().display(), "Database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}
