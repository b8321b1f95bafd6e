//! Environment-derived runtime configuration.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bot_token: String,
    pub admin_id: i64,
    pub worker_url: String,
    pub db_path: String,
    pub health_port: u16,
    pub log_dir: String,
    pub log_level: String,
}

impl RuntimeConfig {
    /// Read the runtime config from the environment. `BOT_TOKEN` and
    /// `ADMIN_ID` are required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("BOT_TOKEN").context("BOT_TOKEN is not set")?;
        let admin_id = std::env::var("ADMIN_ID")
            .context("ADMIN_ID is not set")?
            .trim()
            .parse()
            .context("ADMIN_ID is not a valid user id")?;
        let worker_url = std::env::var("WORKER_URL")
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string();
        let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "filelink.db".to_string());
        let health_port = std::env::var("HEALTH_PORT")
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(8080);
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            bot_token,
            admin_id,
            worker_url,
            db_path,
            health_port,
            log_dir,
            log_level,
        })
    }
}
