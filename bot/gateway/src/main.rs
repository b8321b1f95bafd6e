mod env;
mod health;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::{error, info};

use filelink_channels::{
    schema, DeliveryService, HandlerDeps, RuntimeEnv, ShortenerClient, TelegramTransport,
};
use filelink_config::SettingsStore;
use filelink_core::DigestCodeGenerator;
use filelink_scheduler::AutoDeleteScheduler;
use filelink_search::SearchCache;
use filelink_sessions::{BatchIntake, CaptionEditSessions, SettingsInput};
use filelink_storage::{ConfigDoc, Database, LinkRegistry, UserStore};

use env::RuntimeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    let config = RuntimeConfig::from_env()?;
    logging::init(&config.log_dir, &config.log_level);

    info!(db = %config.db_path, "Starting filelink");

    // Unreachable storage or a bad token abort startup; nothing else does.
    let db = Arc::new(Database::open(&config.db_path).context("cannot open the database")?);
    let settings = SettingsStore::load_or_init(Arc::new(ConfigDoc::new(db.clone())))
        .await
        .context("cannot load bot configuration")?;

    let bot = Bot::new(&config.bot_token);
    let me = bot
        .get_me()
        .await
        .context("cannot authenticate with Telegram")?;
    info!(username = ?me.username(), "Authenticated");

    let registry = Arc::new(LinkRegistry::new(db.clone(), Arc::new(DigestCodeGenerator)));
    let users = Arc::new(UserStore::new(db));
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let scheduler = Arc::new(AutoDeleteScheduler::new(
        settings.clone(),
        transport.clone(),
    ));
    let delivery = Arc::new(DeliveryService::new(
        registry.clone(),
        settings.clone(),
        scheduler.clone(),
        transport,
    ));

    let deps = HandlerDeps {
        registry,
        users,
        settings,
        intake: Arc::new(BatchIntake::new()),
        caption_edit: Arc::new(CaptionEditSessions::new()),
        settings_input: Arc::new(SettingsInput::new()),
        search_cache: Arc::new(SearchCache::new()),
        scheduler,
        delivery,
        shortener: Arc::new(ShortenerClient::new()),
        env: Arc::new(RuntimeEnv {
            admin_id: config.admin_id,
            worker_url: config.worker_url.clone(),
        }),
    };

    let health_port = config.health_port;
    tokio::spawn(async move {
        if let Err(error) = health::serve(health_port).await {
            error!(error = %error, "Health server stopped");
        }
    });

    info!("Bot is running...");
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
