//! End-to-end lifecycle: upload → share link → redelivery → auto-delete.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use filelink_channels::media::prepared_caption;
use filelink_channels::{DeliveryService, MediaTransport};
use filelink_config::{BotConfig, MemoryPersist, Setting, SettingsStore};
use filelink_core::{
    parse_link, share_link, BatchFile, DigestCodeGenerator, FileKind, LinkTarget, MessageHandle,
    NewFile,
};
use filelink_scheduler::{AutoDeleteScheduler, MessageDeleter};
use filelink_storage::{Database, LinkRegistry};

#[derive(Default)]
struct FakeTransport {
    captions: Mutex<Vec<String>>,
    next_id: AtomicI32,
}

#[async_trait]
impl MediaTransport for FakeTransport {
    async fn send_notice(&self, chat_id: i64, _html: &str) -> anyhow::Result<MessageHandle> {
        Ok(MessageHandle {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn send_media(
        &self,
        chat_id: i64,
        _file: &BatchFile,
        caption_html: &str,
    ) -> anyhow::Result<MessageHandle> {
        self.captions.lock().await.push(caption_html.to_string());
        Ok(MessageHandle {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        })
    }
}

#[derive(Default)]
struct FakeDeleter {
    deleted: Mutex<Vec<MessageHandle>>,
}

#[async_trait]
impl MessageDeleter for FakeDeleter {
    async fn delete(&self, message: &MessageHandle) -> anyhow::Result<()> {
        self.deleted.lock().await.push(*message);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn upload_share_redeliver_and_auto_delete() {
    let registry = Arc::new(LinkRegistry::new(
        Arc::new(Database::in_memory().unwrap()),
        Arc::new(DigestCodeGenerator),
    ));
    let config = BotConfig {
        auto_delete_time: 1,
        prefix_name: "@CinemazBD".to_string(),
        remove_names: vec!["mkvcinemas".to_string()],
        ..BotConfig::default()
    };
    let settings = SettingsStore::with_config(config.clone(), Arc::new(MemoryPersist::default()));
    let deleter = Arc::new(FakeDeleter::default());
    let scheduler = Arc::new(AutoDeleteScheduler::new(settings.clone(), deleter.clone()));
    let transport = Arc::new(FakeTransport::default());
    let delivery = DeliveryService::new(
        registry.clone(),
        settings.clone(),
        scheduler,
        transport.clone(),
    );

    // Upload: the caption is cleaned once at save time.
    let caption = prepared_caption(Some("Avengers [mkvcinemas]"), &config);
    assert_eq!(caption.as_deref(), Some("Avengers"));
    let stored = registry
        .create_single(NewFile {
            file_ref: "AgADBAADb".to_string(),
            kind: FileKind::Document,
            display_name: Some("avengers.mkv".to_string()),
            mime_type: Some("video/x-matroska".to_string()),
            file_size: Some(700 << 20),
            caption,
            owner_id: 99,
        })
        .await
        .unwrap();

    // The minted link round-trips through every accepted spelling.
    let link = share_link("https://w.example.dev", &LinkTarget::Single(stored.code.clone()));
    let target = parse_link(&link).expect("minted link parses");
    assert_eq!(target, LinkTarget::Single(stored.code.clone()));

    // Redelivery decorates with the current prefix.
    let delivered = delivery.deliver(&target, 555).await.unwrap();
    assert_eq!(delivered.len(), 2); // notice + file
    assert_eq!(
        transport.captions.lock().await.as_slice(),
        ["<b>@CinemazBD - Avengers</b>"]
    );

    // Changing the prefix affects the next delivery of the same old link.
    settings
        .set(Setting::PrefixName("@NewHome".to_string()))
        .await
        .unwrap();
    delivery.deliver(&target, 555).await.unwrap();
    assert_eq!(
        transport.captions.lock().await.last().map(String::as_str),
        Some("<b>@NewHome - Avengers</b>")
    );

    // Both deliveries' messages are deleted after the configured minute.
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(deleter.deleted.lock().await.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn batch_lifecycle_appends_and_redelivers_in_order() {
    let registry = Arc::new(LinkRegistry::new(
        Arc::new(Database::in_memory().unwrap()),
        Arc::new(DigestCodeGenerator),
    ));
    let settings = SettingsStore::with_config(
        BotConfig {
            auto_delete_time: 0,
            ..BotConfig::default()
        },
        Arc::new(MemoryPersist::default()),
    );
    let deleter = Arc::new(FakeDeleter::default());
    let scheduler = Arc::new(AutoDeleteScheduler::new(settings.clone(), deleter.clone()));
    let transport = Arc::new(FakeTransport::default());
    let delivery = DeliveryService::new(
        registry.clone(),
        settings,
        scheduler,
        transport.clone(),
    );

    let file = |n: u32| BatchFile {
        file_ref: format!("ref-{n}"),
        kind: FileKind::Video,
        display_name: Some(format!("episode-{n}.mp4")),
        mime_type: None,
        file_size: None,
        caption: Some(format!("Episode {n}")),
    };

    let batch = registry
        .create_batch(vec![file(1), file(2)], 99)
        .await
        .unwrap();
    registry
        .append_to_batch(&batch.code, vec![file(3)])
        .await
        .unwrap();

    let delivered = delivery
        .deliver(&LinkTarget::Batch(batch.code), 555)
        .await
        .unwrap();
    assert_eq!(delivered.len(), 4); // notice + 3 files

    let captions = transport.captions.lock().await;
    assert_eq!(
        captions.as_slice(),
        [
            "<b> - Episode 1</b>",
            "<b> - Episode 2</b>",
            "<b> - Episode 3</b>",
        ]
    );

    // Auto-delete disabled: nothing is ever deleted.
    drop(captions);
    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!(deleter.deleted.lock().await.is_empty());
}
