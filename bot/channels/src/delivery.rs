//! Redelivery: turn a share code back into messages.
//!
//! Captions are recomputed from the *current* configuration on every
//! delivery. Editing the prefix or the removal terms retroactively changes
//! how old links render, without ever touching the stored records.

use std::sync::Arc;

use tracing::{info, warn};

use filelink_caption::{clean_caption, decorate_caption};
use filelink_config::SettingsStore;
use filelink_core::{BatchFile, BotError, BotResult, LinkTarget, MessageHandle};
use filelink_scheduler::AutoDeleteScheduler;
use filelink_storage::{LinkRegistry, Resolved};

use crate::transport::MediaTransport;

pub struct DeliveryService {
    registry: Arc<LinkRegistry>,
    settings: Arc<SettingsStore>,
    scheduler: Arc<AutoDeleteScheduler>,
    transport: Arc<dyn MediaTransport>,
}

impl DeliveryService {
    pub fn new(
        registry: Arc<LinkRegistry>,
        settings: Arc<SettingsStore>,
        scheduler: Arc<AutoDeleteScheduler>,
        transport: Arc<dyn MediaTransport>,
    ) -> Self {
        Self {
            registry,
            settings,
            scheduler,
            transport,
        }
    }

    /// The underlying transport, for callers that send one-off previews
    /// through the same media dispatch as redelivery.
    pub fn transport(&self) -> &dyn MediaTransport {
        self.transport.as_ref()
    }

    /// Resolve a target and re-send its files, notice first.
    ///
    /// Per-file send failures are logged and skipped; the rest of the batch
    /// still goes out. Every delivered handle (the notice included) is
    /// handed to the auto-delete scheduler, and the full list is returned
    /// even when some files were skipped.
    pub async fn deliver(
        &self,
        target: &LinkTarget,
        chat_id: i64,
    ) -> BotResult<Vec<MessageHandle>> {
        let resolved = self.registry.resolve(target).await?;
        let config = self.settings.snapshot().await;

        let (files, many): (Vec<BatchFile>, bool) = match resolved {
            Resolved::Single(file) => (vec![file.as_batch_file()], false),
            Resolved::Batch(batch) => (batch.files, true),
        };

        let notice = delete_notice(config.auto_delete_time, many);
        let mut delivered = vec![self
            .transport
            .send_notice(chat_id, &notice)
            .await
            .map_err(|e| BotError::Delivery(e.to_string()))?];

        for file in &files {
            let cleaned = clean_caption(file.caption.as_deref(), &config.remove_names);
            let caption = decorate_caption(
                cleaned.as_deref(),
                file.display_name.as_deref(),
                &config.prefix_name,
            );
            match self.transport.send_media(chat_id, file, &caption).await {
                Ok(handle) => delivered.push(handle),
                Err(error) => {
                    warn!(
                        code = %target.code(),
                        file_ref = %file.file_ref,
                        error = %error,
                        "Skipping file that failed to send"
                    );
                }
            }
        }

        info!(
            code = %target.code(),
            sent = delivered.len(),
            of = files.len() + 1,
            "Delivered share"
        );
        self.scheduler.schedule_deletion(delivered.clone()).await;
        Ok(delivered)
    }
}

fn delete_notice(minutes: u32, many: bool) -> String {
    if minutes == 0 {
        return if many {
            "📂 Here are your files! They're yours to keep.\n\n📂 আপনার ফাইলগুলি! এগুলি মুছে ফেলা হবে না।"
                .to_string()
        } else {
            "📂 Here's your file! It's yours to keep.\n\n📂 আপনার ফাইল! এটি মুছে ফেলা হবে না।"
                .to_string()
        };
    }
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    if many {
        format!(
            "⚠️ These files will be automatically deleted after {minutes} {unit}!\n\
             🔄 Forward them to save them.\n\n\
             ⚠️ এই ফাইলগুলি {minutes} মিনিট পর স্বয়ংক্রিয়ভাবে মুছে ফেলা হবে!\n\
             🔄 ফাইলগুলি সংরক্ষণ করতে ফরওয়ার্ড করুন।"
        )
    } else {
        format!(
            "⚠️ This file will be automatically deleted after {minutes} {unit}!\n\
             🔄 Forward this file to save it.\n\n\
             ⚠️ এই ফাইলটি {minutes} মিনিট পর স্বয়ংক্রিয়ভাবে মুছে ফেলা হবে!\n\
             🔄 ফাইলটি সংরক্ষণ করতে ফরওয়ার্ড করুন।"
        )
    }
}
