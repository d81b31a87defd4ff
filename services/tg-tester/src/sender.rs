//! The load-test worker: wires the Bot API client into the paced
//! dispatch loop from core-logic.

use crate::client::{SendOutcome, TelegramClient};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use core_logic::{
    run_paced, CallOutcome, MetricsCollector, PacingConfig, SendRecord, Worker, WorkerStats,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct MessageBlast {
    client: Arc<TelegramClient>,
    chat_id: String,
    message_text: String,
    pacing: PacingConfig,
}

impl MessageBlast {
    pub fn new(
        client: Arc<TelegramClient>,
        chat_id: String,
        message_text: String,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            client,
            chat_id,
            message_text,
            pacing,
        }
    }
}

#[async_trait]
impl Worker for MessageBlast {
    fn name(&self) -> &str {
        "message-blast"
    }

    async fn start(&self, cancellation_token: CancellationToken) -> Result<WorkerStats> {
        let stats = run_paced(&self.pacing, &cancellation_token, |index| {
            let client = self.client.clone();
            let chat_id = self.chat_id.clone();
            // Index + timestamp in the body, so deliveries can be
            // cross-checked against the logs.
            let body = format!(
                "{} #{} ({})",
                self.message_text,
                index,
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );

            async move {
                let started = Instant::now();
                match client.send_message(&chat_id, &body).await {
                    Ok(SendOutcome::Sent) => {
                        MetricsCollector::global()
                            .record_send(started.elapsed(), SendRecord::Succeeded);
                        debug!("Sent #{}", index);
                        Ok(CallOutcome::Ack)
                    }
                    Ok(SendOutcome::Throttled { retry_after }) => {
                        MetricsCollector::global()
                            .record_send(started.elapsed(), SendRecord::Throttled);
                        Ok(CallOutcome::Throttled { retry_after })
                    }
                    Err(e) => {
                        MetricsCollector::global()
                            .record_send(started.elapsed(), SendRecord::Failed);
                        Err(e.into())
                    }
                }
            }
        })
        .await?;

        Ok(WorkerStats {
            succeeded: stats.succeeded,
            failed: stats.failed,
        })
    }
}
