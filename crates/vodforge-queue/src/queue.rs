//! SQS work queue client.

use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client;
use tracing::debug;

use crate::error::{QueueError, QueueResult};

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// SQS queue URL
    pub queue_url: String,
    /// AWS region
    pub region: String,
    /// Maximum messages per receive (1-10)
    pub max_messages: i32,
    /// Long-poll wait per receive, in seconds (0-20)
    pub wait_time_secs: i32,
    /// Sleep between polls when the queue is empty
    pub empty_queue_sleep: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_url: String::new(),
            region: "ap-south-1".to_string(),
            max_messages: 1,
            wait_time_secs: 10,
            empty_queue_sleep: Duration::from_secs(5),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        let queue_url = std::env::var("SQS_QUEUE_URL")
            .map_err(|_| QueueError::config_error("SQS_QUEUE_URL not set"))?;

        Ok(Self {
            queue_url,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "ap-south-1".to_string()),
            max_messages: std::env::var("SQS_MAX_MESSAGES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1)
                .clamp(1, 10),
            wait_time_secs: std::env::var("SQS_MAX_WAIT_TIME")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10)
                .clamp(0, 20),
            empty_queue_sleep: Duration::from_secs(
                std::env::var("SQS_EMPTY_QUEUE_SLEEP")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        })
    }
}

/// One received work queue message.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    /// Queue-assigned message identifier, for log attribution
    pub message_id: String,
    /// Handle used to delete the message after handling
    pub receipt_handle: String,
    /// Raw message body (a storage-event JSON payload)
    pub body: String,
}

/// Work queue client.
pub struct JobQueue {
    client: Client,
    config: QueueConfig,
}

impl JobQueue {
    /// Create a new queue client.
    pub async fn new(config: QueueConfig) -> QueueResult<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_sqs::config::Region::new(config.region.clone()))
            .load()
            .await;

        Ok(Self {
            client: Client::new(&sdk_config),
            config,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env()?).await
    }

    /// Sleep interval to use when a receive returns no messages.
    pub fn empty_queue_sleep(&self) -> Duration {
        self.config.empty_queue_sleep
    }

    /// Long-poll for up to the configured batch of messages.
    pub async fn receive(&self) -> QueueResult<Vec<QueueMessage>> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.config.queue_url)
            .max_number_of_messages(self.config.max_messages)
            .wait_time_seconds(self.config.wait_time_secs)
            .send()
            .await
            .map_err(|e| QueueError::receive_failed(e.to_string()))?;

        let messages = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| {
                let receipt_handle = m.receipt_handle?;
                Some(QueueMessage {
                    message_id: m.message_id.unwrap_or_default(),
                    receipt_handle,
                    body: m.body.unwrap_or_default(),
                })
            })
            .collect::<Vec<_>>();

        debug!("Received {} messages", messages.len());
        Ok(messages)
    }

    /// Delete a handled message.
    pub async fn delete(&self, receipt_handle: &str) -> QueueResult<()> {
        self.client
            .delete_message()
            .queue_url(&self.config.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::delete_failed(e.to_string()))?;

        debug!("Deleted message");
        Ok(())
    }
}
