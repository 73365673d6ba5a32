//! Queue consumer loop.
//!
//! Supplies job descriptors to the pipeline from the upload-event queue.
//! Fetch errors back off and continue; they never stop the loop. The
//! shutdown flag is checked once per iteration, so the current batch is
//! always drained before exit.

use std::time::Duration;

use metrics::counter;
use tokio::sync::watch;
use tracing::{error, info, warn};

use vodforge_models::{DescriptorError, JobDescriptor, StorageEvent};
use vodforge_queue::{JobQueue, QueueMessage};

use crate::error::WorkerResult;
use crate::pipeline::{Encoder, ObjectStore, StatusSink, TranscodePipeline};

/// Fixed backoff after a failed queue fetch.
const FETCH_ERROR_BACKOFF: Duration = Duration::from_secs(2);

/// Long-poll consumer driving the transcode pipeline.
pub struct ConsumerLoop<S, E, N> {
    queue: JobQueue,
    pipeline: TranscodePipeline<S, E, N>,
    shutdown: watch::Receiver<bool>,
}

impl<S, E, N> ConsumerLoop<S, E, N>
where
    S: ObjectStore,
    E: Encoder,
    N: StatusSink,
{
    pub fn new(
        queue: JobQueue,
        pipeline: TranscodePipeline<S, E, N>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            pipeline,
            shutdown,
        }
    }

    /// Run until the shutdown flag is raised.
    pub async fn run(&self) -> WorkerResult<()> {
        info!("Consumer loop started");

        loop {
            if *self.shutdown.borrow() {
                info!("Shutdown signal observed, stopping consumer");
                return Ok(());
            }

            let messages = match self.queue.receive().await {
                Ok(messages) => messages,
                Err(e) => {
                    error!("Failed to receive messages: {}", e);
                    counter!("vodforge_queue_fetch_errors_total").increment(1);
                    tokio::time::sleep(FETCH_ERROR_BACKOFF).await;
                    continue;
                }
            };

            if messages.is_empty() {
                tokio::time::sleep(self.queue.empty_queue_sleep()).await;
                continue;
            }

            for message in messages {
                info!(message_id = %message.message_id, "Received message");
                let acknowledge = self.handle_message(&message).await;
                if acknowledge {
                    if let Err(e) = self.queue.delete(&message.receipt_handle).await {
                        error!(
                            message_id = %message.message_id,
                            "Failed to delete message: {}", e
                        );
                    }
                }
            }
        }
    }

    /// Handle one message; returns whether it should be deleted.
    ///
    /// A message is acknowledged once every job in it reached a terminal
    /// outcome. A download failure leaves it for queue redelivery; a
    /// malformed payload is acknowledged since retrying cannot fix it.
    async fn handle_message(&self, message: &QueueMessage) -> bool {
        let jobs = match parse_jobs(&message.body) {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(
                    message_id = %message.message_id,
                    "Discarding malformed message: {}", e
                );
                counter!("vodforge_jobs_failed_total").increment(1);
                return true;
            }
        };

        let mut acknowledge = true;
        for job in jobs {
            match self.pipeline.process(&job).await {
                Ok(()) => {
                    counter!("vodforge_jobs_processed_total").increment(1);
                }
                Err(e) => {
                    counter!("vodforge_jobs_failed_total").increment(1);
                    error!(
                        owner_id = %job.owner_id,
                        video_id = %job.video_id,
                        "Job failed: {}", e
                    );
                    if e.leaves_message_for_redelivery() {
                        warn!(
                            message_id = %message.message_id,
                            "Leaving message for redelivery"
                        );
                        acknowledge = false;
                    }
                }
            }
        }
        acknowledge
    }
}

/// Extract job descriptors from a raw message body.
pub fn parse_jobs(body: &str) -> Result<Vec<JobDescriptor>, DescriptorError> {
    let event = StorageEvent::from_json(body)?;
    if event.records.is_empty() {
        return Err(DescriptorError::EmptyEvent);
    }
    event.records.iter().map(JobDescriptor::from_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jobs_well_formed() {
        let body = serde_json::json!({
            "Records": [{
                "s3": {
                    "bucket": { "name": "media" },
                    "object": { "key": "u1/v42/source.mp4", "size": 104857600 }
                }
            }]
        })
        .to_string();

        let jobs = parse_jobs(&body).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].owner_id, "u1");
        assert_eq!(jobs[0].video_id, "v42");
    }

    #[test]
    fn test_parse_jobs_malformed_key() {
        let body = serde_json::json!({
            "Records": [{
                "s3": {
                    "bucket": { "name": "media" },
                    "object": { "key": "malformed", "size": 1 }
                }
            }]
        })
        .to_string();

        assert!(matches!(
            parse_jobs(&body),
            Err(DescriptorError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_parse_jobs_invalid_json() {
        assert!(matches!(
            parse_jobs("not json"),
            Err(DescriptorError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_parse_jobs_empty_event() {
        assert!(matches!(parse_jobs("{}"), Err(DescriptorError::EmptyEvent)));
    }
}
