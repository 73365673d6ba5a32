//! SQS work queue client for the vodforge pipeline.
//!
//! Long-polls the upload-event queue and deletes messages after the
//! consumer has handled them.

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{JobQueue, QueueConfig, QueueMessage};
