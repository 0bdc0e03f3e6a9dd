use async_trait::async_trait;

use crate::error::QueueError;

/// Acknowledges processed messages so they are not redelivered.
///
/// Callers acknowledge only after the broadcast attempt for that message
/// has finished.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn delete_message(&self, queue_url: &str, receipt_handle: &str)
        -> Result<(), QueueError>;
}
