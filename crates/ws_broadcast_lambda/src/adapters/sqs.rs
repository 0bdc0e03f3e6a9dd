use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use tracing::info;
use ws_broadcast_core::error::QueueError;
use ws_broadcast_core::queue::MessageQueue;

#[derive(Clone)]
pub struct SqsMessageQueue {
    client: aws_sdk_sqs::Client,
}

impl SqsMessageQueue {
    pub fn new(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageQueue for SqsMessageQueue {
    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|error| {
                QueueError(format!(
                    "failed to delete message from {queue_url}: {}",
                    DisplayErrorContext(&error)
                ))
            })?;

        info!(component = "queue", queue_url, "message deleted");
        Ok(())
    }
}
