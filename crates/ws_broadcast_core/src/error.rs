use thiserror::Error;

/// Failures reported by the connections table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("table {0} not found")]
    NotFound(String),

    #[error("table {table} unreachable: {message}")]
    Unreachable { table: String, message: String },

    #[error("store service error: {0}")]
    Service(String),

    #[error("malformed connection record: {0}")]
    Malformed(String),
}

/// Failure to push a payload to one connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The gateway no longer knows the connection (HTTP 410).
    #[error("connection {0} is gone")]
    Gone(String),

    #[error("delivery to {connection_id} failed: {message}")]
    Service {
        connection_id: String,
        message: String,
    },
}

impl DeliveryError {
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone(_))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("queue service error: {0}")]
pub struct QueueError(pub String);

/// Terminal outcome of one broadcast invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("event message empty or null")]
    EmptyMessage,

    #[error("malformed queue event: {0}")]
    MalformedEvent(String),

    #[error("queue record {message_id} has no receipt handle")]
    MissingReceiptHandle { message_id: String },

    #[error("failed to aggregate connections: {0}")]
    Aggregation(#[source] StoreError),

    #[error("failed to deliver message to any of {attempted} connections: {cause}")]
    Dispatch {
        attempted: usize,
        #[source]
        cause: DeliveryError,
    },

    /// Content already reached the connections but the queue message was
    /// not removed, so it will be delivered again.
    #[error("message delivered but not acknowledged (receipt handle {receipt_handle}): {source}")]
    Acknowledge {
        receipt_handle: String,
        #[source]
        source: QueueError,
    },
}

impl BroadcastError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyMessage | Self::MalformedEvent(_) | Self::MissingReceiptHandle { .. }
        )
    }
}
