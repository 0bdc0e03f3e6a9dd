use std::collections::HashSet;

use serde_json::Value;
use tracing::{error, info, warn};
use ws_broadcast_core::aggregate::collect_connections;
use ws_broadcast_core::contract::{BroadcastSummary, MessageSummary, QueueEvent};
use ws_broadcast_core::dispatch::{broadcast, DispatchReport, PushGateway};
use ws_broadcast_core::error::BroadcastError;
use ws_broadcast_core::queue::MessageQueue;
use ws_broadcast_core::store::ConnectionStore;

use crate::config::BroadcastConfig;
use crate::handlers::response::{error_response, success_response, ApiGatewayResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastHandlerConfig {
    pub table_name: String,
    pub queue_url: String,
    pub page_size: u32,
    pub max_in_flight: usize,
}

impl From<&BroadcastConfig> for BroadcastHandlerConfig {
    fn from(config: &BroadcastConfig) -> Self {
        Self {
            table_name: config.table_name.clone(),
            queue_url: config.queue_url.clone(),
            page_size: config.page_size,
            max_in_flight: config.max_in_flight,
        }
    }
}

/// Entry point for one queue-triggered invocation. Every failure maps to a
/// 500 carrying the error text; success maps to a 200 JSON summary.
pub async fn handle_queue_event<S, Q, G>(
    event: Value,
    config: &BroadcastHandlerConfig,
    store: &S,
    queue: &Q,
    gateway: &G,
) -> ApiGatewayResponse
where
    S: ConnectionStore,
    Q: MessageQueue,
    G: PushGateway,
{
    match process_queue_event(event, config, store, queue, gateway).await {
        Ok(summary) => success_response(summary),
        Err(failure) => {
            error!(
                component = "broadcast_handler",
                validation = failure.is_validation(),
                error = %failure,
                "broadcast failed"
            );
            error_response(500, &failure.to_string())
        }
    }
}

/// Validate, aggregate, then dispatch and acknowledge each message in turn.
///
/// A message is acknowledged only after its dispatch pass succeeded.
/// Connections reported gone are dropped before the next message. The
/// first failure stops processing; that message and every later one stay
/// on the queue for redelivery.
pub async fn process_queue_event<S, Q, G>(
    event: Value,
    config: &BroadcastHandlerConfig,
    store: &S,
    queue: &Q,
    gateway: &G,
) -> Result<BroadcastSummary, BroadcastError>
where
    S: ConnectionStore,
    Q: MessageQueue,
    G: PushGateway,
{
    let event: QueueEvent = serde_json::from_value(event)
        .map_err(|error| BroadcastError::MalformedEvent(error.to_string()))?;
    let messages = event.into_messages()?;

    let mut connections = collect_connections(store, &config.table_name, config.page_size)
        .await
        .map_err(BroadcastError::Aggregation)?;

    let mut summaries = Vec::with_capacity(messages.len());
    for message in messages {
        let report =
            broadcast(gateway, &connections, &message.body, config.max_in_flight).await;
        prune_stale_connections(store, &config.table_name, &report).await;
        let stale: HashSet<&str> = report.stale_connections().into_iter().collect();
        connections.retain(|record| !stale.contains(record.connection_id.as_str()));
        let recipients = report.ensure_delivered()?;

        let summary = MessageSummary {
            message: message.body,
            recipients,
        };
        info!(
            component = "broadcast_handler",
            recipients,
            failed = report.attempted() - recipients,
            "{}",
            summary.line()
        );

        queue
            .delete_message(&config.queue_url, &message.receipt_handle)
            .await
            .map_err(|source| BroadcastError::Acknowledge {
                receipt_handle: message.receipt_handle.clone(),
                source,
            })?;
        summaries.push(summary);
    }

    Ok(BroadcastSummary::from_messages(&summaries))
}

/// Best effort: removal failures are logged and otherwise ignored.
async fn prune_stale_connections<S: ConnectionStore>(
    store: &S,
    table: &str,
    report: &DispatchReport,
) {
    for connection_id in report.stale_connections() {
        match store.remove_connection(table, connection_id).await {
            Ok(()) => info!(
                component = "broadcast_handler",
                connection_id,
                "removed stale connection"
            ),
            Err(failure) => warn!(
                component = "broadcast_handler",
                connection_id,
                error = %failure,
                "failed to remove stale connection"
            ),
        }
    }
}
