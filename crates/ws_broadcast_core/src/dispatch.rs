use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::contract::ConnectionRecord;
use crate::error::{BroadcastError, DeliveryError};

pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Push-delivery gateway bound to one endpoint.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn post_to_connection(
        &self,
        connection_id: &str,
        payload: &[u8],
    ) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub connection_id: String,
    pub outcome: Result<(), DeliveryError>,
}

/// Per-connection outcomes of one dispatch pass, in connection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub results: Vec<DeliveryResult>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn delivered(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome.is_ok())
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &DeliveryError)> {
        self.results.iter().filter_map(|result| match &result.outcome {
            Ok(()) => None,
            Err(error) => Some((result.connection_id.as_str(), error)),
        })
    }

    /// Connections the gateway reported as gone.
    pub fn stale_connections(&self) -> Vec<&str> {
        self.failures()
            .filter(|(_, error)| error.is_gone())
            .map(|(connection_id, _)| connection_id)
            .collect()
    }

    /// A pass fails only when something was attempted and nothing landed.
    pub fn is_total_failure(&self) -> bool {
        self.attempted() > 0 && self.delivered() == 0
    }

    /// Returns the delivered count, or the first failure when every
    /// delivery failed.
    pub fn ensure_delivered(&self) -> Result<usize, BroadcastError> {
        if !self.is_total_failure() {
            return Ok(self.delivered());
        }

        match self.failures().next() {
            Some((_, cause)) => Err(BroadcastError::Dispatch {
                attempted: self.attempted(),
                cause: cause.clone(),
            }),
            None => Ok(0),
        }
    }
}

/// Pushes `payload` to every connection.
///
/// At most `max_in_flight` deliveries run at once and results keep the
/// connection order. A failed delivery never stops the remaining ones.
pub async fn broadcast<G: PushGateway>(
    gateway: &G,
    connections: &[ConnectionRecord],
    payload: &str,
    max_in_flight: usize,
) -> DispatchReport {
    let results: Vec<DeliveryResult> = stream::iter(connections)
        .map(|connection| async move {
            let outcome = gateway
                .post_to_connection(&connection.connection_id, payload.as_bytes())
                .await;
            if let Err(error) = &outcome {
                warn!(
                    component = "dispatcher",
                    connection_id = connection.connection_id.as_str(),
                    stale = error.is_gone(),
                    error = %error,
                    "delivery failed"
                );
            }
            DeliveryResult {
                connection_id: connection.connection_id.clone(),
                outcome,
            }
        })
        .buffered(max_in_flight.max(1))
        .collect()
        .await;

    let report = DispatchReport { results };
    debug!(
        component = "dispatcher",
        attempted = report.attempted(),
        delivered = report.delivered(),
        "dispatch pass finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{connection_ids, ScriptedGateway};

    #[tokio::test]
    async fn empty_connection_list_succeeds_with_zero_recipients() {
        let gateway = ScriptedGateway::new();
        let report = broadcast(&gateway, &[], "hello", DEFAULT_MAX_IN_FLIGHT).await;

        assert_eq!(report.attempted(), 0);
        assert_eq!(report.ensure_delivered(), Ok(0));
        assert!(gateway.attempts().is_empty());
    }

    #[tokio::test]
    async fn delivers_payload_to_every_connection_in_order() {
        let gateway = ScriptedGateway::new();
        let connections = connection_ids(&["A", "B", "C"]);
        let report = broadcast(&gateway, &connections, "hello", 2).await;

        assert_eq!(report.delivered(), 3);
        let order: Vec<_> = report
            .results
            .iter()
            .map(|result| result.connection_id.as_str())
            .collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert!(gateway
            .deliveries()
            .iter()
            .all(|(_, payload)| payload.as_slice() == b"hello"));
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_remaining_deliveries() {
        let gateway = ScriptedGateway::new().fail("B", "internal error");
        let connections = connection_ids(&["A", "B", "C"]);
        let report = broadcast(&gateway, &connections, "hello", 1).await;

        assert_eq!(gateway.attempts(), vec!["A", "B", "C"]);
        assert_eq!(report.delivered(), 2);
        assert_eq!(report.ensure_delivered(), Ok(2));
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test]
    async fn total_failure_surfaces_dispatch_error() {
        let gateway = ScriptedGateway::new().fail("A", "boom").gone("B");
        let connections = connection_ids(&["A", "B"]);
        let report = broadcast(&gateway, &connections, "hello", 4).await;

        let error = report.ensure_delivered().expect_err("nothing was delivered");
        assert!(matches!(error, BroadcastError::Dispatch { attempted: 2, .. }));
    }

    #[tokio::test]
    async fn gone_connections_are_reported_as_stale() {
        let gateway = ScriptedGateway::new().gone("B").fail("C", "timeout");
        let connections = connection_ids(&["A", "B", "C"]);
        let report = broadcast(&gateway, &connections, "hello", 3).await;

        assert_eq!(report.stale_connections(), vec!["B"]);
    }
}
