use serde::{Deserialize, Serialize};

use crate::error::BroadcastError;

pub const CONNECTION_ID_ATTRIBUTE: &str = "connectionId";
pub const CONNECT_ROUTE: &str = "$connect";
pub const DISCONNECT_ROUTE: &str = "$disconnect";

/// One live push-delivery target as stored in the connections table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ConnectionRecord {
    #[serde(rename = "connectionId")]
    pub connection_id: String,
}

impl ConnectionRecord {
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
        }
    }
}

/// Queue-triggered invocation payload. Only the fields the broadcast path
/// reads are modelled; everything else in the record is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueRecord {
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "receiptHandle", default)]
    pub receipt_handle: Option<String>,
    #[serde(rename = "eventSource", default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,
}

/// A validated message, owned for the duration of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub body: String,
    pub receipt_handle: String,
}

impl QueueEvent {
    /// Validates every record before any I/O happens. An event without
    /// records is treated the same as one carrying an empty body.
    pub fn into_messages(self) -> Result<Vec<QueueMessage>, BroadcastError> {
        if self.records.is_empty() {
            return Err(BroadcastError::EmptyMessage);
        }

        let mut messages = Vec::with_capacity(self.records.len());
        for record in self.records {
            let body = match record.body {
                Some(body) if !body.is_empty() => body,
                _ => return Err(BroadcastError::EmptyMessage),
            };
            let receipt_handle = match record.receipt_handle {
                Some(handle) if !handle.is_empty() => handle,
                _ => {
                    return Err(BroadcastError::MissingReceiptHandle {
                        message_id: record.message_id.unwrap_or_default(),
                    })
                }
            };
            messages.push(QueueMessage {
                body,
                receipt_handle,
            });
        }

        Ok(messages)
    }
}

/// API Gateway WebSocket route event (`$connect`, `$disconnect`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebsocketRouteEvent {
    #[serde(rename = "requestContext", default)]
    pub request_context: WebsocketRequestContext,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebsocketRequestContext {
    #[serde(rename = "routeKey", default)]
    pub route_key: Option<String>,
    #[serde(rename = "connectionId", default)]
    pub connection_id: Option<String>,
}

/// Outcome of one fully processed queue message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageSummary {
    pub message: String,
    pub recipients: usize,
}

impl MessageSummary {
    pub fn line(&self) -> String {
        format!(
            "sent message {} to {} users!",
            self.message, self.recipients
        )
    }
}

/// Success body returned by the broadcast handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BroadcastSummary {
    pub message: String,
    pub recipients: usize,
    pub messages: usize,
}

impl BroadcastSummary {
    pub fn from_messages(summaries: &[MessageSummary]) -> Self {
        Self {
            message: summaries
                .iter()
                .map(MessageSummary::line)
                .collect::<Vec<_>>()
                .join("\n"),
            recipients: summaries.iter().map(|summary| summary.recipients).sum(),
            messages: summaries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_queue_event_records() {
        let event: QueueEvent = serde_json::from_value(json!({
            "Records": [
                {
                    "messageId": "m-1",
                    "body": "hello",
                    "receiptHandle": "R1",
                    "eventSource": "aws:sqs",
                    "attributes": {"ApproximateReceiveCount": "1"}
                }
            ]
        }))
        .expect("event should decode");

        let messages = event.into_messages().expect("record should validate");
        assert_eq!(
            messages,
            vec![QueueMessage {
                body: "hello".to_string(),
                receipt_handle: "R1".to_string(),
            }]
        );
    }

    #[test]
    fn empty_body_is_rejected() {
        let event = QueueEvent {
            records: vec![QueueRecord {
                body: Some(String::new()),
                receipt_handle: Some("R1".to_string()),
                ..QueueRecord::default()
            }],
        };

        let error = event.into_messages().expect_err("empty body should fail");
        assert_eq!(error.to_string(), "event message empty or null");
    }

    #[test]
    fn any_empty_record_rejects_the_whole_batch() {
        let event = QueueEvent {
            records: vec![
                QueueRecord {
                    body: Some("first".to_string()),
                    receipt_handle: Some("R1".to_string()),
                    ..QueueRecord::default()
                },
                QueueRecord {
                    body: None,
                    receipt_handle: Some("R2".to_string()),
                    ..QueueRecord::default()
                },
            ],
        };

        assert!(matches!(
            event.into_messages(),
            Err(BroadcastError::EmptyMessage)
        ));
    }

    #[test]
    fn missing_records_count_as_empty_message() {
        let event: QueueEvent = serde_json::from_value(json!({})).expect("event should decode");
        assert!(matches!(
            event.into_messages(),
            Err(BroadcastError::EmptyMessage)
        ));
    }

    #[test]
    fn missing_receipt_handle_names_the_message() {
        let event = QueueEvent {
            records: vec![QueueRecord {
                message_id: Some("m-9".to_string()),
                body: Some("hello".to_string()),
                receipt_handle: None,
                event_source: None,
            }],
        };

        let error = event.into_messages().expect_err("missing handle should fail");
        assert!(error.to_string().contains("m-9"));
    }

    #[test]
    fn summary_joins_one_line_per_message() {
        let summary = BroadcastSummary::from_messages(&[
            MessageSummary {
                message: "hello".to_string(),
                recipients: 2,
            },
            MessageSummary {
                message: "again".to_string(),
                recipients: 1,
            },
        ]);

        assert_eq!(
            summary.message,
            "sent message hello to 2 users!\nsent message again to 1 users!"
        );
        assert_eq!(summary.recipients, 3);
        assert_eq!(summary.messages, 2);
    }

    #[test]
    fn connection_record_uses_table_attribute_name() {
        let value = serde_json::to_value(ConnectionRecord::new("A")).expect("serialize");
        assert_eq!(value, json!({ "connectionId": "A" }));
    }
}
