use serde_json::{json, Value};
use ws_broadcast_core::contract::ConnectionRecord;
use ws_broadcast_core::testing::{
    connection_ids, InMemoryConnectionStore, RecordingQueue, ScriptedGateway,
};
use ws_broadcast_lambda::config::BroadcastConfig;
use ws_broadcast_lambda::handlers::broadcast::{handle_queue_event, BroadcastHandlerConfig};

const TABLE: &str = "websocket-connections";
const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/000000000000/broadcast-test";

fn handler_config(page_size: u32) -> BroadcastHandlerConfig {
    let config = BroadcastConfig::from_lookup(|key| match key {
        "AWS_SQS_URL" => Some(QUEUE_URL.to_string()),
        "BROADCAST_PAGE_SIZE" => Some(page_size.to_string()),
        _ => None,
    })
    .expect("test config should load");
    BroadcastHandlerConfig::from(&config)
}

fn sqs_event(body: &str, receipt_handle: &str) -> Value {
    json!({
        "Records": [
            {
                "messageId": "059f36b4-87a3-44ab-83d2-661975830a7d",
                "receiptHandle": receipt_handle,
                "body": body,
                "attributes": {
                    "ApproximateReceiveCount": "1",
                    "SentTimestamp": "1545082649183"
                },
                "messageAttributes": {},
                "eventSource": "aws:sqs",
                "awsRegion": "us-east-1"
            }
        ]
    })
}

#[tokio::test]
async fn broadcasts_to_every_connection_and_acknowledges() {
    let store = InMemoryConnectionStore::new(TABLE, connection_ids(&["A", "B"]));
    let queue = RecordingQueue::new();
    let gateway = ScriptedGateway::new();

    let response = handle_queue_event(
        sqs_event("hello", "R1"),
        &handler_config(25),
        &store,
        &queue,
        &gateway,
    )
    .await;

    assert!(response.is_success());
    let body: Value = serde_json::from_str(&response.body).expect("body should be JSON");
    assert_eq!(body["message"], "sent message hello to 2 users!");
    assert_eq!(gateway.attempts(), vec!["A", "B"]);
    assert_eq!(
        queue.deleted(),
        vec![(QUEUE_URL.to_string(), "R1".to_string())]
    );
}

#[tokio::test]
async fn empty_message_fails_without_touching_services() {
    let store = InMemoryConnectionStore::new(TABLE, connection_ids(&["A", "B"]));
    let queue = RecordingQueue::new();
    let gateway = ScriptedGateway::new();

    let response = handle_queue_event(
        sqs_event("", "R1"),
        &handler_config(25),
        &store,
        &queue,
        &gateway,
    )
    .await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response.body, "event message empty or null");
    assert_eq!(store.describe_calls(), 0);
    assert!(store.scan_calls().is_empty());
    assert!(gateway.attempts().is_empty());
    assert!(queue.deleted().is_empty());
}

#[tokio::test]
async fn small_pages_reach_every_connection_exactly_once() {
    let connections: Vec<ConnectionRecord> = (0..10)
        .map(|index| ConnectionRecord::new(format!("conn-{index}")))
        .collect();

    for page_size in [1, 3, 10, 11] {
        let store = InMemoryConnectionStore::new(TABLE, connections.clone());
        let queue = RecordingQueue::new();
        let gateway = ScriptedGateway::new();

        let response = handle_queue_event(
            sqs_event("tick", "R7"),
            &handler_config(page_size),
            &store,
            &queue,
            &gateway,
        )
        .await;

        assert!(response.is_success(), "page size {page_size}");
        let mut attempts = gateway.attempts();
        attempts.sort();
        attempts.dedup();
        assert_eq!(attempts.len(), 10, "page size {page_size}");
        assert!(response.body.contains("sent message tick to 10 users!"));
    }
}

#[tokio::test]
async fn empty_table_acknowledges_with_zero_recipients() {
    let store = InMemoryConnectionStore::new(TABLE, Vec::new());
    let queue = RecordingQueue::new();
    let gateway = ScriptedGateway::new();

    let response = handle_queue_event(
        sqs_event("nobody home", "R2"),
        &handler_config(25),
        &store,
        &queue,
        &gateway,
    )
    .await;

    assert!(response.is_success());
    assert!(response
        .body
        .contains("sent message nobody home to 0 users!"));
    assert_eq!(queue.deleted().len(), 1);
}

#[tokio::test]
async fn failed_dispatch_keeps_message_for_redelivery() {
    let store = InMemoryConnectionStore::new(TABLE, connection_ids(&["A", "B"]));
    let queue = RecordingQueue::new();
    let gateway = ScriptedGateway::new().fail("A", "500").fail("B", "500");

    let response = handle_queue_event(
        sqs_event("hello", "R1"),
        &handler_config(25),
        &store,
        &queue,
        &gateway,
    )
    .await;

    assert_eq!(response.status_code, 500);
    assert!(response.body.starts_with("failed to deliver message"));
    assert!(queue.deleted().is_empty());
}
