//! In-memory doubles for the store, queue and gateway seams.
//!
//! Every double records the calls it receives so tests can assert on what
//! was (or was not) attempted.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::contract::ConnectionRecord;
use crate::dispatch::PushGateway;
use crate::error::{DeliveryError, QueueError, StoreError};
use crate::queue::MessageQueue;
use crate::store::{ConnectionStore, Page, TableDescription};

pub fn connection_ids(ids: &[&str]) -> Vec<ConnectionRecord> {
    ids.iter().map(|id| ConnectionRecord::new(*id)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCall {
    pub limit: u32,
    pub start: Option<usize>,
}

/// Single-table store paging like DynamoDB: a page that fills `limit`
/// always carries a continuation token, even when it holds the last record.
/// The cursor is the offset of the next record.
pub struct InMemoryConnectionStore {
    table: String,
    records: Mutex<Vec<ConnectionRecord>>,
    scan_calls: Mutex<Vec<ScanCall>>,
    describe_calls: Mutex<usize>,
    removed: Mutex<Vec<String>>,
    describe_failure: Option<StoreError>,
    scan_failure: Option<(usize, StoreError)>,
    write_failure: Option<StoreError>,
}

impl InMemoryConnectionStore {
    pub fn new(table: impl Into<String>, records: Vec<ConnectionRecord>) -> Self {
        Self {
            table: table.into(),
            records: Mutex::new(records),
            scan_calls: Mutex::new(Vec::new()),
            describe_calls: Mutex::new(0),
            removed: Mutex::new(Vec::new()),
            describe_failure: None,
            scan_failure: None,
            write_failure: None,
        }
    }

    pub fn fail_describe_with(mut self, error: StoreError) -> Self {
        self.describe_failure = Some(error);
        self
    }

    /// Fails the `call`-th scan (1-based).
    pub fn fail_scan_on_call(mut self, call: usize, error: StoreError) -> Self {
        self.scan_failure = Some((call, error));
        self
    }

    /// Fails every put and delete.
    pub fn fail_writes_with(mut self, error: StoreError) -> Self {
        self.write_failure = Some(error);
        self
    }

    pub fn records(&self) -> Vec<ConnectionRecord> {
        self.records.lock().expect("poisoned mutex").clone()
    }

    pub fn scan_calls(&self) -> Vec<ScanCall> {
        self.scan_calls.lock().expect("poisoned mutex").clone()
    }

    pub fn describe_calls(&self) -> usize {
        *self.describe_calls.lock().expect("poisoned mutex")
    }

    /// Connection ids passed to `remove_connection`, in call order.
    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().expect("poisoned mutex").clone()
    }

    fn check_table(&self, table: &str) -> Result<(), StoreError> {
        if table == self.table {
            Ok(())
        } else {
            Err(StoreError::NotFound(table.to_string()))
        }
    }
}

#[async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    type Cursor = usize;

    async fn describe_table(&self, table: &str) -> Result<TableDescription, StoreError> {
        *self.describe_calls.lock().expect("poisoned mutex") += 1;
        if let Some(error) = &self.describe_failure {
            return Err(error.clone());
        }
        self.check_table(table)?;

        let item_count = self.records.lock().expect("poisoned mutex").len();
        Ok(TableDescription {
            table_name: table.to_string(),
            item_count: i64::try_from(item_count).ok(),
            status: Some("ACTIVE".to_string()),
        })
    }

    async fn scan(
        &self,
        table: &str,
        limit: u32,
        start: Option<usize>,
    ) -> Result<Page<usize>, StoreError> {
        let call = {
            let mut calls = self.scan_calls.lock().expect("poisoned mutex");
            calls.push(ScanCall { limit, start });
            calls.len()
        };
        if let Some((failing_call, error)) = &self.scan_failure {
            if *failing_call == call {
                return Err(error.clone());
            }
        }
        self.check_table(table)?;

        let records = self.records.lock().expect("poisoned mutex");
        let offset = start.unwrap_or(0).min(records.len());
        let end = offset.saturating_add(limit as usize).min(records.len());
        let page_records = records[offset..end].to_vec();
        let continuation = (page_records.len() == limit as usize).then_some(end);

        Ok(Page {
            records: page_records,
            continuation,
        })
    }

    async fn add_connection(&self, table: &str, connection_id: &str) -> Result<(), StoreError> {
        if let Some(error) = &self.write_failure {
            return Err(error.clone());
        }
        self.check_table(table)?;

        let mut records = self.records.lock().expect("poisoned mutex");
        if !records
            .iter()
            .any(|record| record.connection_id == connection_id)
        {
            records.push(ConnectionRecord::new(connection_id));
        }
        Ok(())
    }

    async fn remove_connection(
        &self,
        table: &str,
        connection_id: &str,
    ) -> Result<(), StoreError> {
        self.removed
            .lock()
            .expect("poisoned mutex")
            .push(connection_id.to_string());
        if let Some(error) = &self.write_failure {
            return Err(error.clone());
        }
        self.check_table(table)?;

        self.records
            .lock()
            .expect("poisoned mutex")
            .retain(|record| record.connection_id != connection_id);
        Ok(())
    }
}

/// Records every acknowledgement as `(queue_url, receipt_handle)`.
#[derive(Default)]
pub struct RecordingQueue {
    deleted: Mutex<Vec<(String, String)>>,
    failure: Option<QueueError>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: QueueError) -> Self {
        Self {
            deleted: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl MessageQueue for RecordingQueue {
    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueError> {
        self.deleted
            .lock()
            .expect("poisoned mutex")
            .push((queue_url.to_string(), receipt_handle.to_string()));
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Accepts every delivery unless a connection was scripted to fail.
#[derive(Default)]
pub struct ScriptedGateway {
    failures: HashMap<String, DeliveryError>,
    rejected_payloads: Vec<Vec<u8>>,
    attempts: Mutex<Vec<String>>,
    deliveries: Mutex<Vec<(String, Vec<u8>)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(mut self, connection_id: &str, message: &str) -> Self {
        self.failures.insert(
            connection_id.to_string(),
            DeliveryError::Service {
                connection_id: connection_id.to_string(),
                message: message.to_string(),
            },
        );
        self
    }

    pub fn gone(mut self, connection_id: &str) -> Self {
        self.failures.insert(
            connection_id.to_string(),
            DeliveryError::Gone(connection_id.to_string()),
        );
        self
    }

    /// Fails every delivery of this exact payload, whatever the connection.
    pub fn reject_payload(mut self, payload: &str) -> Self {
        self.rejected_payloads.push(payload.as_bytes().to_vec());
        self
    }

    /// Every connection id a delivery was attempted for.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().expect("poisoned mutex").clone()
    }

    /// Successful deliveries with their payloads.
    pub fn deliveries(&self) -> Vec<(String, Vec<u8>)> {
        self.deliveries.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl PushGateway for ScriptedGateway {
    async fn post_to_connection(
        &self,
        connection_id: &str,
        payload: &[u8],
    ) -> Result<(), DeliveryError> {
        self.attempts
            .lock()
            .expect("poisoned mutex")
            .push(connection_id.to_string());
        if let Some(error) = self.failures.get(connection_id) {
            return Err(error.clone());
        }
        if self.rejected_payloads.iter().any(|rejected| rejected == payload) {
            return Err(DeliveryError::Service {
                connection_id: connection_id.to_string(),
                message: "payload rejected".to_string(),
            });
        }
        self.deliveries
            .lock()
            .expect("poisoned mutex")
            .push((connection_id.to_string(), payload.to_vec()));
        Ok(())
    }
}
