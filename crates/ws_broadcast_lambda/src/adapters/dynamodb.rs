use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use ws_broadcast_core::contract::{ConnectionRecord, CONNECTION_ID_ATTRIBUTE};
use ws_broadcast_core::error::StoreError;
use ws_broadcast_core::store::{ConnectionStore, Page, TableDescription};

pub type DynamoItem = HashMap<String, AttributeValue>;

/// Connections table backed by DynamoDB, keyed by `connectionId`.
#[derive(Clone)]
pub struct DynamoConnectionStore {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoConnectionStore {
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConnectionStore for DynamoConnectionStore {
    type Cursor = DynamoItem;

    async fn describe_table(&self, table: &str) -> Result<TableDescription, StoreError> {
        let output = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(|error| {
                let not_found = error
                    .as_service_error()
                    .is_some_and(|service_error| service_error.is_resource_not_found_exception());
                if not_found {
                    StoreError::NotFound(table.to_string())
                } else {
                    StoreError::Unreachable {
                        table: table.to_string(),
                        message: DisplayErrorContext(&error).to_string(),
                    }
                }
            })?;

        let description = output.table();
        Ok(TableDescription {
            table_name: description
                .and_then(|table| table.table_name())
                .unwrap_or(table)
                .to_string(),
            item_count: description.and_then(|table| table.item_count()),
            status: description
                .and_then(|table| table.table_status())
                .map(|status| status.as_str().to_string()),
        })
    }

    async fn scan(
        &self,
        table: &str,
        limit: u32,
        start: Option<DynamoItem>,
    ) -> Result<Page<DynamoItem>, StoreError> {
        let output = self
            .client
            .scan()
            .table_name(table)
            .limit(i32::try_from(limit).unwrap_or(i32::MAX))
            .set_exclusive_start_key(start)
            .send()
            .await
            .map_err(|error| {
                StoreError::Service(format!(
                    "failed to scan table {table}: {}",
                    DisplayErrorContext(&error)
                ))
            })?;

        let records = output
            .items
            .unwrap_or_default()
            .iter()
            .map(connection_from_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            records,
            continuation: output.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }

    async fn add_connection(&self, table: &str, connection_id: &str) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(connection_item(connection_id)))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                StoreError::Service(format!(
                    "failed to add connection {connection_id}: {}",
                    DisplayErrorContext(&error)
                ))
            })
    }

    async fn remove_connection(
        &self,
        table: &str,
        connection_id: &str,
    ) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(connection_item(connection_id)))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                StoreError::Service(format!(
                    "failed to remove connection {connection_id}: {}",
                    DisplayErrorContext(&error)
                ))
            })
    }
}

pub fn connection_item(connection_id: &str) -> DynamoItem {
    HashMap::from([(
        CONNECTION_ID_ATTRIBUTE.to_string(),
        AttributeValue::S(connection_id.to_string()),
    )])
}

pub fn connection_from_item(item: &DynamoItem) -> Result<ConnectionRecord, StoreError> {
    item.get(CONNECTION_ID_ATTRIBUTE)
        .and_then(|value| value.as_s().ok())
        .map(|connection_id| ConnectionRecord::new(connection_id.as_str()))
        .ok_or_else(|| {
            StoreError::Malformed(format!(
                "item is missing string attribute {CONNECTION_ID_ATTRIBUTE}"
            ))
        })
}
