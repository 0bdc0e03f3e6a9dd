use std::fmt::Debug;

use async_trait::async_trait;

use crate::contract::ConnectionRecord;
use crate::error::StoreError;

pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// One bounded scan result.
///
/// A page carrying a continuation token implies more pages may follow,
/// whatever its record count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<C> {
    pub records: Vec<ConnectionRecord>,
    pub continuation: Option<C>,
}

impl<C> Page<C> {
    pub fn is_last(&self) -> bool {
        self.continuation.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub table_name: String,
    pub item_count: Option<i64>,
    pub status: Option<String>,
}

/// Key-value table holding one record per live connection.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Opaque cursor the store hands back to resume a scan.
    type Cursor: Clone + Debug + Send + Sync + 'static;

    async fn describe_table(&self, table: &str) -> Result<TableDescription, StoreError>;

    async fn scan(
        &self,
        table: &str,
        limit: u32,
        start: Option<Self::Cursor>,
    ) -> Result<Page<Self::Cursor>, StoreError>;

    /// Idempotent upsert.
    async fn add_connection(&self, table: &str, connection_id: &str) -> Result<(), StoreError>;

    async fn remove_connection(&self, table: &str, connection_id: &str)
        -> Result<(), StoreError>;
}
