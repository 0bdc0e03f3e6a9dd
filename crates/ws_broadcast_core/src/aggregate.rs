use futures::TryStreamExt;
use tracing::{debug, info};

use crate::contract::ConnectionRecord;
use crate::error::StoreError;
use crate::pager::ScanPager;
use crate::store::ConnectionStore;

/// Confirms the table exists, then drains it page by page and concatenates
/// the records in page order. Records are not deduplicated; the table key
/// already guarantees uniqueness.
pub async fn collect_connections<S: ConnectionStore>(
    store: &S,
    table: &str,
    limit: u32,
) -> Result<Vec<ConnectionRecord>, StoreError> {
    let description = store.describe_table(table).await?;
    debug!(
        component = "aggregator",
        table = description.table_name.as_str(),
        item_count = description.item_count,
        status = description.status.as_deref(),
        "table described"
    );

    let connections = ScanPager::new(store, table, limit)
        .into_stream()
        .try_fold(Vec::new(), |mut connections, page| async move {
            connections.extend(page.records);
            Ok(connections)
        })
        .await?;

    info!(
        component = "aggregator",
        table,
        connections = connections.len(),
        "connections aggregated"
    );
    Ok(connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{connection_ids, InMemoryConnectionStore};

    fn numbered(count: usize) -> Vec<ConnectionRecord> {
        (0..count)
            .map(|index| ConnectionRecord::new(format!("conn-{index}")))
            .collect()
    }

    #[tokio::test]
    async fn returns_every_record_once_for_any_page_size() {
        let records = numbered(7);
        for limit in [1, 3, 7, 8, 100] {
            let store = InMemoryConnectionStore::new("connections", records.clone());
            let collected = collect_connections(&store, "connections", limit)
                .await
                .expect("aggregation should succeed");
            assert_eq!(collected, records, "page size {limit}");
        }
    }

    #[tokio::test]
    async fn exact_page_size_issues_one_trailing_scan() {
        let store = InMemoryConnectionStore::new("connections", numbered(4));
        let collected = collect_connections(&store, "connections", 4)
            .await
            .expect("aggregation should succeed");

        assert_eq!(collected.len(), 4);
        assert_eq!(store.scan_calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_table_yields_empty_list() {
        let store = InMemoryConnectionStore::new("connections", Vec::new());
        let collected = collect_connections(&store, "connections", 25)
            .await
            .expect("empty table is not an error");

        assert!(collected.is_empty());
        assert_eq!(store.scan_calls().len(), 1);
    }

    #[tokio::test]
    async fn describe_failure_prevents_any_scan() {
        let store = InMemoryConnectionStore::new("connections", connection_ids(&["A"]));
        let error = collect_connections(&store, "missing", 25)
            .await
            .expect_err("unknown table should fail");

        assert_eq!(error, StoreError::NotFound("missing".to_string()));
        assert_eq!(store.describe_calls(), 1);
        assert!(store.scan_calls().is_empty());
    }

    #[tokio::test]
    async fn unreachable_table_fails_before_scanning() {
        let store = InMemoryConnectionStore::new("connections", connection_ids(&["A"]))
            .fail_describe_with(StoreError::Unreachable {
                table: "connections".to_string(),
                message: "access denied".to_string(),
            });

        let error = collect_connections(&store, "connections", 25)
            .await
            .expect_err("describe failure should abort");

        assert!(matches!(error, StoreError::Unreachable { .. }));
        assert!(store.scan_calls().is_empty());
    }

    #[tokio::test]
    async fn mid_scan_failure_discards_partial_results() {
        let store = InMemoryConnectionStore::new("connections", numbered(5))
            .fail_scan_on_call(2, StoreError::Service("throttled".to_string()));

        let error = collect_connections(&store, "connections", 2)
            .await
            .expect_err("scan failure should abort");

        assert_eq!(error, StoreError::Service("throttled".to_string()));
        assert_eq!(store.scan_calls().len(), 2);
    }
}
