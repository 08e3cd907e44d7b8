use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};
use feed_datastore::{
    CacheEntry, DataStore, MemoryDataStore, PendingItem, SummaryState, UnprocessedItem,
};

/// In-memory store with per-item write failures
#[derive(Clone, Default)]
pub struct MockDataStore {
    pub inner: Arc<MemoryDataStore>,
    pub fail_writes_for: Arc<Mutex<HashSet<String>>>,
}

impl MockDataStore {
    pub fn fail_writes_for(&self, item_id: &str) {
        self.fail_writes_for
            .lock()
            .unwrap()
            .insert(item_id.to_string());
    }
}

impl DataStore for MockDataStore {
    async fn init_schema(&self) -> anyhow::Result<()> {
        self.inner.init_schema().await
    }

    async fn get_pointer(&self, channel_id: &str) -> anyhow::Result<Option<String>> {
        self.inner.get_pointer(channel_id).await
    }

    async fn set_pointer(
        &self,
        channel_id: &str,
        item_id: &str,
        channel_name: &str,
    ) -> anyhow::Result<()> {
        self.inner.set_pointer(channel_id, item_id, channel_name).await
    }

    async fn get_cache_entry(&self, item_id: &str) -> anyhow::Result<Option<CacheEntry>> {
        self.inner.get_cache_entry(item_id).await
    }

    async fn put_cache_entry(
        &self,
        item_id: &str,
        transcript: &str,
        summary: &SummaryState,
    ) -> anyhow::Result<()> {
        if self.fail_writes_for.lock().unwrap().contains(item_id) {
            return Err(anyhow::anyhow!("connection reset while writing {}", item_id));
        }
        self.inner.put_cache_entry(item_id, transcript, summary).await
    }

    async fn list_unprocessed(&self) -> anyhow::Result<Vec<UnprocessedItem>> {
        self.inner.list_unprocessed().await
    }

    async fn list_pending_retry(&self) -> anyhow::Result<Vec<PendingItem>> {
        self.inner.list_pending_retry().await
    }
}
