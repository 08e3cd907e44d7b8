use std::{future::Future, sync::Arc};

use crate::{CacheEntry, PendingItem, SummaryState, UnprocessedItem};

pub mod memory;
pub mod postgres;

pub trait DataStore {
    /// Creates the pointer and cache tables if they do not exist yet
    fn init_schema(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn get_pointer(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;

    /// Upserts the last detected video of a channel
    fn set_pointer(
        &self,
        channel_id: &str,
        item_id: &str,
        channel_name: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Reads a cache entry, incrementing its access counter
    fn get_cache_entry(
        &self,
        item_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<CacheEntry>>> + Send;

    /// Upserts a cache entry, refreshing its `updated_at`
    fn put_cache_entry(
        &self,
        item_id: &str,
        transcript: &str,
        summary: &SummaryState,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Pointers whose last video has no cache entry
    fn list_unprocessed(&self) -> impl Future<Output = anyhow::Result<Vec<UnprocessedItem>>> + Send;

    /// Pointed-to cache entries without a usable summary, most recently updated first
    fn list_pending_retry(&self) -> impl Future<Output = anyhow::Result<Vec<PendingItem>>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for Arc<T> {
    async fn init_schema(&self) -> anyhow::Result<()> {
        (**self).init_schema().await
    }

    async fn get_pointer(&self, channel_id: &str) -> anyhow::Result<Option<String>> {
        (**self).get_pointer(channel_id).await
    }

    async fn set_pointer(
        &self,
        channel_id: &str,
        item_id: &str,
        channel_name: &str,
    ) -> anyhow::Result<()> {
        (**self).set_pointer(channel_id, item_id, channel_name).await
    }

    async fn get_cache_entry(&self, item_id: &str) -> anyhow::Result<Option<CacheEntry>> {
        (**self).get_cache_entry(item_id).await
    }

    async fn put_cache_entry(
        &self,
        item_id: &str,
        transcript: &str,
        summary: &SummaryState,
    ) -> anyhow::Result<()> {
        (**self).put_cache_entry(item_id, transcript, summary).await
    }

    async fn list_unprocessed(&self) -> anyhow::Result<Vec<UnprocessedItem>> {
        (**self).list_unprocessed().await
    }

    async fn list_pending_retry(&self) -> anyhow::Result<Vec<PendingItem>> {
        (**self).list_pending_retry().await
    }
}
