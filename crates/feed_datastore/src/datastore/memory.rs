use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::{
    datastore::DataStore, CacheEntry, ChannelPointer, PendingItem, SummaryState, UnprocessedItem,
};

/// In-process store with the same query semantics as [`crate::PgDataStore`].
/// Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    schema_initialized: bool,
    pointers: HashMap<String, ChannelPointer>,
    cache: HashMap<String, StoredEntry>,
    // monotonic write counter; wall clock ties are common in tests
    revision: u64,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    entry: CacheEntry,
    revision: u64,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> anyhow::Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory datastore lock poisoned"))
    }

    pub fn schema_initialized(&self) -> bool {
        self.state().map(|s| s.schema_initialized).unwrap_or(false)
    }

    /// Reads a cache entry without touching its access counter
    pub fn peek_cache_entry(&self, item_id: &str) -> Option<CacheEntry> {
        self.state()
            .ok()
            .and_then(|s| s.cache.get(item_id).map(|stored| stored.entry.clone()))
    }

    pub fn pointers(&self) -> Vec<ChannelPointer> {
        self.state()
            .map(|s| {
                s.pointers
                    .values()
                    .cloned()
                    .sorted_by(|a, b| a.channel_id.cmp(&b.channel_id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl DataStore for MemoryDataStore {
    async fn init_schema(&self) -> anyhow::Result<()> {
        self.state()?.schema_initialized = true;
        Ok(())
    }

    async fn get_pointer(&self, channel_id: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .state()?
            .pointers
            .get(channel_id)
            .map(|p| p.last_item_id.clone()))
    }

    async fn set_pointer(
        &self,
        channel_id: &str,
        item_id: &str,
        channel_name: &str,
    ) -> anyhow::Result<()> {
        self.state()?.pointers.insert(
            channel_id.to_string(),
            ChannelPointer {
                channel_id: channel_id.to_string(),
                channel_name: channel_name.to_string(),
                last_item_id: item_id.to_string(),
            },
        );
        Ok(())
    }

    async fn get_cache_entry(&self, item_id: &str) -> anyhow::Result<Option<CacheEntry>> {
        let mut state = self.state()?;
        Ok(state.cache.get_mut(item_id).map(|stored| {
            stored.entry.access_count += 1;
            stored.entry.clone()
        }))
    }

    async fn put_cache_entry(
        &self,
        item_id: &str,
        transcript: &str,
        summary: &SummaryState,
    ) -> anyhow::Result<()> {
        let mut state = self.state()?;
        state.revision += 1;
        let revision = state.revision;
        let now: DateTime<Utc> = Utc::now();

        state
            .cache
            .entry(item_id.to_string())
            .and_modify(|stored| {
                stored.entry.transcript = transcript.to_string();
                stored.entry.summary = summary.clone();
                stored.entry.updated_at = now;
                stored.revision = revision;
            })
            .or_insert_with(|| StoredEntry {
                entry: CacheEntry {
                    item_id: item_id.to_string(),
                    transcript: transcript.to_string(),
                    summary: summary.clone(),
                    created_at: now,
                    updated_at: now,
                    access_count: 0,
                },
                revision,
            });

        Ok(())
    }

    async fn list_unprocessed(&self) -> anyhow::Result<Vec<UnprocessedItem>> {
        let state = self.state()?;
        Ok(state
            .pointers
            .values()
            .filter(|p| !state.cache.contains_key(&p.last_item_id))
            .sorted_by(|a, b| a.channel_id.cmp(&b.channel_id))
            .map(|p| UnprocessedItem {
                item_id: p.last_item_id.clone(),
                channel_name: p.channel_name.clone(),
                channel_id: p.channel_id.clone(),
            })
            .collect())
    }

    async fn list_pending_retry(&self) -> anyhow::Result<Vec<PendingItem>> {
        let state = self.state()?;
        Ok(state
            .pointers
            .values()
            .filter_map(|p| {
                state
                    .cache
                    .get(&p.last_item_id)
                    .filter(|stored| stored.entry.summary.needs_reprocessing())
                    .map(|stored| (p, stored))
            })
            .sorted_by(|(_, a), (_, b)| b.revision.cmp(&a.revision))
            .map(|(p, stored)| PendingItem {
                item_id: stored.entry.item_id.clone(),
                transcript: stored.entry.transcript.clone(),
                channel_name: p.channel_name.clone(),
                channel_id: p.channel_id.clone(),
            })
            .collect())
    }
}
