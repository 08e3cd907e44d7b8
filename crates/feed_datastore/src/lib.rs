//! # DataStore Module
//!
//! This module provides the persistence layer for the channel feed pipeline:
//! a per-channel pointer to the last detected video and a per-video cache of
//! transcripts and summaries.
//!
//! The module uses sqlx for the PostgreSQL backend and also ships an in-memory
//! backend with the same semantics for ephemeral runs and tests.

mod datastore;
mod domain;

pub use datastore::memory::MemoryDataStore;
pub use datastore::postgres::PgDataStore;
pub use datastore::DataStore;
pub use domain::{
    CacheEntry, ChannelPointer, PendingItem, SummaryState, SummaryStateError, UnprocessedItem,
};
