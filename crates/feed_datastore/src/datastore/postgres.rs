use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

use crate::{datastore::DataStore, CacheEntry, PendingItem, SummaryState, UnprocessedItem};

static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Clone)]
pub struct PgDataStore {
    pub pool: PgPool,
}

impl PgDataStore {
    /// Creates a lazily connected pool; no connection is made until the
    /// first query.
    pub fn connect_lazy(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)
            .inspect_err(|e| tracing::error!(error = ?e, "Invalid database connection options"))
            .context("Failed to configure postgres pool")?;

        Ok(PgDataStore { pool })
    }
}

#[derive(sqlx::FromRow)]
struct CacheRow {
    video_id: String,
    transcript: String,
    summary: Option<String>,
    summary_status: String,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    access_count: i32,
}

impl TryFrom<CacheRow> for CacheEntry {
    type Error = anyhow::Error;

    fn try_from(row: CacheRow) -> Result<Self, Self::Error> {
        let summary =
            SummaryState::from_columns(&row.summary_status, row.summary, row.failure_reason)
                .with_context(|| format!("Corrupt cache entry for video {}", row.video_id))?;

        Ok(CacheEntry {
            item_id: row.video_id,
            transcript: row.transcript,
            summary,
            created_at: row.created_at,
            updated_at: row.updated_at,
            access_count: row.access_count,
        })
    }
}

impl DataStore for PgDataStore {
    async fn init_schema(&self) -> anyhow::Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to run database migrations"))
            .context("Failed to run database migrations")?;

        Ok(())
    }

    async fn get_pointer(&self, channel_id: &str) -> anyhow::Result<Option<String>> {
        let last_video_id = sqlx::query_scalar::<_, String>(
            "SELECT last_video_id FROM video_state WHERE channel_id = $1",
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, %channel_id, "Failed to fetch last video id");
        })
        .context("Failed to fetch last video id")?;

        Ok(last_video_id)
    }

    async fn set_pointer(
        &self,
        channel_id: &str,
        item_id: &str,
        channel_name: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO video_state (channel_id, channel_name, last_video_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (channel_id)
            DO UPDATE SET
                last_video_id = EXCLUDED.last_video_id,
                channel_name = EXCLUDED.channel_name
            "#,
        )
        .bind(channel_id)
        .bind(channel_name)
        .bind(item_id)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, %channel_id, video_id = %item_id, "Failed to update last video id");
        })
        .context("Failed to update last video id")?;

        Ok(())
    }

    async fn get_cache_entry(&self, item_id: &str) -> anyhow::Result<Option<CacheEntry>> {
        let row = sqlx::query_as::<_, CacheRow>(
            r#"
            UPDATE transcript_cache
            SET access_count = access_count + 1
            WHERE video_id = $1
            RETURNING video_id, transcript, summary, summary_status, failure_reason,
                      created_at, updated_at, access_count
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, video_id = %item_id, "Failed to read cached transcript");
        })
        .context("Failed to read cached transcript")?;

        row.map(CacheEntry::try_from).transpose()
    }

    async fn put_cache_entry(
        &self,
        item_id: &str,
        transcript: &str,
        summary: &SummaryState,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transcript_cache (video_id, transcript, summary, summary_status, failure_reason)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (video_id)
            DO UPDATE SET
                transcript = EXCLUDED.transcript,
                summary = EXCLUDED.summary,
                summary_status = EXCLUDED.summary_status,
                failure_reason = EXCLUDED.failure_reason,
                updated_at = NOW()
            "#,
        )
        .bind(item_id)
        .bind(transcript)
        .bind(summary.summary())
        .bind(summary.status())
        .bind(summary.failure_reason())
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, video_id = %item_id, "Failed to cache transcript");
        })
        .context("Failed to cache transcript")?;

        Ok(())
    }

    async fn list_unprocessed(&self) -> anyhow::Result<Vec<UnprocessedItem>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            last_video_id: String,
            channel_name: String,
            channel_id: String,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT vs.last_video_id, vs.channel_name, vs.channel_id
            FROM video_state vs
            LEFT JOIN transcript_cache tc ON vs.last_video_id = tc.video_id
            WHERE tc.video_id IS NULL
            ORDER BY vs.channel_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "Failed to fetch unprocessed videos"))
        .context("Failed to fetch unprocessed videos")?;

        Ok(rows
            .into_iter()
            .map(|row| UnprocessedItem {
                item_id: row.last_video_id,
                channel_name: row.channel_name,
                channel_id: row.channel_id,
            })
            .collect())
    }

    async fn list_pending_retry(&self) -> anyhow::Result<Vec<PendingItem>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            video_id: String,
            transcript: String,
            channel_name: String,
            channel_id: String,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT tc.video_id, tc.transcript, vs.channel_name, vs.channel_id
            FROM transcript_cache tc
            JOIN video_state vs ON tc.video_id = vs.last_video_id
            WHERE tc.summary_status IN ('failed', 'pending')
            ORDER BY tc.updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "Failed to fetch videos to reprocess"))
        .context("Failed to fetch videos to reprocess")?;

        Ok(rows
            .into_iter()
            .map(|row| PendingItem {
                item_id: row.video_id,
                transcript: row.transcript,
                channel_name: row.channel_name,
                channel_id: row.channel_id,
            })
            .collect())
    }
}
