use chrono::{DateTime, Utc};

/// Last video detected on a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPointer {
    pub channel_id: String,
    pub channel_name: String,
    pub last_item_id: String,
}

/// Outcome of summarizing a cached transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryState {
    /// A generated summary
    Ok(String),
    /// The transcript is stored but summarization has not completed
    Pending,
    /// Summarization failed with the given reason
    Failed(String),
    /// The video had no transcript when it was processed; nothing to summarize
    NoTranscript,
}

#[derive(Debug, thiserror::Error)]
pub enum SummaryStateError {
    #[error("Unknown summary status: {0}")]
    UnknownStatus(String),
    #[error("Summary status 'ok' without a summary")]
    MissingSummary,
}

impl SummaryState {
    pub const STATUS_OK: &'static str = "ok";
    pub const STATUS_PENDING: &'static str = "pending";
    pub const STATUS_FAILED: &'static str = "failed";
    pub const STATUS_UNAVAILABLE: &'static str = "unavailable";

    pub fn status(&self) -> &'static str {
        match self {
            SummaryState::Ok(_) => Self::STATUS_OK,
            SummaryState::Pending => Self::STATUS_PENDING,
            SummaryState::Failed(_) => Self::STATUS_FAILED,
            SummaryState::NoTranscript => Self::STATUS_UNAVAILABLE,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            SummaryState::Ok(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            SummaryState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Pending and failed summaries are picked up again by the recovery scan
    pub fn needs_reprocessing(&self) -> bool {
        matches!(self, SummaryState::Pending | SummaryState::Failed(_))
    }

    /// Rebuilds the state from its stored columns
    pub fn from_columns(
        status: &str,
        summary: Option<String>,
        failure_reason: Option<String>,
    ) -> Result<Self, SummaryStateError> {
        match status {
            Self::STATUS_OK => summary
                .map(SummaryState::Ok)
                .ok_or(SummaryStateError::MissingSummary),
            Self::STATUS_PENDING => Ok(SummaryState::Pending),
            Self::STATUS_FAILED => Ok(SummaryState::Failed(failure_reason.unwrap_or_default())),
            Self::STATUS_UNAVAILABLE => Ok(SummaryState::NoTranscript),
            other => Err(SummaryStateError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub item_id: String,
    pub transcript: String,
    pub summary: SummaryState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_count: i32,
}

/// A channel's last detected video that has no cache entry yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnprocessedItem {
    pub item_id: String,
    pub channel_name: String,
    pub channel_id: String,
}

/// A cached video whose summary needs to be generated again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem {
    pub item_id: String,
    pub transcript: String,
    pub channel_name: String,
    pub channel_id: String,
}
