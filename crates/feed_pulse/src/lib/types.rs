use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset};
use feed_datastore::{PendingItem, UnprocessedItem};

use crate::error::Error;

const WATCH_BASE_URL: &str = "https://www.youtube.com/watch";

pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_BASE_URL}?v={video_id}")
}

/// A monitored channel, configured as `NAME=CHANNEL_ID`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    pub id: String,
}

impl Channel {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, id) = s
            .split_once('=')
            .map(|(name, id)| (name.trim(), id.trim()))
            .filter(|(name, id)| !name.is_empty() && !id.is_empty())
            .ok_or_else(|| Error::InvalidChannel(s.to_string()))?;

        Ok(Channel::new(name, id))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.id)
    }
}

/// A single `<entry>` of a channel's video feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub video_id: String,
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<FixedOffset>>,
}

/// A parsed channel feed; entries are in feed order, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelFeed {
    pub channel_title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

/// A video travelling through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub item_id: String,
    pub title: String,
    pub link: String,
    pub channel_name: String,
    pub channel_id: String,
    pub transcript: Option<String>,
}

impl VideoInfo {
    /// Recovery scans only know the video id; title and link are synthesized
    fn recovered(item_id: String, channel_name: String, channel_id: String) -> Self {
        VideoInfo {
            title: format!("Video from {channel_name}"),
            link: watch_url(&item_id),
            item_id,
            channel_name,
            channel_id,
            transcript: None,
        }
    }

    pub fn from_feed_entry(entry: FeedEntry, channel_name: &str, channel_id: &str) -> Self {
        VideoInfo {
            item_id: entry.video_id,
            title: entry.title,
            link: entry.link,
            channel_name: channel_name.to_string(),
            channel_id: channel_id.to_string(),
            transcript: None,
        }
    }
}

impl From<UnprocessedItem> for VideoInfo {
    fn from(item: UnprocessedItem) -> Self {
        VideoInfo::recovered(item.item_id, item.channel_name, item.channel_id)
    }
}

impl From<PendingItem> for VideoInfo {
    fn from(item: PendingItem) -> Self {
        VideoInfo {
            transcript: Some(item.transcript),
            ..VideoInfo::recovered(item.item_id, item.channel_name, item.channel_id)
        }
    }
}
