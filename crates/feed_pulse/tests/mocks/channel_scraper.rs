use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use feed_pulse::{parser::YtFeedDocument, yt::ChannelScraper};

#[derive(Clone, Default)]
pub struct MockChannelScraper {
    /// channel id -> feed document
    pub feeds: HashMap<String, String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockChannelScraper {
    pub fn with_feed(mut self, channel_id: &str, xml: String) -> Self {
        self.feeds.insert(channel_id.to_string(), xml);
        self
    }

    pub fn from_fixture(channel_id: &str) -> Self {
        Self::default().with_feed(channel_id, include_str!("../fixtures/feed.xml").to_string())
    }
}

/// Minimal uploads feed; `entries` are (video id, title), newest first
pub fn feed_xml(channel_title: &str, entries: &[(&str, &str)]) -> String {
    let entries = entries
        .iter()
        .map(|(id, title)| {
            format!(
                "<entry><yt:videoId>{id}</yt:videoId><title>{title}</title>\
                 <link rel=\"alternate\" href=\"https://www.youtube.com/watch?v={id}\"/></entry>"
            )
        })
        .collect::<String>();
    format!("<feed><title>{channel_title}</title>{entries}</feed>")
}

impl ChannelScraper for MockChannelScraper {
    const FEED_URL: &'static str = "https://youtube.com/mock/feeds";

    async fn scrape_feed(&self, channel_id: &str) -> anyhow::Result<YtFeedDocument> {
        self.calls.lock().unwrap().push(channel_id.to_string());
        self.feeds
            .get(channel_id)
            .cloned()
            .map(YtFeedDocument::new)
            .ok_or_else(|| anyhow::anyhow!("Feed request for channel {} failed with status 404", channel_id))
    }
}
