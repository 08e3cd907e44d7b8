use std::ops::Deref;

use reqwest_middleware::ClientWithMiddleware;

use crate::{http::retrying_client, parser::YtFeedDocument, yt::ChannelScraper};

pub struct Scraper(pub ClientWithMiddleware);

impl Default for Scraper {
    fn default() -> Self {
        Scraper(retrying_client())
    }
}

impl Deref for Scraper {
    type Target = ClientWithMiddleware;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ChannelScraper for Scraper {
    const FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";

    #[tracing::instrument(skip(self))]
    async fn scrape_feed(&self, channel_id: &str) -> anyhow::Result<YtFeedDocument> {
        let resp = self
            .get(format!("{}?channel_id={channel_id}", Self::FEED_URL))
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch channel feed"))?;

        if !resp.status().is_success() {
            anyhow::bail!(
                "Feed request for channel {channel_id} failed with status {}",
                resp.status()
            );
        }

        Ok(resp.text().await?.into())
    }
}
