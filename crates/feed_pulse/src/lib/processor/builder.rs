use feed_datastore::DataStore;

use crate::{
    notify::Notifier,
    types::Channel,
    yt::{ChannelScraper, TranscriptSource},
    FeedProcessor, Summarizer,
};

pub struct FeedProcessorBuilder<D = (), T = (), S = (), N = (), P = ()> {
    store: D,
    transcript_source: T,
    summarizer: S,
    notifier: N,
    channel_scraper: P,
    channels: Vec<Channel>,
    languages: Vec<String>,
}

impl Default for FeedProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedProcessorBuilder {
    pub const DEFAULT_LANGUAGES: [&str; 2] = ["it", "en"];

    pub fn new() -> Self {
        Self {
            store: (),
            transcript_source: (),
            summarizer: (),
            notifier: (),
            channel_scraper: (),
            channels: Vec::new(),
            languages: Self::DEFAULT_LANGUAGES.map(String::from).to_vec(),
        }
    }
}

impl<D, T, S, N, P> FeedProcessorBuilder<D, T, S, N, P> {
    pub fn store<D2: DataStore + Send + Sync + 'static>(
        self,
        store: D2,
    ) -> FeedProcessorBuilder<D2, T, S, N, P> {
        FeedProcessorBuilder {
            store,
            transcript_source: self.transcript_source,
            summarizer: self.summarizer,
            notifier: self.notifier,
            channel_scraper: self.channel_scraper,
            channels: self.channels,
            languages: self.languages,
        }
    }

    pub fn transcript_source<T2: TranscriptSource + Send + Sync + 'static>(
        self,
        transcript_source: T2,
    ) -> FeedProcessorBuilder<D, T2, S, N, P> {
        FeedProcessorBuilder {
            store: self.store,
            transcript_source,
            summarizer: self.summarizer,
            notifier: self.notifier,
            channel_scraper: self.channel_scraper,
            channels: self.channels,
            languages: self.languages,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> FeedProcessorBuilder<D, T, S2, N, P> {
        FeedProcessorBuilder {
            store: self.store,
            transcript_source: self.transcript_source,
            summarizer,
            notifier: self.notifier,
            channel_scraper: self.channel_scraper,
            channels: self.channels,
            languages: self.languages,
        }
    }

    pub fn notifier<N2: Notifier + Send + Sync + 'static>(
        self,
        notifier: N2,
    ) -> FeedProcessorBuilder<D, T, S, N2, P> {
        FeedProcessorBuilder {
            store: self.store,
            transcript_source: self.transcript_source,
            summarizer: self.summarizer,
            notifier,
            channel_scraper: self.channel_scraper,
            channels: self.channels,
            languages: self.languages,
        }
    }

    pub fn channel_scraper<P2: ChannelScraper + Send + Sync + 'static>(
        self,
        channel_scraper: P2,
    ) -> FeedProcessorBuilder<D, T, S, N, P2> {
        FeedProcessorBuilder {
            store: self.store,
            transcript_source: self.transcript_source,
            summarizer: self.summarizer,
            notifier: self.notifier,
            channel_scraper,
            channels: self.channels,
            languages: self.languages,
        }
    }

    pub fn channels(mut self, channels: impl IntoIterator<Item = Channel>) -> Self {
        self.channels = channels.into_iter().collect();
        self
    }

    /// Transcript languages to try, in order of preference
    pub fn languages<L: Into<String>>(mut self, languages: impl IntoIterator<Item = L>) -> Self {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }
}

impl<D, T, S, N, P> FeedProcessorBuilder<D, T, S, N, P>
where
    D: DataStore + Send + Sync + 'static,
    T: TranscriptSource + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
    P: ChannelScraper + Send + Sync + 'static,
{
    pub fn build(self) -> FeedProcessor<D, T, S, N, P> {
        FeedProcessor {
            store: self.store,
            transcript_source: self.transcript_source,
            summarizer: self.summarizer,
            notifier: self.notifier,
            channel_scraper: self.channel_scraper,
            channels: self.channels,
            languages: self.languages,
        }
    }
}
