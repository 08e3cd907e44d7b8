use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use feed_pulse::yt::TranscriptSource;

#[derive(Clone, Default)]
pub struct MockTranscriptSource {
    /// (video id, language) -> transcript
    pub transcripts: HashMap<(String, String), String>,
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    pub fail_with: Option<String>,
}

impl MockTranscriptSource {
    pub fn with_transcript(mut self, video_id: &str, language: &str, text: &str) -> Self {
        self.transcripts
            .insert((video_id.to_string(), language.to_string()), text.to_string());
        self
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl TranscriptSource for MockTranscriptSource {
    type Error = anyhow::Error;

    async fn fetch_transcript(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Option<String>, Self::Error> {
        self.calls
            .lock()
            .unwrap()
            .push((video_id.to_string(), language.to_string()));
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self
            .transcripts
            .get(&(video_id.to_string(), language.to_string()))
            .cloned())
    }
}
