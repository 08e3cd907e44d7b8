use serde::Deserialize;

use crate::{
    http::retrying_client,
    notify::{Notifier, NotifyError},
};

/// Telegram rejects messages longer than this many characters
pub const MAX_MESSAGE_CHARS: usize = 4096;

pub struct TelegramNotifier {
    client: reqwest_middleware::ClientWithMiddleware,
    token: String,
    chat_id: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl AsRef<str>) -> Self {
        Self {
            client: retrying_client(),
            token: token.into(),
            chat_id: chat_id
                .as_ref()
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string(),
            base_url: "https://api.telegram.org".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(self.method_url(method))
            .form(&params)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ApiResponse>(&body).ok();

        if (200..300).contains(&status) && parsed.as_ref().map_or(true, |r| r.ok) {
            return Ok(());
        }

        let mut message = parsed.and_then(|r| r.description).unwrap_or(body);
        if message.to_lowercase().contains("chat not found") {
            message.push_str(&format!(
                " (chat id: {}; make sure the bot was added to the channel as an administrator)",
                self.chat_id
            ));
        }
        Err(NotifyError::Api { status, message })
    }
}

impl Notifier for TelegramNotifier {
    #[tracing::instrument(skip(self), fields(chat_id = %self.chat_id))]
    async fn check_reachable(&self) -> bool {
        if let Err(e) = self.call("getMe", &[]).await {
            tracing::error!(error = %e, "Telegram bot verification failed");
            return false;
        }
        if let Err(e) = self.call("getChat", &[("chat_id", self.chat_id.as_str())]).await {
            tracing::error!(error = %e, "Telegram channel verification failed");
            return false;
        }
        tracing::info!("Telegram bot and channel verified");
        true
    }

    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn post(&self, text: &str) -> Result<(), NotifyError> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let params = [("chat_id", self.chat_id.as_str()), ("text", chunk.as_str())];
            self.call("sendMessage", &params)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "Failed to send Telegram message"))?;
        }
        Ok(())
    }
}

/// Splits `text` into chunks of at most `max_chars` characters, preferring
/// line boundaries and falling back to hard cuts for overlong lines.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            let mut pieces = chars.chunks(max_chars).peekable();
            while let Some(piece) = pieces.next() {
                let piece: String = piece.iter().collect();
                if pieces.peek().is_some() {
                    chunks.push(piece);
                } else {
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }

    chunks
        .into_iter()
        .map(|c| c.trim_end().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}
