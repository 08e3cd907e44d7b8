use itertools::Itertools;
use reqwest::Client;
use serde::Deserialize;

use crate::llm::{fallback::GenerativeModel, summarizer::SummarizeError};

/// Google Generative Language API client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    system_instruction: String,
}

impl GeminiClient {
    pub const SYSTEM_PROMPT: &'static str = include_str!("./prompts/system_0.txt");

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            system_instruction: Self::SYSTEM_PROMPT.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the system instruction, trimmed. A blank instruction keeps the
    /// built-in prompt.
    pub fn with_system_instruction(mut self, instruction: impl AsRef<str>) -> Self {
        let instruction = instruction.as_ref().trim();
        if instruction.is_empty() {
            tracing::warn!("System instruction is blank, using the built-in one");
        } else {
            self.system_instruction = instruction.to_string();
        }
        self
    }

    /// Handle on a single model sharing this client's connection pool
    pub fn model(&self, name: impl Into<String>) -> GeminiModel {
        GeminiModel {
            client: self.clone(),
            name: name.into(),
        }
    }

    #[tracing::instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn send_generate_request(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<String, SummarizeError> {
        let body = serde_json::json!({
            "system_instruction": {
                "parts": [{ "text": self.system_instruction }]
            },
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))
            .map_err(|e| classify_transport_error(model, e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(classify_api_error(model, status, &message));
        }

        let response = resp
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| SummarizeError::Failed(format!("{model}: malformed response: {e}")))?;

        response.into_text(model)
    }
}

#[derive(Debug, Clone)]
pub struct GeminiModel {
    client: GeminiClient,
    name: String,
}

impl GenerativeModel for GeminiModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, SummarizeError> {
        self.client.send_generate_request(&self.name, prompt).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self, model: &str) -> Result<String, SummarizeError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(SummarizeError::Failed(format!(
                "{model}: prompt blocked ({reason})"
            )));
        }

        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).join(""))
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(SummarizeError::Failed(format!("{model}: empty response")));
        }

        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

fn classify_transport_error(model: &str, e: reqwest::Error) -> SummarizeError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        SummarizeError::Transient {
            model: model.to_string(),
            message: e.to_string(),
        }
    } else {
        SummarizeError::Failed(format!("{model}: {e}"))
    }
}

/// Maps an error response onto the summarizer's error kinds.
///
/// Gemini reports oversized prompts as a plain 500 INTERNAL whose message
/// asks to reduce the input.
pub fn classify_api_error(model: &str, status: u16, body: &str) -> SummarizeError {
    let (message, api_status) = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|envelope| (envelope.error.message, envelope.error.status))
        .unwrap_or_else(|_| (body.to_string(), String::new()));
    let lower = message.to_lowercase();

    let internal = api_status == "INTERNAL" || lower.contains("internal error");
    let too_long = lower.contains("too long") || lower.contains("reduce your input");

    match status {
        500 if internal && too_long => SummarizeError::ContentTooLong {
            model: model.to_string(),
        },
        429 | 500..=599 => SummarizeError::Transient {
            model: model.to_string(),
            message: format!("HTTP {status}: {message}"),
        },
        _ => SummarizeError::Failed(format!("{model}: HTTP {status}: {message}")),
    }
}
