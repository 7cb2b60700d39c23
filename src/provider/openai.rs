use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{decode, endpoint, read_body, transport, BackendError, GenerationRequest, Provider};

/// OpenAI-compatible chat completions. The whole prompt goes out as a single
/// user message, with the image as a `data:` URL part when present.
pub struct OpenAI {
    api_base: String,
    client: Client,
    aux_timeout: Duration,
}

impl OpenAI {
    pub fn new(api_base: String, client: Client, aux_timeout: Duration) -> Self {
        Self { api_base, client, aux_timeout }
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

fn user_content(req: &GenerationRequest<'_>) -> Value {
    match req.image {
        None => Value::from(req.prompt),
        Some(img) => json!([
            { "type": "text", "text": req.prompt },
            { "type": "image_url", "image_url": { "url": img.data_url() } }
        ]),
    }
}

#[async_trait]
impl Provider for OpenAI {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, req: &GenerationRequest<'_>) -> Result<String, BackendError> {
        let url = endpoint(&self.api_base, "v1/chat/completions");
        let body = json!({
            "model": req.model,
            "messages": [{ "role": "user", "content": user_content(req) }],
        });

        debug!(%url, model = req.model, image = req.image.is_some(), "openai chat completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(req.credential)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let text = read_body(resp).await?;
        let parsed: ChatResponse = decode(&text)?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| BackendError::Decode("no choices returned".into()))
    }

    async fn list_models(&self, credential: &str) -> Result<Vec<String>, BackendError> {
        let url = endpoint(&self.api_base, "v1/models");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(credential)
            .timeout(self.aux_timeout)
            .send()
            .await
            .map_err(transport)?;
        let text = read_body(resp).await?;
        let parsed: ModelList = decode(&text)?;
        Ok(parsed.data.into_iter().map(|m| m.id).collect())
    }
}
