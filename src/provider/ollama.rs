use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{decode, endpoint, read_body, transport, BackendError, GenerationRequest, Provider};

/// Local Ollama server. No credential is sent; the resolver still has to
/// produce one, any non-empty value will do.
pub struct Ollama {
    url: String,
    client: Client,
    aux_timeout: Duration,
}

impl Ollama {
    pub fn new(url: String, client: Client, aux_timeout: Duration) -> Self {
        Self { url, client, aux_timeout }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: String,
}

#[derive(Deserialize)]
struct Tags {
    #[serde(default)]
    models: Vec<Tag>,
}

#[derive(Deserialize)]
struct Tag {
    name: String,
}

#[async_trait]
impl Provider for Ollama {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate(&self, req: &GenerationRequest<'_>) -> Result<String, BackendError> {
        let url = endpoint(&self.url, "api/chat");
        let body = ChatRequest {
            model: req.model,
            messages: vec![Msg {
                role: "user",
                content: req.prompt,
                images: req.image.map(|img| vec![img.base64()]).unwrap_or_default(),
            }],
            stream: false,
        };

        debug!(%url, model = req.model, image = req.image.is_some(), "ollama chat");

        let resp = self.client.post(&url).json(&body).send().await.map_err(transport)?;
        let text = read_body(resp).await?;
        let parsed: ChatResponse = decode(&text)?;
        Ok(parsed.message.content)
    }

    async fn list_models(&self, _credential: &str) -> Result<Vec<String>, BackendError> {
        let url = endpoint(&self.url, "api/tags");
        let resp = self
            .client
            .get(&url)
            .timeout(self.aux_timeout)
            .send()
            .await
            .map_err(transport)?;
        let text = read_body(resp).await?;
        let parsed: Tags = decode(&text)?;
        Ok(parsed.models.into_iter().map(|t| t.name).collect())
    }
}
