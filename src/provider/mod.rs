use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use thiserror::Error;

use crate::attachment::ImageAttachment;
use crate::cli::ProviderKind;
use crate::config::Config;

pub mod gemini;
pub mod ollama;
pub mod openai;

/// A backend failure as text. The message keeps the HTTP status code and the
/// backend's own wording because [`crate::errors::classify`] reads both.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub image: Option<&'a ImageAttachment>,
    pub credential: &'a str,
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Text completion, multimodal when the request carries an image.
    async fn generate(&self, req: &GenerationRequest<'_>) -> Result<String, BackendError>;

    /// Models the credential can use. Auxiliary; callers treat failure as "unknown".
    async fn list_models(&self, credential: &str) -> Result<Vec<String>, BackendError>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(cfg: &Config) -> anyhow::Result<DynProvider> {
    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()?;
    let aux_timeout = Duration::from_secs(cfg.aux_timeout_secs);
    let api_base = cfg.api_base();

    let provider: DynProvider = match cfg.provider {
        ProviderKind::Gemini => Box::new(gemini::Gemini::new(api_base, client, aux_timeout)),
        ProviderKind::OpenAI => Box::new(openai::OpenAI::new(api_base, client, aux_timeout)),
        ProviderKind::Ollama => Box::new(ollama::Ollama::new(api_base, client, aux_timeout)),
    };
    Ok(provider)
}

pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Transport failure text without the request URL. A base URL or model name
/// can carry digits like `4000` or `8404` that the classifier would misread,
/// so only the error and its causes are kept.
pub(crate) fn transport(e: reqwest::Error) -> BackendError {
    let e = e.without_url();
    let mut detail = e.to_string();
    let mut cause = std::error::Error::source(&e);
    while let Some(c) = cause {
        let text = c.to_string();
        if !detail.ends_with(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        cause = std::error::Error::source(c);
    }
    BackendError::Transport(detail)
}

/// Body of a successful response, or a `Status` error carrying the body text.
pub(crate) async fn read_body(resp: Response) -> Result<String, BackendError> {
    let status = resp.status();
    let text = resp.text().await.map_err(transport)?;
    tracing::debug!(%status, bytes = text.len(), "backend response");
    if status.is_success() {
        Ok(text)
    } else {
        Err(BackendError::Status { status: status.as_u16(), body: text })
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, BackendError> {
    serde_json::from_str(text).map_err(|e| BackendError::Decode(format!("{e}; body: {text}")))
}
