use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{decode, endpoint, read_body, transport, BackendError, GenerationRequest, Provider};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Generative Language API (`generateContent`).
pub struct Gemini {
    api_base: String,
    client: Client,
    aux_timeout: Duration,
}

impl Gemini {
    pub fn new(api_base: String, client: Client, aux_timeout: Duration) -> Self {
        Self { api_base, client, aux_timeout }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[async_trait]
impl Provider for Gemini {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, req: &GenerationRequest<'_>) -> Result<String, BackendError> {
        let url = endpoint(&self.api_base, &format!("v1beta/models/{}:generateContent", req.model));

        let mut parts = vec![Part::Text { text: req.prompt }];
        if let Some(img) = req.image {
            parts.push(Part::Inline {
                inline_data: InlineData { mime_type: img.mime, data: img.base64() },
            });
        }
        let body = GenerateRequest { contents: vec![Content { role: "user", parts }] };

        debug!(%url, model = req.model, image = req.image.is_some(), "gemini generateContent");

        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, req.credential)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let text = read_body(resp).await?;
        let parsed: GenerateResponse = decode(&text)?;

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "none given".to_string());
            BackendError::Decode(format!("no candidates returned (block reason: {reason})"))
        })?;

        Ok(candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }

    async fn list_models(&self, credential: &str) -> Result<Vec<String>, BackendError> {
        let url = endpoint(&self.api_base, "v1beta/models");
        debug!(%url, "gemini list models");

        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, credential)
            .timeout(self.aux_timeout)
            .send()
            .await
            .map_err(transport)?;
        let text = read_body(resp).await?;
        let parsed: ModelList = decode(&text)?;

        Ok(parsed
            .models
            .into_iter()
            .filter(|m| m.supported_generation_methods.iter().any(|g| g == "generateContent"))
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}
