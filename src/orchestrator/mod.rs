//! Turns (settings, question, optional image) into a backend request and a
//! classified outcome.

use tracing::{debug, warn};

use crate::attachment::ImageAttachment;
use crate::credentials::CredentialResolver;
use crate::errors::{classify, ErrorKind, GenerationError};
use crate::prompt;
use crate::provider::{DynProvider, GenerationRequest};
use crate::settings::Settings;
use crate::transcript::Transcript;

pub struct Orchestrator {
    provider: DynProvider,
    credentials: CredentialResolver,
    model: String,
    vision_model: String,
}

impl Orchestrator {
    pub fn new(provider: DynProvider, credentials: CredentialResolver, model: String, vision_model: String) -> Self {
        Self { provider, credentials, model, vision_model }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Model used for a request with or without an image.
    pub fn model_for(&self, with_image: bool) -> &str {
        if with_image {
            &self.vision_model
        } else {
            &self.model
        }
    }

    pub fn resolve_credential(&self, settings: &Settings) -> Option<String> {
        self.credentials.resolve(settings)
    }

    /// One request to the backend, no retries. The backend's text comes back
    /// unmodified; every failure comes back classified.
    pub async fn generate(
        &self,
        query: &str,
        image: Option<&ImageAttachment>,
        settings: &Settings,
    ) -> Result<String, GenerationError> {
        let credential = self.resolve_credential(settings).ok_or_else(|| GenerationError::MissingCredential {
            key_name: self.credentials.key_name().to_string(),
            secrets_file: self.credentials.secrets_label().to_string(),
        })?;

        let full_prompt = prompt::build_prompt(settings, query);
        let model = self.model_for(image.is_some());
        let req = GenerationRequest { model, prompt: &full_prompt, image, credential: &credential };

        match self.provider.generate(&req).await {
            Ok(text) => Ok(text),
            Err(e) => {
                let detail = e.to_string();
                let kind = classify(&detail);
                debug!(?kind, %detail, "generation failed");
                Err(match kind {
                    ErrorKind::RateLimited => GenerationError::RateLimited { detail },
                    ErrorKind::InvalidCredential => GenerationError::InvalidCredential { detail },
                    ErrorKind::ModelUnavailable => GenerationError::ModelUnavailable {
                        model: model.to_string(),
                        available: self.available_models(&credential).await,
                    },
                    ErrorKind::Transient | ErrorKind::MissingCredential => GenerationError::Transient { detail },
                })
            }
        }
    }

    /// Runs [`Self::generate`] and records the exchange whichever way it went:
    /// failed requests store the user-facing error message as the response.
    pub async fn ask(
        &self,
        transcript: &mut Transcript,
        query: &str,
        image: Option<&ImageAttachment>,
        settings: &Settings,
    ) -> Result<String, GenerationError> {
        let outcome = self.generate(query, image, settings).await;
        match &outcome {
            Ok(text) => transcript.append_turn(query, text.as_str()),
            Err(e) => transcript.append_turn(query, e.to_string()),
        };
        outcome
    }

    async fn available_models(&self, credential: &str) -> Vec<String> {
        match self.provider.list_models(credential).await {
            Ok(models) => models,
            Err(e) => {
                warn!(error = %e, "could not list models");
                Vec::new()
            }
        }
    }
}
