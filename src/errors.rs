use serde::Serialize;
use thiserror::Error;

/// The five ways a generation request can fail. Every one of them is
/// recoverable by the user; none of them ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredential,
    InvalidCredential,
    RateLimited,
    ModelUnavailable,
    Transient,
}

/// A classified generation failure. `Display` is the message shown to the
/// farmer and stored in the transcript, so each one names the problem and
/// the remedy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("No API key configured. Run /set api_key=YOUR_KEY, add {key_name} to {secrets_file}, or export {key_name} in the environment.")]
    MissingCredential { key_name: String, secrets_file: String },

    #[error("The API key was rejected by the model backend. Check it for typos and save a valid one with /set api_key=YOUR_KEY.")]
    InvalidCredential { detail: String },

    #[error("Rate limit or quota reached. Wait about 60 seconds, then send your question again.")]
    RateLimited { detail: String },

    #[error("{}", model_unavailable_message(.model, .available))]
    ModelUnavailable { model: String, available: Vec<String> },

    #[error("Could not get an answer from the model backend. Check your internet connection and try again. (details: {detail})")]
    Transient { detail: String },
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::MissingCredential { .. } => ErrorKind::MissingCredential,
            GenerationError::InvalidCredential { .. } => ErrorKind::InvalidCredential,
            GenerationError::RateLimited { .. } => ErrorKind::RateLimited,
            GenerationError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            GenerationError::Transient { .. } => ErrorKind::Transient,
        }
    }
}

fn model_unavailable_message(model: &str, available: &[String]) -> String {
    let mut msg = format!(
        "The model '{model}' is not served by the backend. Pick another model in the configuration."
    );
    if !available.is_empty() {
        msg.push_str(" Models available to your key: ");
        msg.push_str(&available.join(", "));
    }
    msg
}

/// Map a raw backend error text onto an [`ErrorKind`].
///
/// Rules are checked in order on the lowercased text:
/// - "429" or "quota" => rate limited
/// - "400" or "invalid" => invalid credential
/// - "404" or "not found" => model unavailable
/// - anything else => transient
///
/// These depend on the backend's wording, so keep every substring rule here.
pub fn classify(raw: &str) -> ErrorKind {
    let text = raw.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if has(&["429", "quota"]) {
        ErrorKind::RateLimited
    } else if has(&["400", "invalid"]) {
        ErrorKind::InvalidCredential
    } else if has(&["404", "not found"]) {
        ErrorKind::ModelUnavailable
    } else {
        ErrorKind::Transient
    }
}
