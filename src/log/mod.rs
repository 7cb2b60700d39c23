use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::errors::{ErrorKind, GenerationError};
use crate::transcript::Transcript;

/// Install the global subscriber. `RUST_LOG` wins when set; otherwise
/// `warn`, or `debug` for this crate with `--debug`.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "warn,agronova=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Serialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
}

/// One exchange as written to disk. Credentials never appear here.
#[derive(Debug, Serialize)]
pub struct TurnRecord<'a> {
    pub session: Uuid,
    pub at: DateTime<Utc>,
    pub provider: &'a str,
    pub model: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
}

impl<'a> TurnRecord<'a> {
    pub fn new(
        session: Uuid,
        provider: &'a str,
        model: &'a str,
        prompt: &'a str,
        outcome: &'a Result<String, GenerationError>,
    ) -> Self {
        let (response, error) = match outcome {
            Ok(text) => (Some(text.as_str()), None),
            Err(e) => (None, Some(ErrorRecord { kind: e.kind(), message: e.to_string() })),
        };
        Self { session, at: Utc::now(), provider, model, prompt, response, error }
    }
}

/// Per-session artifact directory: `{root}/{session}/turn-N.json` and
/// `transcript.json`.
pub struct SessionArtifacts {
    dir: PathBuf,
    next_turn: usize,
}

impl SessionArtifacts {
    pub fn new(root: &Path, session: Uuid) -> Self {
        Self { dir: root.join(session.to_string()), next_turn: 1 }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_turn(&mut self, record: &TurnRecord<'_>) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let p = self.dir.join(format!("turn-{}.json", self.next_turn));
        fs::write(&p, to_string_pretty(record)?)?;
        self.next_turn += 1;
        Ok(p)
    }

    /// Best-effort [`save_turn`](Self::save_turn): a write failure is logged
    /// and the session carries on. Returns whether the record was written.
    pub fn record_turn(&mut self, record: &TurnRecord<'_>) -> bool {
        match self.save_turn(record) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "saved turn");
                true
            }
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "could not save turn");
                false
            }
        }
    }

    pub fn save_transcript(&self, transcript: &Transcript) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let p = self.dir.join("transcript.json");
        fs::write(&p, to_string_pretty(transcript)?)?;
        Ok(p)
    }
}
