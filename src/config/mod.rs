use fs_err as fs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::ProviderKind;
use crate::settings::{self, Settings};

/// Loaded when no `--config` is given and the file exists.
pub const DEFAULT_CONFIG_FILE: &str = "agronova.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid TOML in {}: {source}", path.display())]
    Toml { path: PathBuf, source: toml::de::Error },
    #[error("invalid settings JSON in {}: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("settings file {} must contain a JSON object", path.display())]
    NotAnObject { path: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub root: String,
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub vision_model: Option<String>,
    pub api_base: Option<String>,
    /// Name the credential is looked up under in the secret store and the environment.
    pub credential_key: String,
    pub secrets_file: String,
    pub timeout_secs: u64,
    /// Timeout for auxiliary calls such as model listing.
    pub aux_timeout_secs: u64,
    pub max_image_bytes: usize,
    pub session_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: ".".into(),
            provider: ProviderKind::Gemini,
            model: None,
            vision_model: None,
            api_base: None,
            credential_key: "GOOGLE_API_KEY".into(),
            secrets_file: ".streamlit/secrets.toml".into(),
            timeout_secs: 120,
            aux_timeout_secs: 5,
            max_image_bytes: 10 * 1024 * 1024,
            session_dir: ".agronova/sessions".into(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })
    }

    /// An explicit path must exist; otherwise fall back to [`DEFAULT_CONFIG_FILE`]
    /// in the working directory, then to built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn model(&self) -> String {
        self.model.clone().unwrap_or_else(|| self.provider.default_model().to_string())
    }

    pub fn vision_model(&self) -> String {
        self.vision_model
            .clone()
            .unwrap_or_else(|| self.provider.default_vision_model().to_string())
    }

    pub fn api_base(&self) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| self.provider.default_api_base().to_string())
    }

    /// Secrets file resolved against `root`.
    pub fn secrets_path(&self) -> PathBuf {
        Path::new(&self.root).join(&self.secrets_file)
    }

    pub fn session_root(&self) -> PathBuf {
        Path::new(&self.root).join(&self.session_dir)
    }
}

/// Read a stored settings record and run it through [`settings::initialize`],
/// so files written before newer fields existed still load.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
    match value.as_object() {
        Some(record) => Ok(settings::initialize(Some(record))),
        None => Err(ConfigError::NotAnObject { path: path.to_path_buf() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider = \"ollama\"\nmodel = \"mistral\"\ntimeout_secs = 30").unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Ollama);
        assert_eq!(cfg.model(), "mistral");
        assert_eq!(cfg.vision_model(), "llava");
        assert_eq!(cfg.api_base(), "http://localhost:11434");
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.aux_timeout_secs, 5);
        assert_eq!(cfg.credential_key, "GOOGLE_API_KEY");
    }

    #[test]
    fn retired_keys_are_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "schema_version = \"2026-10-01\"\nprovider = \"openai\"").unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.provider, ProviderKind::OpenAI);

        let written = toml::to_string(&Config::default()).unwrap();
        assert!(!written.contains("schema_version"), "{written}");
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_or_default(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn bad_toml_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider = [").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn settings_file_is_default_filled() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "state": "Punjab", "crop": "Rice" }}"#).unwrap();

        let s = load_settings(file.path()).unwrap();
        assert_eq!(s.location.region, "Punjab");
        assert_eq!(s.crop, "Rice");
        assert_eq!(s.language, "English");
    }

    #[test]
    fn settings_file_must_be_an_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        let err = load_settings(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject { .. }));
    }

    #[test]
    fn paths_resolve_against_root() {
        let cfg = Config { root: "/srv/farm".into(), ..Config::default() };
        assert_eq!(cfg.secrets_path(), PathBuf::from("/srv/farm/.streamlit/secrets.toml"));
        assert_eq!(cfg.session_root(), PathBuf::from("/srv/farm/.agronova/sessions"));
    }
}
