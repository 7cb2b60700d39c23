//! Credential resolution across the session, the secret store and the
//! process environment.

use fs_err as fs;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::config::{Config, ConfigError};
use crate::settings::Settings;

/// A read-only, string-keyed source of secrets.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Secrets from a TOML file of top-level `KEY = "value"` pairs, the layout of
/// a Streamlit `secrets.toml`. A missing file is an empty store.
#[derive(Default)]
pub struct TomlSecrets {
    values: HashMap<String, String>,
}

impl TomlSecrets {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            debug!(path = %path.display(), "no secrets file");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let table: toml::Table = toml::from_str(&raw)
            .map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })?;

        let values = table
            .into_iter()
            .filter_map(|(k, v)| match v {
                toml::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect();
        Ok(Self { values })
    }
}

impl SecretStore for TomlSecrets {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// The process environment, read at lookup time.
pub struct ProcessEnv;

impl SecretStore for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl SecretStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Session,
    SecretStore,
    Environment,
}

/// Resolves the backend credential. Precedence, first non-blank wins:
/// 1. the credential typed into the session settings
/// 2. the secret store
/// 3. the process environment
pub struct CredentialResolver {
    key_name: String,
    secrets_label: String,
    secrets: Box<dyn SecretStore>,
    env: Box<dyn SecretStore>,
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("key_name", &self.key_name)
            .field("secrets_label", &self.secrets_label)
            .finish_non_exhaustive()
    }
}

impl CredentialResolver {
    pub fn new(
        key_name: impl Into<String>,
        secrets_label: impl Into<String>,
        secrets: Box<dyn SecretStore>,
        env: Box<dyn SecretStore>,
    ) -> Self {
        Self {
            key_name: key_name.into(),
            secrets_label: secrets_label.into(),
            secrets,
            env,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let path = cfg.secrets_path();
        let secrets = TomlSecrets::load(&path)?;
        Ok(Self::new(
            cfg.credential_key.clone(),
            cfg.secrets_file.clone(),
            Box::new(secrets),
            Box::new(ProcessEnv),
        ))
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Where the secret store lives, for user-facing messages.
    pub fn secrets_label(&self) -> &str {
        &self.secrets_label
    }

    pub fn resolve(&self, settings: &Settings) -> Option<String> {
        self.resolve_with_source(settings).map(|(key, _)| key)
    }

    pub fn resolve_with_source(&self, settings: &Settings) -> Option<(String, CredentialSource)> {
        let found = non_blank(settings.credential.clone())
            .map(|k| (k, CredentialSource::Session))
            .or_else(|| {
                non_blank(self.secrets.get(&self.key_name)).map(|k| (k, CredentialSource::SecretStore))
            })
            .or_else(|| {
                non_blank(self.env.get(&self.key_name)).map(|k| (k, CredentialSource::Environment))
            });

        match &found {
            Some((_, source)) => debug!(?source, key = %self.key_name, "credential resolved"),
            None => debug!(key = %self.key_name, "no credential in any source"),
        }
        found
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const KEY: &str = "GOOGLE_API_KEY";

    fn store(value: Option<&str>) -> Box<dyn SecretStore> {
        let mut map = HashMap::new();
        if let Some(v) = value {
            map.insert(KEY.to_string(), v.to_string());
        }
        Box::new(map)
    }

    fn resolver(secret: Option<&str>, env: Option<&str>) -> CredentialResolver {
        CredentialResolver::new(KEY, "secrets.toml", store(secret), store(env))
    }

    fn with_session(key: Option<&str>) -> Settings {
        Settings { credential: key.map(String::from), ..Settings::default() }
    }

    #[test]
    fn session_key_wins_over_everything() {
        let r = resolver(Some("from-secrets"), Some("from-env"));
        assert_eq!(
            r.resolve_with_source(&with_session(Some("from-session"))),
            Some(("from-session".to_string(), CredentialSource::Session))
        );
    }

    #[test]
    fn secret_store_wins_over_environment() {
        let r = resolver(Some("from-secrets"), Some("from-env"));
        assert_eq!(
            r.resolve_with_source(&with_session(None)),
            Some(("from-secrets".to_string(), CredentialSource::SecretStore))
        );
    }

    #[test]
    fn environment_is_last_resort() {
        let r = resolver(None, Some("from-env"));
        assert_eq!(
            r.resolve_with_source(&with_session(None)),
            Some(("from-env".to_string(), CredentialSource::Environment))
        );
    }

    #[test]
    fn blank_values_are_skipped() {
        let r = resolver(Some("   "), Some(" from-env "));
        assert_eq!(r.resolve(&with_session(Some(""))).as_deref(), Some("from-env"));
    }

    #[test]
    fn nothing_anywhere_is_none() {
        let r = resolver(None, None);
        assert_eq!(r.resolve(&with_session(None)), None);
    }

    #[test]
    fn toml_secrets_reads_string_keys_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GOOGLE_API_KEY = \"abc123\"\nRETRIES = 3\n[section]\nX = \"y\"").unwrap();

        let secrets = TomlSecrets::load(file.path()).unwrap();
        assert_eq!(secrets.get(KEY).as_deref(), Some("abc123"));
        assert_eq!(secrets.get("RETRIES"), None);
        assert_eq!(secrets.get("X"), None);
    }

    #[test]
    fn missing_secrets_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let secrets = TomlSecrets::load(&dir.path().join("secrets.toml")).unwrap();
        assert_eq!(secrets.get(KEY), None);
    }

    #[test]
    #[serial]
    fn process_env_is_read_at_lookup_time() {
        let name = "AGRONOVA_TEST_CREDENTIAL";
        std::env::remove_var(name);
        assert_eq!(ProcessEnv.get(name), None);
        std::env::set_var(name, "env-value");
        assert_eq!(ProcessEnv.get(name).as_deref(), Some("env-value"));
        std::env::remove_var(name);
    }

    #[test]
    fn debug_does_not_expose_stores() {
        let r = resolver(Some("from-secrets"), None);
        let shown = format!("{r:?}");
        assert!(!shown.contains("from-secrets"));
        assert!(shown.contains(KEY));
    }
}
