use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
    Ollama,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::OpenAI => "gpt-4o-mini",
            ProviderKind::Ollama => "llama3.2",
        }
    }

    pub fn default_vision_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::OpenAI => "gpt-4o-mini",
            ProviderKind::Ollama => "llava",
        }
    }

    pub fn default_api_base(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::OpenAI => "https://api.openai.com",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "agronova", version, about = "AI farming assistant: ask questions in the context of your farm settings")]
pub struct Args {
    /// TOML configuration file (defaults to ./agronova.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON file with initial farm settings
    #[arg(long)]
    pub settings: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    /// Model used when an image is attached
    #[arg(long)]
    pub vision_model: Option<String>,

    #[arg(long)]
    pub api_base: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Ask a single question and exit
    #[arg(long)]
    pub query: Option<String>,

    /// Image (png/jpg) to attach to the first question
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Write each exchange and the final transcript under the session directory
    #[arg(long, default_value_t = false)]
    pub save_transcript: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl Args {
    /// Flags given on the command line win over the configuration file.
    pub fn apply_to(&self, cfg: &mut Config) {
        if let Some(p) = self.provider {
            cfg.provider = p;
        }
        if let Some(m) = &self.model {
            cfg.model = Some(m.clone());
        }
        if let Some(m) = &self.vision_model {
            cfg.vision_model = Some(m.clone());
        }
        if let Some(b) = &self.api_base {
            cfg.api_base = Some(b.clone());
        }
        if let Some(t) = self.timeout_secs {
            cfg.timeout_secs = t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "agronova",
            "--provider",
            "openai",
            "--model",
            "gpt-4.1-mini",
            "--timeout-secs",
            "30",
        ]);
        let mut cfg = Config::default();
        args.apply_to(&mut cfg);
        assert_eq!(cfg.provider, ProviderKind::OpenAI);
        assert_eq!(cfg.model(), "gpt-4.1-mini");
        assert_eq!(cfg.vision_model(), "gpt-4o-mini");
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let args = Args::parse_from(["agronova"]);
        let mut cfg = Config::default();
        args.apply_to(&mut cfg);
        assert_eq!(cfg.provider, ProviderKind::Gemini);
        assert_eq!(cfg.model(), "gemini-1.5-flash");
    }

    #[test]
    fn google_alias_selects_gemini() {
        let args = Args::parse_from(["agronova", "--provider", "google"]);
        assert_eq!(args.provider, Some(ProviderKind::Gemini));
    }
}
