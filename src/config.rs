//! Daemon configuration loaded from `triaged.toml`.
//!
//! Values absent from the file use sensible defaults. The `LLM_API_KEY`
//! environment variable takes precedence over the file for the API key.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration loaded from `triaged.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TriagedConfig {
    /// API key for the chat completion provider.
    #[serde(default)]
    pub api_key: String,

    /// Full completion endpoint URL, including any deployment path and
    /// api-version query the provider requires.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model or deployment identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for classification calls.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token cap for classification calls.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Catch-all department used when no better match exists.
    #[serde(default = "default_fallback_department")]
    pub fallback_department: String,

    /// Skills assumed when retrying selection in the fallback department.
    #[serde(default = "default_fallback_skills")]
    pub fallback_skills: Vec<String>,

    /// Source URL for staff directory refreshes.
    #[serde(default)]
    pub staff_source_url: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    400
}

fn default_fallback_department() -> String {
    "Admin".to_string()
}

fn default_fallback_skills() -> Vec<String> {
    vec!["general support".to_string()]
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for TriagedConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            fallback_department: default_fallback_department(),
            fallback_skills: default_fallback_skills(),
            staff_source_url: String::new(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl TriagedConfig {
    /// Load configuration from `triaged.toml` in the current directory,
    /// falling back to defaults if the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("triaged.toml"))
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<TriagedConfig>(&contents)?
        } else {
            Self::default()
        };

        // Environment takes precedence over the file for the API key.
        if let Ok(key) = std::env::var("LLM_API_KEY")
            && !key.is_empty()
        {
            config.api_key = key;
        }

        Ok(config)
    }
}
