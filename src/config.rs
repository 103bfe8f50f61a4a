//! Configuration management
//!
//! Settings come from an optional `~/.kestrel/config.json`, then the
//! environment overrides them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::agent::llm::{ProviderRegistry, ProviderSpec};
use crate::error::Error;
use crate::Result;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider to use ("openrouter" or "openai")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for the selected provider
    #[serde(default)]
    pub api_key: String,

    /// Chat completions base URL; provider default when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum model rounds per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Shell tool timeout
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

fn default_provider() -> String {
    "openrouter".to_string()
}

fn default_model() -> String {
    "anthropic/claude-haiku-4.5".to_string()
}

fn default_max_iterations() -> usize {
    20
}

fn default_tool_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            base_url: None,
            model: default_model(),
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

impl Config {
    /// Provider settings for the configured provider name
    pub fn provider_spec(&self) -> Result<&'static ProviderSpec> {
        ProviderRegistry::spec(&self.provider).ok_or_else(|| {
            Error::Config(format!(
                "Unknown provider: {} (available: {})",
                self.provider,
                ProviderRegistry::available().join(", ")
            ))
        })
    }

    /// Base URL to send requests to
    pub fn resolved_base_url(&self) -> Result<String> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => Ok(self.provider_spec()?.default_base_url.to_string()),
        }
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = var("KESTREL_PROVIDER") {
            self.provider = provider;
        }

        // Provider credentials only apply once the provider is known.
        if let Some(spec) = ProviderRegistry::spec(&self.provider) {
            if let Some(key) = var(spec.api_key_env) {
                self.api_key = key;
            }
            if let Some(url) = var(spec.base_url_env) {
                self.base_url = Some(url);
            }
        }

        if let Some(url) = var("KESTREL_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(model) = var("KESTREL_MODEL") {
            self.model = model;
        }
        if let Some(raw) = var("KESTREL_MAX_ITERATIONS") {
            self.max_iterations = parse_number("KESTREL_MAX_ITERATIONS", &raw)?;
        }
        if let Some(raw) = var("KESTREL_TOOL_TIMEOUT_SECS") {
            self.tool_timeout_secs = parse_number("KESTREL_TOOL_TIMEOUT_SECS", &raw)?;
        }

        Ok(())
    }

    /// Check the configuration before any network call is made
    pub fn validate(&self) -> Result<()> {
        let spec = self.provider_spec()?;

        if self.api_key.is_empty() {
            return Err(Error::Config(format!("{} is not set", spec.api_key_env)));
        }
        if self.max_iterations == 0 {
            return Err(Error::Config("max_iterations must be at least 1".to_string()));
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a positive integer, got {:?}", key, raw)))
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kestrel")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from file and environment, then validate it
pub fn load() -> Result<Config> {
    let path = config_path();

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)?
    } else {
        Config::default()
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}
