//! Configuration loading for Pharmyx.
//! Reads pharmyx.toml from the current directory or the path in PHARMYX_CONFIG.
//! Every field has a default, so a missing file means built-in defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pharmyx_common::confidence::ConfidenceWeights;
use pharmyx_llm::backend::{OllamaBackend, OpenAiCompatibleBackend, DEFAULT_MODEL, GROQ_BASE_URL};
use pharmyx_llm::LlmBackend;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "PHARMYX_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "pharmyx.toml";
pub const API_KEY_ENVS: [&str; 2] = ["PHARMYX_LLM_API_KEY", "GROQ_API_KEY"];

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub scoring: ConfidenceWeights,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind()             -> String { "127.0.0.1".to_string() }
fn default_port()             -> u16    { 3000 }
fn default_max_upload_bytes() -> usize  { 5 * 1024 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Optional replacements for the built-in rule tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TablesConfig {
    pub phenotypes: Option<PathBuf>,
    pub drug_rules: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// "openai-compatible" | "ollama"
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub advisory_enabled: bool,
}

fn bool_true()            -> bool   { true }
fn default_provider()     -> String { "openai-compatible".to_string() }
fn default_base_url()     -> String { GROQ_BASE_URL.to_string() }
fn default_model()        -> String { DEFAULT_MODEL.to_string() }
fn default_temperature()  -> f32    { 0.2 }
fn default_top_p()        -> f32    { 0.9 }
fn default_timeout_secs() -> u64    { 20 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: bool_true(),
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_secs: default_timeout_secs(),
            advisory_enabled: false,
        }
    }
}

fn deserialize_secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.filter(|k| !k.trim().is_empty()).map(SecretString::from))
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Fill `api_key` from the first non-empty variable in [`API_KEY_ENVS`]
    /// when the file did not set one.
    pub fn resolve_api_key(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_some() {
            return;
        }
        self.api_key = API_KEY_ENVS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|v| !v.trim().is_empty())
            .map(SecretString::from);
    }

    /// Backend for this configuration, or None when the LLM collaborators
    /// are off or cannot be reached without credentials.
    pub fn build_backend(self) -> Option<Arc<dyn LlmBackend>> {
        if !self.enabled {
            info!("LLM collaborators disabled by configuration");
            return None;
        }
        match self.provider.as_str() {
            "ollama" => Some(Arc::new(OllamaBackend::new(self.base_url, self.model))),
            "openai-compatible" => match self.api_key {
                Some(key) => Some(Arc::new(OpenAiCompatibleBackend::new(
                    self.base_url,
                    self.model,
                    Some(key),
                ))),
                None => {
                    warn!("No LLM API key configured; explanations will use the fallback narrative");
                    None
                }
            },
            other => {
                warn!(provider = %other, "Unknown LLM provider; explanations will use the fallback narrative");
                None
            }
        }
    }
}


impl Config {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if !config.scoring.validate() {
            anyhow::bail!("[scoring] weights must be non-negative and sum to 1.0 with saturation > 0");
        }
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            info!(path = %path.display(), "Loading configuration");
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)?
        } else {
            info!(path = %path.display(), "Config file not found; using defaults");
            Self::default()
        };
        config.llm.resolve_api_key(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from pharmyx.toml.
    /// Checks PHARMYX_CONFIG first, then the current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }
}
