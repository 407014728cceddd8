use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const BASE_URL_ENV: &str = "CHATTERM_BASE_URL";
pub const DEFAULT_CONFIG_FILE: &str = "chatterm.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RevealConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessagesConfig {
    #[serde(default = "default_fallback_answer")]
    pub fallback_answer: String,
    #[serde(default = "default_failure_notice")]
    pub failure_notice: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
    #[serde(default = "default_suggestions")]
    pub suggestions: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            start_delay_ms: default_start_delay_ms(),
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            fallback_answer: default_fallback_answer(),
            failure_notice: default_failure_notice(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            suggestions: default_suggestions(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&content).context("failed to parse config toml")?;
        Ok(cfg)
    }

    /// Loads `path` when given, else `./chatterm.toml` if it exists, else
    /// defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::load(&local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn apply_env(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.backend.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.backend.base_url)
            .with_context(|| format!("invalid backend.base_url: {}", self.backend.base_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            bail!("backend.base_url must be http or https: {}", self.backend.base_url);
        }
        if self.messages.failure_notice.trim().is_empty() {
            bail!("messages.failure_notice must not be empty");
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_interval_ms() -> u64 {
    150
}

fn default_start_delay_ms() -> u64 {
    500
}

fn default_fallback_answer() -> String {
    "Hmm... I'll get back to you on that!".to_string()
}

fn default_failure_notice() -> String {
    "Oops! Something went wrong. Try again later.".to_string()
}

fn default_assistant_name() -> String {
    "assistant".to_string()
}

fn default_suggestions() -> Vec<String> {
    vec![
        "Tell me about yourself".to_string(),
        "What can you help me with?".to_string(),
    ]
}
