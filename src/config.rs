use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "news.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the Hacker News API, without a trailing slash
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Number of stories picked from the listing
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub fetch_mode: FetchMode,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// How independent item and user requests are issued.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// One request at a time, each awaited before the next.
    #[default]
    Sequential,
    /// All requests in flight at once; first failure wins.
    Concurrent,
}

fn default_api_base_url() -> String {
    "https://hacker-news.firebaseio.com/v0".to_string()
}

fn default_sample_size() -> usize {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            sample_size: default_sample_size(),
            request_timeout_secs: default_request_timeout_secs(),
            fetch_mode: FetchMode::default(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
