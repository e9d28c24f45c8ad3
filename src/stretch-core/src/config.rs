use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for a search server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ClientConfig {
    /// Base URL, optionally with a path prefix (e.g. `http://proxy/es/`)
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub insecure_skip_verify: bool,

    // Basic auth is only sent when a username is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("stretch/", env!("CARGO_PKG_VERSION")).to_string()
}

impl ClientConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Default settings pointed at `url`
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            insecure_skip_verify: false,
            username: None,
            password: None,
            user_agent: default_user_agent(),
        }
    }
}
