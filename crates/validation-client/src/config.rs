//! Client connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Connection configuration for one validation server.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server URL. An empty URL disables the entry.
    pub url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Optional display name for logs; derived from the URL when unset.
    pub name: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            request_timeout: default_request_timeout(),
            name: None,
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.url.is_empty()
    }

    /// Display name for logs.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.url.clone())
    }
}

/// Configuration for the shared validation work pool client.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolClientConfig {
    pub enabled: bool,
    pub url: String,
    pub request_timeout: Duration,
}

impl Default for PoolClientConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl PoolClientConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_disabled() {
        assert!(!ClientConfig::default().is_enabled());
        assert!(ClientConfig::new("http://localhost:8549").is_enabled());
    }

    #[test]
    fn pool_disabled_by_default() {
        assert!(!PoolClientConfig::default().is_enabled());
    }
}
