//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP request settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Document store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Rightmove site settings
    #[serde(default)]
    pub rightmove: SiteConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(AppError::validation("store.path is empty"));
        }
        if self.rightmove.hosts.is_empty() {
            return Err(AppError::validation("rightmove.hosts is empty"));
        }
        if !is_identifier(&self.rightmove.marker) {
            return Err(AppError::validation(format!(
                "rightmove.marker '{}' is not an identifier",
                self.rightmove.marker
            )));
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Extra headers sent verbatim with every request
    #[serde(default = "defaults::headers")]
    pub headers: BTreeMap<String, String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            headers: defaults::headers(),
        }
    }
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "defaults::store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: defaults::store_path(),
        }
    }
}

/// Per-site routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Hosts the site's fetcher, parser and store accept
    #[serde(default = "defaults::rightmove_hosts")]
    pub hosts: Vec<String>,

    /// Name of the `window.<NAME>` block holding the listing
    #[serde(default = "defaults::marker")]
    pub marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            hosts: defaults::rightmove_hosts(),
            marker: defaults::marker(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/91.0.4472.124 Safari/537.36"
            .to_string()
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn headers() -> BTreeMap<String, String> {
        [
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
            ),
            ("Accept-Language", "en-GB,en-US;q=0.9,en;q=0.8"),
            ("DNT", "1"),
            ("Connection", "keep-alive"),
            ("Upgrade-Insecure-Requests", "1"),
            ("Sec-Fetch-Dest", "document"),
            ("Sec-Fetch-Mode", "navigate"),
            ("Sec-Fetch-Site", "none"),
            ("Cache-Control", "max-age=0"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    pub fn store_path() -> PathBuf {
        PathBuf::from("houses.db")
    }

    pub fn rightmove_hosts() -> Vec<String> {
        ["rightmove.co.uk", "www.rightmove.co.uk", "media.rightmove.co.uk"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn marker() -> String {
        "PAGE_MODEL".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [fetcher]
            timeout_secs = 5

            [store]
            path = "test.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.fetcher.timeout_secs, 5);
        assert_eq!(config.store.path, PathBuf::from("test.db"));
        assert_eq!(config.rightmove.marker, "PAGE_MODEL");
        assert!(config.fetcher.headers.contains_key("Accept-Language"));
    }

    #[test]
    fn test_validate_rejects_bad_marker() {
        let mut config = Config::default();
        config.rightmove.marker = "PAGE MODEL".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.fetcher.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/houses.toml");
        assert_eq!(config.store.path, PathBuf::from("houses.db"));
    }
}
