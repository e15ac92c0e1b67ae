//! Runtime configuration for the scraper.
//!
//! Values come from an optional YAML file and are then overridden by
//! command-line flags. Every key is optional; missing keys take the defaults
//! below.
//!
//! ```yaml
//! timeout_secs: 10
//! user_agent: "Mozilla/5.0 ..."
//! concurrency: 4
//! random_slug_suffix: true
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Desktop Chrome identity sent with every fetch.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Hard limit for the single outbound request, in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with the request.
    pub user_agent: String,
    /// Maximum number of scrapes in flight when several URLs are given.
    pub concurrency: usize,
    /// Append a random suffix to `untitled-<millis>` fallback slugs.
    pub random_slug_suffix: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            random_slug_suffix: true,
        }
    }
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply command-line overrides on top of file values.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(secs) = cli.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(ref ua) = cli.user_agent {
            self.user_agent = ua.clone();
        }
        if let Some(n) = cli.concurrency {
            self.concurrency = n;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent must not be empty".into()));
        }
        Ok(())
    }
}

/// Parse a configuration document.
pub fn parse_config(yaml: &str, path: &str) -> Result<ScraperConfig, ConfigError> {
    // An empty file is a valid "all defaults" config.
    if yaml.trim().is_empty() {
        return Ok(ScraperConfig::default());
    }
    serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Load configuration from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<ScraperConfig, ConfigError> {
    let Some(path) = path else {
        debug!("No config file given; using defaults");
        return Ok(ScraperConfig::default());
    };

    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
    let config = parse_config(&yaml, path)?;
    info!(
        path,
        timeout_secs = config.timeout_secs,
        concurrency = config.concurrency,
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.concurrency, 4);
        assert!(config.random_slug_suffix);
        assert!(config.user_agent.contains("Mozilla/5.0"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = parse_config("timeout_secs: 3\n", "inline").unwrap();
        assert_eq!(
            config,
            ScraperConfig {
                timeout_secs: 3,
                ..ScraperConfig::default()
            }
        );
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(parse_config("  \n", "inline").unwrap(), ScraperConfig::default());
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = parse_config("timeout_secs: [nope", "bad.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let cli = Cli::parse_from([
            "sharex_scraper",
            "--timeout-secs",
            "2",
            "--user-agent",
            "TestAgent/1.0",
            "https://example.com/a",
        ]);
        let config = ScraperConfig::default().merge_cli(&cli);
        assert_eq!(config.timeout_secs, 2);
        assert_eq!(config.user_agent, "TestAgent/1.0");
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = ScraperConfig {
            concurrency: 0,
            ..ScraperConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ScraperConfig {
            timeout_secs: 0,
            ..ScraperConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_config_missing_file() {
        let err = load_config(Some("/definitely/not/here.yaml")).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "concurrency: 8\nrandom_slug_suffix: false\n").unwrap();

        let config = load_config(path.to_str()).await.unwrap();
        assert_eq!(config.concurrency, 8);
        assert!(!config.random_slug_suffix);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
