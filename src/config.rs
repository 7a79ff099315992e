//! Server configuration file support.
//!
//! Configuration is read from a `woms.toml` file when present, with
//! environment variables taking precedence over file values. Every field
//! has a default so the server can start with no configuration at all.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

/// HTTP bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Rate limiter housekeeping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Interval between expired-entry sweeps, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            )
        })?;

        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        Ok(config)
    }

    /// Load configuration from the default locations, falling back to
    /// defaults when no file exists.
    ///
    /// Searches for `woms.toml` in:
    /// 1. Current directory
    /// 2. Parent directory
    pub fn from_default_location() -> Self {
        let search_paths = [PathBuf::from("woms.toml"), PathBuf::from("../woms.toml")];

        for path in search_paths {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::default()
    }

    /// Apply environment-variable overrides on top of file/default values.
    ///
    /// Recognized variables: `HOST`, `PORT`, `RATE_LIMIT_SWEEP_SECS`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = env::var("PORT").ok().and_then(|s| s.parse().ok()) {
            self.server.port = port;
        }
        if let Some(secs) = env::var("RATE_LIMIT_SWEEP_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.rate_limit.sweep_interval_secs = secs;
        }
        self
    }

    /// The socket address string to bind, e.g. `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rate_limit.sweep_interval_secs, 60);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9090

[rate_limit]
sweep_interval_secs = 30
"#;

        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.rate_limit.sweep_interval_secs, 30);
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let toml = r#"
[server]
port = 3000
"#;

        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.rate_limit.sweep_interval_secs, 60);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }
}
