//! Configuration file management
//!
//! `CLIConfiguration` with TOML parsing for ~/.fleet/config.toml
//!
//! # Configuration Format
//!
//! ```toml
//! [server]
//! url = "https://fleet.example.com/api"  # Fleet backend API base URL
//! timeout = 30                           # REST request timeout (seconds)
//!
//! [auth]
//! jwt_token = "your-jwt-token"
//!
//! [connection]
//! reconnect_delay_ms = 5000              # Fixed delay between stream retries
//! max_reconnect_attempts = 2             # Consecutive failures before polling
//! fallback_poll_interval_ms = 60000      # Unread-count poll once streaming gave up
//!
//! [monitoring]
//! security_poll_interval_ms = 30000      # Suspicious-movement poll
//! bell = true                            # Terminal bell on new alerts
//!
//! [ui]
//! color = true
//! ```

use fleet_link::ConnectionOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CLIError, Result};

/// CLI configuration loaded from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CLIConfiguration {
    /// Server connection settings
    pub server: Option<ServerConfig>,

    /// Authentication settings
    pub auth: Option<AuthConfig>,

    /// Stream reconnection and fallback settings
    pub connection: Option<ConnectionConfig>,

    /// Security alert settings
    pub monitoring: Option<MonitoringConfig>,

    /// UI preferences
    pub ui: Option<UIConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Backend API base URL (e.g., http://localhost:8080/api)
    pub url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT authentication token
    pub jwt_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Fixed delay between stream reconnection attempts in milliseconds (default: 5000)
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Consecutive stream failures before switching to polling (default: 2)
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Unread-count poll interval in milliseconds once polling (default: 60000)
    #[serde(default = "default_fallback_poll_interval_ms")]
    pub fallback_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Suspicious-movement poll interval in milliseconds (default: 30000)
    #[serde(default = "default_security_poll_interval_ms")]
    pub security_poll_interval_ms: u64,

    /// Ring the terminal bell on new alerts
    #[serde(default = "default_bell")]
    pub bell: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIConfig {
    /// Enable colored output
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_timeout() -> u64 {
    30
}

fn default_reconnect_delay_ms() -> u64 {
    ConnectionOptions::default().reconnect_delay_ms
}

fn default_max_reconnect_attempts() -> u32 {
    ConnectionOptions::default().max_reconnect_attempts
}

fn default_fallback_poll_interval_ms() -> u64 {
    ConnectionOptions::default().fallback_poll_interval_ms
}

fn default_security_poll_interval_ms() -> u64 {
    ConnectionOptions::default().security_poll_interval_ms
}

fn default_bell() -> bool {
    true
}

fn default_color() -> bool {
    true
}

impl Default for CLIConfiguration {
    fn default() -> Self {
        Self {
            server: Some(ServerConfig {
                url: Some("http://localhost:8080/api".to_string()),
                timeout: default_timeout(),
            }),
            auth: None,
            connection: Some(ConnectionConfig {
                reconnect_delay_ms: default_reconnect_delay_ms(),
                max_reconnect_attempts: default_max_reconnect_attempts(),
                fallback_poll_interval_ms: default_fallback_poll_interval_ms(),
            }),
            monitoring: Some(MonitoringConfig {
                security_poll_interval_ms: default_security_poll_interval_ms(),
                bell: default_bell(),
            }),
            ui: Some(UIConfig {
                color: default_color(),
            }),
        }
    }
}

pub fn expand_config_path(path: &Path) -> PathBuf {
    let path_str = path.to_str().unwrap_or("~/.fleet/config.toml");
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    }
    path.to_path_buf()
}

pub fn default_config_path() -> PathBuf {
    expand_config_path(Path::new("~/.fleet/config.toml"))
}

impl CLIConfiguration {
    /// Load configuration from file
    ///
    /// Returns default configuration if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_config_path(path);
        let path = &expanded_path;

        if !path.exists() {
            log::debug!("No config file at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            CLIError::ConfigurationError(format!("Failed to read config file: {}", e))
        })?;

        let config: CLIConfiguration = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let expanded_path = expand_config_path(path);
        let path = &expanded_path;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CLIError::ConfigurationError(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Build ConnectionOptions from CLI configuration
    pub fn to_connection_options(&self) -> ConnectionOptions {
        let mut options = ConnectionOptions::default();

        if let Some(ref conn) = self.connection {
            options = options
                .with_reconnect_delay_ms(conn.reconnect_delay_ms)
                .with_max_reconnect_attempts(conn.max_reconnect_attempts)
                .with_fallback_poll_interval_ms(conn.fallback_poll_interval_ms);
        }

        if let Some(ref monitoring) = self.monitoring {
            options = options.with_security_poll_interval_ms(monitoring.security_poll_interval_ms);
        }

        options
    }

    pub fn resolved_server(&self) -> ServerConfig {
        self.server.clone().unwrap_or(ServerConfig {
            url: None,
            timeout: default_timeout(),
        })
    }

    pub fn resolved_monitoring(&self) -> MonitoringConfig {
        self.monitoring.clone().unwrap_or(MonitoringConfig {
            security_poll_interval_ms: default_security_poll_interval_ms(),
            bell: default_bell(),
        })
    }

    pub fn resolved_ui(&self) -> UIConfig {
        self.ui.clone().unwrap_or(UIConfig {
            color: default_color(),
        })
    }

    pub fn jwt_token(&self) -> Option<&str> {
        self.auth.as_ref().and_then(|auth| auth.jwt_token.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CLIConfiguration::default();
        assert_eq!(
            config.resolved_server().url,
            Some("http://localhost:8080/api".to_string())
        );
        assert!(config.resolved_monitoring().bell);
        assert!(config.resolved_ui().color);
        assert!(config.jwt_token().is_none());
    }

    #[test]
    fn test_to_connection_options_defaults() {
        let options = CLIConfiguration::default().to_connection_options();
        assert_eq!(options, ConnectionOptions::default());
    }

    #[test]
    fn test_partial_file() {
        let config: CLIConfiguration = toml::from_str(
            r#"
            [server]
            url = "https://fleet.example.com/api"

            [auth]
            jwt_token = "abc"

            [connection]
            max_reconnect_attempts = 4

            [monitoring]
            bell = false
            "#,
        )
        .unwrap();

        assert_eq!(config.resolved_server().timeout, 30);
        assert_eq!(config.jwt_token(), Some("abc"));
        assert!(!config.resolved_monitoring().bell);
        assert!(config.ui.is_none());
        assert!(config.resolved_ui().color);

        let options = config.to_connection_options();
        assert_eq!(options.max_reconnect_attempts, 4);
        assert_eq!(options.reconnect_delay_ms, 5000);
        assert_eq!(options.security_poll_interval_ms, 30_000);
    }

    #[test]
    fn test_config_serialization() {
        let toml = toml::to_string(&CLIConfiguration::default()).unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[connection]"));
        assert!(toml.contains("reconnect_delay_ms"));
        assert!(toml.contains("[monitoring]"));
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = CLIConfiguration::default();
        config.monitoring.as_mut().unwrap().security_poll_interval_ms = 10_000;
        config.save(&path).unwrap();

        let loaded = CLIConfiguration::load(&path).unwrap();
        assert_eq!(loaded.to_connection_options().security_poll_interval_ms, 10_000);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CLIConfiguration::load(&dir.path().join("absent.toml")).unwrap();
        assert!(config.server.is_some());
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nurl = ").unwrap();
        assert!(matches!(
            CLIConfiguration::load(&path),
            Err(CLIError::ConfigurationError(_))
        ));
    }
}
