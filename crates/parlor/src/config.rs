//! Application configuration loaded from a TOML file.
//!
//! Missing config files are created with defaults on first run, so a bare
//! `parlor` invocation always starts with something sensible and leaves a
//! file behind for the operator to edit.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use session_gateway::GatewayConfig;
use std::path::Path;
use tracing::info;

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gateway and network configuration
    pub server: ServerSettings,
    /// Connection authorization
    pub auth: AuthSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    pub bind_address: String,
    /// Connection limits
    pub max_connections: usize,
    /// Heartbeat ping interval in milliseconds
    pub ping_interval_ms: u64,
    /// Read deadline in milliseconds; must exceed the ping interval
    pub read_timeout_ms: u64,
    /// Data frame write deadline in milliseconds
    pub write_timeout_ms: u64,
    /// Control frame write deadline in milliseconds
    pub control_timeout_ms: u64,
    /// Maximum inbound frame size in bytes
    pub max_frame_bytes: usize,
    /// Browser origins allowed to connect
    pub allowed_origins: Vec<String>,
    /// Whether to use SO_REUSEPORT for multi-threaded accept loops
    pub use_reuse_port: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Shared-secret bearer token. Absent means open access.
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter
    pub level: String,
    /// JSON formatting
    pub json_format: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let gateway = GatewayConfig::default();
        Self {
            server: ServerSettings {
                bind_address: gateway.bind_address.to_string(),
                max_connections: gateway.max_connections,
                ping_interval_ms: gateway.ping_interval_ms,
                read_timeout_ms: gateway.read_timeout_ms,
                write_timeout_ms: gateway.write_timeout_ms,
                control_timeout_ms: gateway.control_timeout_ms,
                max_frame_bytes: gateway.max_frame_bytes,
                allowed_origins: gateway.allowed_origins,
                use_reuse_port: gateway.use_reuse_port,
            },
            auth: AuthSettings { bearer_token: None },
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from file, creating a default file if none exists.
    pub async fn load_from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading config file {}", path.display()))?;
            let config: AppConfig = toml::from_str(&content)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)
                .context("serializing default configuration")?;
            tokio::fs::write(path, toml_content)
                .await
                .with_context(|| format!("writing default config file {}", path.display()))?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self
            .server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(format!(
                "Invalid bind address: {}",
                self.server.bind_address
            ));
        }

        if self.server.read_timeout_ms <= self.server.ping_interval_ms {
            return Err(format!(
                "read_timeout_ms ({}) must exceed ping_interval_ms ({}) or healthy peers get disconnected",
                self.server.read_timeout_ms, self.server.ping_interval_ms
            ));
        }

        if self.server.max_frame_bytes == 0 {
            return Err("max_frame_bytes must be greater than zero".to_string());
        }

        if let Some(token) = &self.auth.bearer_token {
            if token.is_empty() {
                return Err("bearer_token must not be empty when set".to_string());
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            ));
        }

        Ok(())
    }

    /// Convert to the gateway's configuration type.
    pub fn to_gateway_config(&self) -> Result<GatewayConfig> {
        Ok(GatewayConfig {
            bind_address: self
                .server
                .bind_address
                .parse()
                .context("parsing bind address")?,
            max_connections: self.server.max_connections,
            ping_interval_ms: self.server.ping_interval_ms,
            read_timeout_ms: self.server.read_timeout_ms,
            write_timeout_ms: self.server.write_timeout_ms,
            control_timeout_ms: self.server.control_timeout_ms,
            max_frame_bytes: self.server.max_frame_bytes,
            allowed_origins: self.server.allowed_origins.clone(),
            use_reuse_port: self.server.use_reuse_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_config_validates_and_converts() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let gateway = config.to_gateway_config().unwrap();
        assert_eq!(gateway.max_connections, 1000);
        assert_eq!(gateway.ping_interval_ms, 30_000);
    }

    #[tokio::test]
    async fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.server.bind_address = "invalid".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.read_timeout_ms = config.server.ping_interval_ms;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.auth.bearer_token = Some(String::new());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parlor.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert!(path.exists());
        assert!(config.validate().is_ok());

        // A second load reads the file that was just written.
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.server.bind_address, config.server.bind_address);
    }
}
