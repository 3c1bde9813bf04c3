use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const REDACTED: &str = "********";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        let conn = &self.connection;
        if conn.server.trim().is_empty() {
            return Err("connection.server must be set".into());
        }
        if conn.port == 0 {
            return Err("connection.port must be > 0".into());
        }
        if conn.timeout_secs == 0 {
            return Err("connection.timeout_secs must be > 0".into());
        }
        if conn.user.is_empty() {
            return Err("connection.user must be set".into());
        }
        if conn.password.is_empty() {
            return Err("connection.password must be set".into());
        }
        if !matches!(conn.api_version.as_str(), "2.0" | "3.0") {
            return Err("connection.api_version must be one of 2.0, 3.0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    /// Effective configuration rendered as TOML with the password masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if !shown.connection.password.is_empty() {
            shown.connection.password = REDACTED.into();
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Traffic managers usually ship self-signed certificates.
    #[serde(default)]
    pub verify_tls: bool,
}

fn default_port() -> u16 {
    9070
}
fn default_timeout_secs() -> u64 {
    3
}
fn default_api_version() -> String {
    "3.0".into()
}

impl ConnectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            user: String::new(),
            password: String::new(),
            api_version: default_api_version(),
            verify_tls: false,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("timeout_secs", &self.timeout_secs)
            .field("user", &self.user)
            .field("password", &REDACTED)
            .field("api_version", &self.api_version)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "warn".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
