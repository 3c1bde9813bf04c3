use std::path::PathBuf;

use config::{Config, Environment, File};

use crate::{AppConfig, ConfigError};

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "stingray.toml";

/// Prefix of environment overrides, e.g. `STINGRAY__CONNECTION__PORT=9071`.
pub const ENV_PREFIX: &str = "STINGRAY";

/// Values given on the command line. `None` leaves lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub timeout_secs: Option<u64>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub api_version: Option<String>,
    pub verify_tls: Option<bool>,
    pub log_level: Option<String>,
}

/// Build the effective configuration and validate it.
///
/// An explicit `path` must exist. Without one, `stingray.toml` in the working
/// directory is used if present.
pub fn load_config(
    path: Option<&str>,
    overrides: &ConfigOverrides,
) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();
    match path {
        Some(p) => {
            let pathbuf = PathBuf::from(p);
            if !pathbuf.exists() {
                return Err(ConfigError::NotFound(p.to_string()));
            }
            builder = builder.add_source(File::from(pathbuf));
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path));
            }
        }
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );

    builder = builder
        .set_override_option("connection.server", overrides.server.clone())?
        .set_override_option("connection.port", overrides.port)?
        .set_override_option("connection.timeout_secs", overrides.timeout_secs)?
        .set_override_option("connection.user", overrides.user.clone())?
        .set_override_option("connection.password", overrides.password.clone())?
        .set_override_option("connection.api_version", overrides.api_version.clone())?
        .set_override_option("connection.verify_tls", overrides.verify_tls)?
        .set_override_option("logging.level", overrides.log_level.clone())?;

    let merged: AppConfig = builder.build()?.try_deserialize()?;
    merged.validate().map_err(ConfigError::Validation)?;

    tracing::debug!(
        server = %merged.connection.server,
        port = merged.connection.port,
        api_version = %merged.connection.api_version,
        "configuration loaded"
    );
    Ok(merged)
}
