//! Configuration for talking to a traffic manager.
//!
//! Sources, lowest priority first: built-in defaults, a TOML file,
//! `STINGRAY__<SECTION>__<KEY>` environment variables, then command-line
//! overrides. See [`loader::load_config`].

pub mod loader;
pub mod settings;

pub use loader::{ConfigOverrides, DEFAULT_CONFIG_FILE, ENV_PREFIX, load_config};
pub use settings::{AppConfig, ConnectionConfig, LoggingConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("config build error: {0}")]
    Build(#[from] config::ConfigError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
