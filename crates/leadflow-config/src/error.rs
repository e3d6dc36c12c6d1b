use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse config")]
    ParseStr(#[source] toml::de::Error),

    #[error("invalid URL for '{setting}': '{value}'")]
    InvalidUrl {
        setting: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid value for '{setting}': {reason}")]
    InvalidSetting {
        setting: &'static str,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
