//! Conf module — parser configuration model and loading.

pub mod model;
pub mod load;

use thiserror::Error;

pub use model::ParserConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid fixed_time {value:?}: {source}")]
    FixedTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
