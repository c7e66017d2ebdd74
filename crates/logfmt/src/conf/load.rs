//! Load — config loading from file and environment variables.

use std::fs;
use std::path::Path;

use super::model::ParserConfig;
use super::ConfigError;

pub const CONFIG_FILE_ENV: &str = "LOGFMT_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "logfmt.toml";

impl ParserConfig {
    /// Merge configuration without validating, so callers can layer further
    /// overrides before `validate()`.
    /// Priority: Environment Variables > Config File > Defaults
    ///
    /// An explicit `path` must exist; otherwise the path comes from
    /// `LOGFMT_CONFIG_FILE` and a missing file means defaults.
    pub fn resolve<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::from_file(path)?
            }
            None => {
                let config_path = lookup(CONFIG_FILE_ENV)
                    .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
                if Path::new(&config_path).exists() {
                    tracing::info!("Loading configuration from: {}", config_path);
                    Self::from_file(&config_path)?
                } else {
                    tracing::info!("Config file not found at {}, using defaults", config_path);
                    Self::default()
                }
            }
        };

        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `LOGFMT_*` overrides; `lookup` resolves a variable name.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("LOGFMT_METRIC_NAME") {
            self.metric_name = name;
        }
        if let Some(max) = lookup("LOGFMT_MAX_LINE_SIZE") {
            let max = max.parse().map_err(|_| {
                ConfigError::Invalid(format!("LOGFMT_MAX_LINE_SIZE is not a number: {:?}", max))
            })?;
            self.max_line_size = Some(max);
        }
        if let Some(at) = lookup("LOGFMT_FIXED_TIME") {
            self.fixed_time = Some(at);
        }
        Ok(())
    }
}
