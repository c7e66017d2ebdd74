//! Model — ParserConfig and its validation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::clock::FixedClock;
use crate::parser::LogfmtParser;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Name stamped on every record (may be empty)
    pub metric_name: String,
    /// Reject lines longer than this many bytes
    pub max_line_size: Option<usize>,
    /// RFC 3339 instant used instead of the wall clock
    pub fixed_time: Option<String>,
    /// Tags copied onto every record
    pub default_tags: BTreeMap<String, String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            metric_name: "".to_string(),
            max_line_size: None,
            fixed_time: None,
            default_tags: BTreeMap::new(),
        }
    }
}

impl ParserConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_line_size == Some(0) {
            return Err(ConfigError::Invalid("max_line_size must be > 0".to_string()));
        }
        if self.default_tags.keys().any(|k| k.is_empty()) {
            return Err(ConfigError::Invalid("default_tags keys must not be empty".to_string()));
        }
        self.fixed_time()?;
        Ok(())
    }

    /// The parsed `fixed_time`, if one is configured.
    pub fn fixed_time(&self) -> Result<Option<DateTime<Utc>>, ConfigError> {
        self.fixed_time
            .as_deref()
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|source| ConfigError::FixedTime {
                        value: s.to_string(),
                        source,
                    })
            })
            .transpose()
    }

    /// Build a parser from this configuration.
    pub fn build_parser(&self) -> Result<LogfmtParser, ConfigError> {
        self.validate()?;

        let mut parser = LogfmtParser::new(self.metric_name.clone())
            .with_default_tags(self.default_tags.clone());
        if let Some(max) = self.max_line_size {
            parser = parser.with_max_line_size(max);
        }
        if let Some(at) = self.fixed_time()? {
            parser = parser.with_clock(FixedClock(at));
        }
        Ok(parser)
    }
}
