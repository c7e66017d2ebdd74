//! Args — command line surface of the `logfmt` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::conf::ParserConfig;

/// Parse logfmt input and print one JSON record per line.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "logfmt", version)]
pub struct Args {
    /// Files to parse; reads stdin when none are given
    pub files: Vec<PathBuf>,

    /// TOML config file (overrides LOGFMT_CONFIG_FILE)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Name stamped on every record
    #[arg(long, short = 'n')]
    pub metric_name: Option<String>,

    /// RFC 3339 timestamp used instead of the current time
    #[arg(long)]
    pub fixed_time: Option<String>,

    /// Reject lines longer than this many bytes
    #[arg(long)]
    pub max_line_size: Option<usize>,
}

impl Args {
    /// Command line flags take priority over file and environment settings.
    pub fn apply(&self, config: &mut ParserConfig) {
        if let Some(name) = &self.metric_name {
            config.metric_name = name.clone();
        }
        if let Some(at) = &self.fixed_time {
            config.fixed_time = Some(at.clone());
        }
        if let Some(max) = self.max_line_size {
            config.max_line_size = Some(max);
        }
    }
}
