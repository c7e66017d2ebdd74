//! Boot — logging init, config load, parser creation.

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::args::Args;
use crate::conf::ParserConfig;
use crate::parser::LogfmtParser;

/// Initialise the tracing / logging subsystem. Logs go to stderr so stdout
/// carries only records.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logfmt=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Resolve configuration (flags > env > file > defaults) and build the parser.
pub fn boot(args: &Args) -> Result<LogfmtParser, Box<dyn std::error::Error>> {
    boot_with(args, |name| std::env::var(name).ok())
}

/// [`boot`] with environment variables resolved by `lookup`.
pub fn boot_with<F>(args: &Args, lookup: F) -> Result<LogfmtParser, Box<dyn std::error::Error>>
where
    F: Fn(&str) -> Option<String>,
{
    info!("Starting logfmt v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ParserConfig::resolve(args.config.as_deref(), lookup)?;
    args.apply(&mut config);

    // Validated only once every layer has been applied.
    let parser = config.build_parser().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!(
        "Parser ready: metric_name={:?}, default_tags={}, max_line_size={:?}, fixed_time={:?}",
        config.metric_name,
        config.default_tags.len(),
        config.max_line_size,
        config.fixed_time
    );

    Ok(parser)
}
