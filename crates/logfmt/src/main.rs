use clap::Parser;
use logfmt::runtime::{args::Args, boot, run};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    boot::init_logging();
    let parser = boot::boot(&args)?;
    run::run(&parser, &args.files)?;
    tracing::info!(metrics = ?parser.metrics().snapshot(), "Parser metrics");
    Ok(())
}
