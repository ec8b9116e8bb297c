//! Stdio debug adapter for linetrace scripts.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use linetrace_debug::DebugAdapter;
use linetrace_runtime::RuntimeConfig;

#[derive(Debug, Parser)]
#[command(name = "linetrace-debug", version, about = "Debug adapter for linetrace scripts")]
struct Args {
    /// Path to a `linetrace.toml` config file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Let code compiled from strings suspend and appear in stacks.
    #[arg(long)]
    show_dynamic_code: bool,

    /// Do not suspend on uncaught script exceptions.
    #[arg(long)]
    no_stop_on_exception: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    if args.show_dynamic_code {
        config.tracer.show_dynamic_code = true;
    }
    if args.no_stop_on_exception {
        config.tracer.suspend_on_exception = false;
    }

    info!("Starting linetrace-debug adapter");
    let mut adapter = DebugAdapter::stdio(config);
    adapter.run_stdio().context("debug adapter stopped")?;
    Ok(())
}
