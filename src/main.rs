//! Entry point for the registry relay service.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use registry_relay::search::PollPolicy;
use registry_relay::{RelayConfig, RelayPipeline, server};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let mut config = RelayConfig::from_env().context("invalid environment configuration")?;
    apply_overrides(&mut config, &args);
    debug!(?config, "configuration loaded");

    let addr = config.listen_addr().await?;
    let pipeline = RelayPipeline::from_config(&config).context("failed to build relay pipeline")?;

    info!(
        concurrency = config.concurrency,
        max_poll_attempts = config.poll.max_attempts(),
        poll_delay_secs = config.poll.delay().as_secs(),
        "registry relay starting"
    );

    server::serve(addr, pipeline)
        .await
        .with_context(|| format!("server on {addr} failed"))?;
    Ok(())
}

fn apply_overrides(config: &mut RelayConfig, args: &Args) {
    if let Some(host) = &args.host {
        config.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = usize::from(concurrency);
    }
    if args.max_poll_attempts.is_some() || args.poll_delay_secs.is_some() {
        config.poll = PollPolicy::new(
            args.max_poll_attempts
                .unwrap_or_else(|| config.poll.max_attempts()),
            args.poll_delay_secs
                .map_or_else(|| config.poll.delay(), Duration::from_secs),
        );
    }
}
