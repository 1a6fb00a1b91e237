//! CLI argument definitions using clap derive macros.

use clap::Parser;

/// Relay business-registry searches and documents to a CRM.
///
/// Listens for job submissions, polls the registry search API, fetches result
/// documents and posts everything to the configured callback endpoints.
/// Connection settings come from the environment; flags override them.
#[derive(Parser, Debug)]
#[command(name = "registry-relay")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Listen host (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Concurrent relay workers per job (1-32, overrides RELAY_CONCURRENCY)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub concurrency: Option<u8>,

    /// Search calls before giving up on a pending search (1-10, overrides POLL_MAX_ATTEMPTS)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_poll_attempts: Option<u32>,

    /// Seconds between search polls (0-300, overrides POLL_DELAY_SECS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=300))]
    pub poll_delay_secs: Option<u64>,
}

impl Args {
    /// Log level used when `RUST_LOG` is unset.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
