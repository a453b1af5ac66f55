//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use provider_mailgun_domain::ResourceKind;

/// Mailgun provider: health, readiness and metrics server plus one-shot
/// resource observation.
#[derive(Parser, Debug)]
#[command(name = "provider-mailgun", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML or JSON); standard locations are probed if
    /// omitted
    #[arg(long, short, global = true, env = "PROVIDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands; `serve` runs when none is given.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve /healthz, /readyz and /metrics until interrupted (default)
    Serve,
    /// Observe resources and print one JSON line per id
    Observe(ObserveArgs),
}

/// Arguments of `observe`.
#[derive(Args, Debug, Clone)]
pub struct ObserveArgs {
    /// Resource kind
    #[arg(long)]
    pub kind: ResourceKind,

    /// Sending domain; required for domain-scoped kinds
    #[arg(long)]
    pub domain: Option<String>,

    /// External names to observe
    #[arg(required = true)]
    pub ids: Vec<String>,
}

/// Log line format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
