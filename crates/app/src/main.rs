//! Mailgun provider entry point.

use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use provider_mailgun::cli::{Cli, Command, ObserveArgs};
use provider_mailgun::{logging, observe, server, AppContext};
use provider_mailgun_common::Context;
use provider_mailgun_infra::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Before logging, so RUST_LOG from .env applies.
    let dotenv = dotenvy::dotenv();
    logging::init(cli.debug, cli.log_format)?;
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "failed to load .env"),
    }

    let config = config::load(cli.config.clone()).context("failed to load configuration")?;
    let app = Arc::new(AppContext::new(config)?);

    match cli.command {
        Some(Command::Serve) | None => {
            let addr = app.config.server.health_addr;
            server::serve(app, addr).await
        }
        Some(Command::Observe(args)) => run_observe(app, &args).await,
    }
}

async fn run_observe(app: Arc<AppContext>, args: &ObserveArgs) -> anyhow::Result<()> {
    let ctx = Context::background();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let lines = observe::run(app, &ctx, args).await;
    let failed = lines.iter().filter(|line| line.error.is_some()).count();
    for line in &lines {
        println!("{}", serde_json::to_string(line)?);
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} observations failed", lines.len());
    }
    Ok(())
}
