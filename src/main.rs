use anyhow::{Context, Result};
use sentry::{
    integrations::{anyhow::capture_anyhow, tracing as sentry_tracing},
    ClientOptions, IntoDsn,
};
use std::{io, sync::Arc};
use structopt::StructOpt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use args::Args;

mod args;
mod batch;
mod classifier;
mod config;
mod pipeline;
mod prober;
mod zone;

use prober::{Ping, SharedProbe};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse the cli
    let cli = Args::from_args();

    // Get the configuration
    let configuration = config::load(cli.config.as_ref())
        .await
        .context("Failed to load configuration")?;

    // Setup logging
    let log_filter = match &cli.log_level {
        Some(filter) => filter.clone(),
        None if cli.verbose => format!("{},dns_sweeper=debug", configuration.agent.log),
        None => configuration.agent.log.clone(),
    };
    init_tracing(log_filter);

    // Initialize sentry
    let _guard = sentry::init(sentry_config(configuration.agent.sentry.as_deref())?);

    let probe: SharedProbe = Arc::new(Ping::new(&configuration.probe));
    match pipeline::run(&cli, &configuration, probe, &mut io::stdout()).await {
        Ok(summary) => {
            tracing::debug!(?summary, "finished");
            Ok(())
        }
        Err(e) => {
            capture_anyhow(&e);
            Err(e)
        }
    }
}

/// Generate a registry for tracing
///
/// Logs are written to stderr so the report on stdout can be piped.
fn init_tracing(raw_filter: String) {
    let filter = EnvFilter::builder().parse_lossy(raw_filter);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(filter),
        )
        .with(sentry_tracing::layer())
        .init();
}

/// Generate configuration for Sentry
fn sentry_config(url: Option<&str>) -> Result<ClientOptions> {
    let dsn = url
        .map(IntoDsn::into_dsn)
        .transpose()
        .context("failed to parse Sentry DSN")?
        .flatten();

    let options = ClientOptions {
        dsn,
        release: sentry::release_name!(),
        attach_stacktrace: true,
        ..Default::default()
    };

    Ok(options)
}
