// Entrypoint for the bootstrap tool.
// - Logs go to stderr so stdout carries only the two report lines.
// - Any error, including a missing target path, exits with status 1.

use airflow_auth_bootstrap::cli::{run, BootstrapConfig, Cli};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = BootstrapConfig::from(Cli::parse());

    match run(&config, &mut std::io::stdout().lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "bootstrap failed");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
