mod app;
mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;

use algobench_core::config::{load_dotenv, Config};

use crate::app::App;
use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();

    // Logs go to stderr; stdout carries the JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    config.log_summary();

    let app = App::connect(&config, args.memory)
        .await
        .context("failed to initialise the pipeline")?;

    commands::dispatch(&app, &config, args.command).await
}
