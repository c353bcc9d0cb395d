mod analysis;
mod auth;
mod cli;
mod config;
mod error;
mod insights;
mod output;
mod providers;

use anyhow::Result;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_or_exit();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    output::print_banner();

    info!("Starting citool - CircleCI job analysis");
    cli.execute().await?;

    Ok(())
}
