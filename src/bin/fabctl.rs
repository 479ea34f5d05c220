// src/bin/fabctl.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use fabctl::{
    cli::{Cli, dispatcher},
    state::AppState,
};

/// Sets up logging, loads the application state and dispatches the command.
/// Every error ends up here and is printed once.
#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()).await {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    let state = AppState::load().context(fabctl::t!("error.state_load"))?;
    dispatcher::dispatch(cli.args, &state).await
}
