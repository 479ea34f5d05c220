// src/cli/handlers/status.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::cli::handlers::commons::yes_no;
use crate::core::environment::EnvironmentHandle;
use crate::state::AppState;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Checks whether environments are generated and running.")]
struct StatusArgs {
    /// Only this environment. All registered environments by default.
    name: Option<String>,
}

pub fn handle(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(args, state).boxed_local()
}

async fn run(args: Vec<String>, state: &AppState) -> Result<()> {
    let status_args = StatusArgs::try_parse_from(&args)?;
    let names: Vec<String> = match status_args.name {
        Some(name) => vec![name],
        None => state
            .registry
            .get_all()?
            .into_iter()
            .map(|descriptor| descriptor.name)
            .collect(),
    };

    for name in names {
        let handle = state
            .environment(&name)
            .with_context(|| format!(t!("error.environment_lookup"), name = name))?;
        print_status(&handle).await;
    }
    Ok(())
}

async fn print_status(handle: &EnvironmentHandle) {
    println!(
        "\n--- {} ({}) ---",
        handle.name().yellow(),
        handle.environment_type()
    );

    match handle.controller() {
        Some(environment) => {
            let (running, generated) =
                tokio::join!(environment.is_running(&[]), environment.is_generated());
            println!("  {:<12} {}", t!("status.label.generated").blue(), yes_no(generated));
            println!("  {:<12} {}", t!("status.label.running").blue(), yes_no(running));
            if environment.is_busy() {
                println!(
                    "  {:<12} {}",
                    t!("status.label.busy").blue(),
                    environment.get_state().to_string().yellow()
                );
            }
        }
        None => println!("  {}", t!("status.info.not_managed").dimmed()),
    }

    match handle.get_nodes() {
        Ok(nodes) => println!("  {:<12} {}", t!("status.label.nodes").blue(), nodes.len()),
        Err(e) => println!(
            "  {}",
            format!(t!("status.warning.nodes_unreadable"), error = e).yellow()
        ),
    }
}
