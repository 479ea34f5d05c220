// src/cli/handlers/list.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::state::AppState;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Lists registered environments.")]
struct ListArgs {}

pub fn handle(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(args, state).boxed_local()
}

async fn run(args: Vec<String>, state: &AppState) -> Result<()> {
    let _list_args = ListArgs::try_parse_from(&args)?;
    let descriptors = state.registry.get_all()?;

    if descriptors.is_empty() {
        println!("{}", t!("list.info.empty").dimmed());
        return Ok(());
    }

    println!("\n--- {} ---", t!("list.header"));
    for descriptor in &descriptors {
        let marker = if descriptor.name == state.local_name() {
            "*".yellow()
        } else {
            " ".normal()
        };
        let ownership = if descriptor.managed_runtime {
            t!("list.label.managed").cyan()
        } else {
            t!("list.label.unmanaged").dimmed()
        };
        println!(
            " {} {:<30} {:<20} {}",
            marker,
            descriptor.name.bold(),
            descriptor.environment_type.to_string(),
            ownership
        );
    }
    Ok(())
}
