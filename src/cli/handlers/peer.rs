// src/cli/handlers/peer.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::cli::handlers::commons;
use crate::core::nodes;
use crate::state::AppState;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Shows peer endpoints and organizations of an environment.")]
struct PeerArgs {
    /// The environment to inspect. Defaults to the local network.
    name: Option<String>,

    /// Restrict the chaincode endpoint to this organization (e.g. Org1).
    #[arg(long)]
    org: Option<String>,
}

pub fn handle(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(args, state).boxed_local()
}

async fn run(args: Vec<String>, state: &AppState) -> Result<()> {
    let peer_args = PeerArgs::try_parse_from(&args)?;
    let name = commons::target_name(peer_args.name, state);
    let handle = state
        .environment(&name)
        .with_context(|| format!(t!("error.environment_lookup"), name = name))?;

    let url = handle.get_peer_chaincode_url(peer_args.org.as_deref())?;
    let node_list = handle.get_nodes()?;

    println!("\n--- {} '{}' ---", t!("peer.header"), name.yellow());
    println!("  {:<18} {}", t!("peer.label.chaincode_url").blue(), url);
    match nodes::peer_container_name(&node_list) {
        Ok(container) => println!("  {:<18} {}", t!("peer.label.container").blue(), container),
        Err(_) => println!(
            "  {:<18} {}",
            t!("peer.label.container").blue(),
            t!("common.none").dimmed()
        ),
    }
    println!(
        "  {:<18} {}",
        t!("peer.label.organizations").blue(),
        nodes::organization_names(&node_list).join(", ")
    );
    Ok(())
}
