// src/cli/handlers/kill_chaincode.rs

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::*;
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::core::environment::EnvironmentHandle;
use crate::state::AppState;
use crate::system::output::OutputSink;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Stops the containers of a chaincode on the local network.")]
struct KillChaincodeArgs {
    /// Chaincode name.
    chaincode: String,

    /// Chaincode version.
    version: String,
}

pub fn handle(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(args, state).boxed_local()
}

async fn run(args: Vec<String>, state: &AppState) -> Result<()> {
    let kill_args = KillChaincodeArgs::try_parse_from(&args)?;
    let local_name = state.local_name();

    let EnvironmentHandle::Local(local) = state
        .environment(local_name)
        .with_context(|| format!(t!("error.environment_lookup"), name = local_name))?
    else {
        bail!(t!("kill_chaincode.error.not_local"), name = local_name);
    };

    let sink: &dyn OutputSink = &state.sink;
    local
        .kill_chaincode(&[kill_args.chaincode.clone(), kill_args.version.clone()], Some(sink))
        .await
        .with_context(|| format!(t!("kill_chaincode.error.failed"), chaincode = kill_args.chaincode))?;

    println!(
        "{}",
        format!(
            t!("kill_chaincode.success"),
            chaincode = kill_args.chaincode.cyan(),
            version = kill_args.version
        )
        .green()
    );
    Ok(())
}
