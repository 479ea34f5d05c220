// src/cli/handlers/remove.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::cli::handlers::commons;
use crate::state::AppState;
use crate::system::output::OutputSink;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Removes an environment, tearing it down first if it is managed.")]
struct RemoveArgs {
    /// The environment to remove.
    name: String,

    /// Do not ask for confirmation.
    #[arg(long, short)]
    yes: bool,
}

pub fn handle(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(args, state).boxed_local()
}

async fn run(args: Vec<String>, state: &AppState) -> Result<()> {
    let remove_args = RemoveArgs::try_parse_from(&args)?;
    let name = remove_args.name.as_str();
    let handle = state
        .environment(name)
        .with_context(|| format!(t!("error.environment_lookup"), name = name))?;

    if !remove_args.yes && !commons::confirm(&format!(t!("remove.prompt.confirm"), name = name))? {
        println!("{}", t!("common.cancelled").yellow());
        return Ok(());
    }

    let controller = handle.controller().cloned();
    if let Some(environment) = &controller {
        if environment.is_created() {
            println!("{}", format!(t!("remove.info.tearing_down"), name = name.cyan()));
            let sink: &dyn OutputSink = &state.sink;
            if let Err(e) = environment.teardown(Some(sink)).await {
                // A broken network must still be removable.
                eprintln!(
                    "{}",
                    format!(t!("remove.warning.teardown_failed"), error = e).yellow()
                );
            }
        }
    }

    let kept = state
        .remove_environment(name)
        .await
        .with_context(|| format!(t!("remove.error.failed"), name = name))?;
    if let Some(dir) = kept {
        println!(
            "{}",
            format!(t!("remove.info.directory_kept"), path = dir.display()).dimmed()
        );
    }

    println!("{}", format!(t!("remove.success"), name = name.cyan()).green());
    Ok(())
}
