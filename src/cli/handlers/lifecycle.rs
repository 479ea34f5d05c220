// src/cli/handlers/lifecycle.rs

// `generate`, `start`, `stop`, `restart` and `teardown` share one flow: resolve
// the controller, show a spinner while it is busy, report the settled state.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::io::Write;
use std::sync::Arc;

use crate::cli::handlers::commons::{self, SPINNER_FRAMES};
use crate::core::managed::{LifecycleError, ManagedEnvironment};
use crate::core::ticker::{BusyTicker, frame_for};
use crate::state::AppState;
use crate::system::output::OutputSink;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
struct LifecycleArgs {
    /// The environment to operate on. Defaults to the local network.
    name: Option<String>,

    /// Do not ask for confirmation before destructive operations.
    #[arg(long, short)]
    yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Generate,
    Start,
    Stop,
    Restart,
    Teardown,
}

impl Operation {
    fn verb(self) -> &'static str {
        match self {
            Operation::Generate => t!("lifecycle.verb.generate"),
            Operation::Start => t!("lifecycle.verb.start"),
            Operation::Stop => t!("lifecycle.verb.stop"),
            Operation::Restart => t!("lifecycle.verb.restart"),
            Operation::Teardown => t!("lifecycle.verb.teardown"),
        }
    }

    async fn apply(
        self,
        environment: &ManagedEnvironment,
        sink: &dyn OutputSink,
    ) -> Result<(), LifecycleError> {
        match self {
            Operation::Generate => environment.generate(Some(sink)).await,
            Operation::Start => environment.start(Some(sink)).await,
            Operation::Stop => environment.stop(Some(sink)).await,
            Operation::Restart => environment.restart(Some(sink)).await,
            Operation::Teardown => environment.teardown(Some(sink)).await,
        }
    }
}

pub fn handle_generate(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(Operation::Generate, args, state).boxed_local()
}

pub fn handle_start(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(Operation::Start, args, state).boxed_local()
}

pub fn handle_stop(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(Operation::Stop, args, state).boxed_local()
}

pub fn handle_restart(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(Operation::Restart, args, state).boxed_local()
}

pub fn handle_teardown(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(Operation::Teardown, args, state).boxed_local()
}

async fn run(operation: Operation, args: Vec<String>, state: &AppState) -> Result<()> {
    let lifecycle_args = LifecycleArgs::try_parse_from(&args)?;
    let name = commons::target_name(lifecycle_args.name, state);
    let environment = commons::resolve_controller(state, &name)?;

    if operation == Operation::Teardown
        && !lifecycle_args.yes
        && !commons::confirm(&format!(t!("teardown.prompt.confirm"), name = name))?
    {
        println!("{}", t!("common.cancelled").yellow());
        return Ok(());
    }

    println!(
        "\n{}",
        format!(
            t!("lifecycle.info.begin"),
            verb = operation.verb(),
            name = name.cyan()
        )
    );

    let ticker = BusyTicker::spawn(Arc::clone(&environment), |tick| {
        eprint!("\r{} ", frame_for(tick, SPINNER_FRAMES).cyan());
        let _ = std::io::stderr().flush();
    });
    let outcome = operation.apply(&environment, &state.sink).await;
    ticker.stop();
    eprint!("\r");

    outcome.with_context(|| {
        format!(
            t!("lifecycle.error.failed"),
            verb = operation.verb(),
            name = name
        )
    })?;

    println!(
        "{}",
        format!(
            t!("lifecycle.success"),
            name = name.cyan(),
            state = environment.get_state()
        )
        .green()
    );
    Ok(())
}
