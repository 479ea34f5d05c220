// src/cli/handlers/add.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use std::path::PathBuf;

use crate::cli::handlers::commons;
use crate::models::{EnvironmentDescriptor, EnvironmentType};
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Registers a new environment.")]
struct AddArgs {
    /// The name of the new environment.
    name: String,

    /// local-managed, ansible-managed, ansible-unmanaged or remote.
    #[arg(long = "type", short = 't', value_parser = commons::parse_environment_type, default_value = "ansible-managed")]
    environment_type: EnvironmentType,

    /// Register the environment without letting fabctl drive its lifecycle.
    #[arg(long)]
    unmanaged: bool,

    /// The environment directory. Defaults to the registry entry's own directory.
    #[arg(long, short)]
    dir: Option<PathBuf>,
}

pub fn handle(args: Vec<String>, state: &AppState) -> LocalBoxFuture<'_, Result<()>> {
    run(args, state).boxed_local()
}

async fn run(args: Vec<String>, state: &AppState) -> Result<()> {
    let add_args = AddArgs::try_parse_from(&args)?;
    let descriptor = build_descriptor(&add_args, state);

    // Reject descriptors the factory could not resolve before anything is written.
    state
        .factory
        .get_environment(&descriptor)
        .with_context(|| format!(t!("add.error.invalid"), name = descriptor.name))?;
    state
        .registry
        .add(&descriptor)
        .with_context(|| format!(t!("add.error.failed"), name = descriptor.name))?;

    println!(
        "\n{}",
        format!(
            t!("add.success"),
            name = descriptor.name.cyan(),
            kind = descriptor.environment_type
        )
        .green()
    );
    if let Some(dir) = &descriptor.environment_directory {
        println!("  {} {}", t!("add.label.directory").blue(), dir.display());
    }
    Ok(())
}

fn build_descriptor(args: &AddArgs, state: &AppState) -> EnvironmentDescriptor {
    let managed = !args.unmanaged
        && matches!(
            args.environment_type,
            EnvironmentType::LocalManaged | EnvironmentType::AnsibleManaged
        );
    let directory = match &args.dir {
        Some(dir) => Some(dunce::canonicalize(dir).unwrap_or_else(|_| dir.clone())),
        None if args.environment_type.is_ansible() => Some(state.registry.entry_dir(&args.name)),
        None => None,
    };
    EnvironmentDescriptor::new(&args.name, args.environment_type, managed, directory)
}
