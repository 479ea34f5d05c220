// src/cli/handlers/commons.rs

// Helpers shared by several handlers.

use anyhow::{Context, Result, anyhow};
use colored::*;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::sync::Arc;

use crate::core::managed::ManagedEnvironment;
use crate::models::EnvironmentType;
use crate::state::AppState;

pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// The environment named on the command line, or the local network when omitted.
pub fn target_name(name: Option<String>, state: &AppState) -> String {
    name.unwrap_or_else(|| state.local_name().to_string())
}

/// Resolves `name` to its lifecycle controller. Fails for environments fabctl does not manage.
pub fn resolve_controller(state: &AppState, name: &str) -> Result<Arc<ManagedEnvironment>> {
    let handle = state
        .environment(name)
        .with_context(|| format!(t!("error.environment_lookup"), name = name))?;
    handle
        .controller()
        .cloned()
        .ok_or_else(|| anyhow!(t!("error.not_managed"), name = name))
}

pub fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

pub fn yes_no(value: bool) -> ColoredString {
    if value {
        t!("common.yes").green()
    } else {
        t!("common.no").dimmed()
    }
}

/// Accepts the kebab-case spelling used on the command line.
pub fn parse_environment_type(value: &str) -> Result<EnvironmentType, String> {
    match value.to_ascii_lowercase().as_str() {
        "local-managed" | "local" => Ok(EnvironmentType::LocalManaged),
        "ansible-managed" | "managed" => Ok(EnvironmentType::AnsibleManaged),
        "ansible-unmanaged" | "unmanaged" => Ok(EnvironmentType::AnsibleUnmanaged),
        "remote" => Ok(EnvironmentType::Remote),
        other => Err(format!(t!("add.error.unknown_type"), value = other)),
    }
}
