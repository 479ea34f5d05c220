// src/cli/dispatcher.rs

use anyhow::{Result, anyhow};
use futures::future::LocalBoxFuture;

use crate::{cli::handlers, state::AppState};

type Handler = for<'a> fn(Vec<String>, &'a AppState) -> LocalBoxFuture<'a, Result<()>>;

/// Defines a command, its aliases and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: Handler,
}

/// The single source of truth for all commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "list",
        aliases: &["ls"],
        handler: handlers::list::handle,
    },
    CommandDefinition {
        name: "add",
        aliases: &[],
        handler: handlers::add::handle,
    },
    CommandDefinition {
        name: "remove",
        aliases: &["rm"],
        handler: handlers::remove::handle,
    },
    CommandDefinition {
        name: "status",
        aliases: &[],
        handler: handlers::status::handle,
    },
    CommandDefinition {
        name: "generate",
        aliases: &[],
        handler: handlers::lifecycle::handle_generate,
    },
    CommandDefinition {
        name: "start",
        aliases: &[],
        handler: handlers::lifecycle::handle_start,
    },
    CommandDefinition {
        name: "stop",
        aliases: &[],
        handler: handlers::lifecycle::handle_stop,
    },
    CommandDefinition {
        name: "restart",
        aliases: &[],
        handler: handlers::lifecycle::handle_restart,
    },
    CommandDefinition {
        name: "teardown",
        aliases: &[],
        handler: handlers::lifecycle::handle_teardown,
    },
    CommandDefinition {
        name: "kill-chaincode",
        aliases: &[],
        handler: handlers::kill_chaincode::handle,
    },
    CommandDefinition {
        name: "peer",
        aliases: &[],
        handler: handlers::peer::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Routes `<command> [args...]` to its handler.
pub async fn dispatch(all_args: Vec<String>, state: &AppState) -> Result<()> {
    log::debug!("Dispatching args: {:?}", all_args);

    let Some((command_name, handler_args)) = all_args.split_first() else {
        return Err(anyhow!(t!("error.command_required")));
    };
    let command = find_command(command_name)
        .ok_or_else(|| anyhow!(t!("error.unknown_command"), name = command_name))?;

    (command.handler)(handler_args.to_vec(), state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::EnvironmentRegistry;
    use crate::models::Settings;
    use crate::testing::FakeBackend;
    use tempfile::tempdir;

    #[test]
    fn test_find_command_by_name_and_alias() {
        assert_eq!(find_command("list").map(|c| c.name), Some("list"));
        assert_eq!(find_command("ls").map(|c| c.name), Some("list"));
        assert_eq!(find_command("rm").map(|c| c.name), Some("remove"));
        assert!(find_command("deploy").is_none());
    }

    #[test]
    fn test_command_names_are_unique() {
        let mut names: Vec<&str> = COMMAND_REGISTRY
            .iter()
            .flat_map(|c| std::iter::once(c.name).chain(c.aliases.iter().copied()))
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_command_fails() {
        let dir = tempdir().unwrap();
        let state = AppState::with_backend(
            Settings::default(),
            EnvironmentRegistry::new(dir.path()),
            FakeBackend::new(),
        );

        assert!(dispatch(vec!["deploy".to_string()], &state).await.is_err());
        assert!(dispatch(Vec::new(), &state).await.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_add_then_list() {
        let dir = tempdir().unwrap();
        let state = AppState::with_backend(
            Settings::default(),
            EnvironmentRegistry::new(dir.path()),
            FakeBackend::new(),
        );

        let args = ["add", "net", "--type", "ansible-managed"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        dispatch(args, &state).await.unwrap();
        dispatch(vec!["ls".to_string()], &state).await.unwrap();

        let descriptor = state.registry.get("net").unwrap();
        assert!(descriptor.managed_runtime);
        assert_eq!(
            descriptor.environment_directory,
            Some(state.registry.entry_dir("net"))
        );
    }

    #[tokio::test]
    async fn test_dispatch_start_drives_the_controller() {
        let dir = tempdir().unwrap();
        let backend = FakeBackend::new();
        let state = AppState::with_backend(
            Settings::default(),
            EnvironmentRegistry::new(dir.path()),
            backend.clone(),
        );
        state.ensure_local_registered().unwrap();

        dispatch(vec!["start".to_string()], &state).await.unwrap();

        assert_eq!(
            backend.lifecycle_scripts(),
            vec!["generate", "start"]
        );
        let local = state.factory.local_environment().unwrap();
        assert_eq!(local.get_state(), crate::models::RuntimeState::Started);
    }
}
