// src/state.rs

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::core::factory::{ConfigurationError, EnvironmentFactory};
use crate::core::environment::EnvironmentHandle;
use crate::core::managed::LifecycleError;
use crate::core::registry::{EnvironmentRegistry, RegistryError};
use crate::core::settings::{self, SettingsError};
use crate::models::{EnvironmentDescriptor, EnvironmentType, Settings};
use crate::system::backend::{LifecycleBackend, ShellBackend};
use crate::system::output::ConsoleSink;

#[derive(Error, Debug)]
pub enum StateError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Everything a command needs: settings, the persisted registry and the
/// controller factory. Built once in `main` and passed down by reference.
#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,
    pub registry: EnvironmentRegistry,
    pub factory: EnvironmentFactory,
    pub sink: ConsoleSink,
}

impl AppState {
    /// Loads settings from the config directory and wires the shell backend.
    pub fn load() -> Result<Self, StateError> {
        let settings = settings::load_settings()?;
        let registry = EnvironmentRegistry::new(settings::environments_dir(&settings)?);
        let state = Self::with_backend(settings, registry, Arc::new(ShellBackend::new()));
        state.ensure_local_registered()?;
        Ok(state)
    }

    pub fn with_backend(
        settings: Settings,
        registry: EnvironmentRegistry,
        backend: Arc<dyn LifecycleBackend>,
    ) -> Self {
        let factory = EnvironmentFactory::new(backend, &settings);
        Self {
            settings,
            registry,
            factory,
            sink: ConsoleSink,
        }
    }

    /// Registers the primary local network on first run.
    pub fn ensure_local_registered(&self) -> Result<(), StateError> {
        let name = self.settings.local.name.as_str();
        if self.registry.exists(name) {
            return Ok(());
        }
        let descriptor = EnvironmentDescriptor::new(
            name,
            EnvironmentType::LocalManaged,
            true,
            Some(self.registry.entry_dir(name)),
        );
        self.registry.add(&descriptor)?;
        Ok(())
    }

    /// The handle for a registered environment.
    pub fn environment(&self, name: &str) -> Result<EnvironmentHandle, StateError> {
        let descriptor = self.registry.get(name)?;
        Ok(self.factory.get_environment(&descriptor)?)
    }

    /// Unregisters `name` and forgets its controller.
    ///
    /// Only the registry's own entry directory is deleted. An environment
    /// directory supplied at registration stays on disk and is returned.
    pub async fn remove_environment(&self, name: &str) -> Result<Option<PathBuf>, StateError> {
        let descriptor = self.registry.get(name)?;
        let handle = self.factory.get_environment(&descriptor)?;
        let entry_dir = self.registry.entry_dir(name);
        let kept = descriptor
            .environment_directory
            .filter(|dir| *dir != entry_dir);

        match (handle.controller(), &kept) {
            (Some(controller), None) => controller.delete().await?,
            (Some(controller), Some(_)) if controller.is_busy() => {
                return Err(LifecycleError::Busy {
                    name: name.to_string(),
                }
                .into());
            }
            _ => self.registry.delete(name)?,
        }

        self.factory.remove_runtime(name);
        Ok(kept)
    }

    pub fn local_name(&self) -> &str {
        self.factory.local_name()
    }
}
