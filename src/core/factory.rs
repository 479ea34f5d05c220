// src/core/factory.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::core::environment::{EnvironmentHandle, RemoteEnvironment, UnmanagedEnvironment};
use crate::core::local::LocalEnvironment;
use crate::core::managed::ManagedEnvironment;
use crate::models::{EnvironmentDescriptor, LocalSettings, Settings};
use crate::system::backend::LifecycleBackend;

/// A descriptor that cannot be turned into an environment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Environment descriptor has no name.")]
    MissingName,
    #[error("Managed environment '{name}' has no environment directory.")]
    MissingDirectory { name: String },
}

/// Maps environment descriptors to shared controllers.
///
/// Constructed once and passed by reference to whoever needs environments.
/// Managed controllers are cached by name, so every lookup of the same name
/// returns the same `Arc` (and with it the same busy flag and subscribers).
/// A cached controller is replaced only when the descriptor's directory
/// changes or the cache is cleared.
#[derive(Debug)]
pub struct EnvironmentFactory {
    backend: Arc<dyn LifecycleBackend>,
    chaincode_timeout: u64,
    local_settings: LocalSettings,
    runtimes: Mutex<HashMap<String, Arc<ManagedEnvironment>>>,
    local: Mutex<Option<Arc<LocalEnvironment>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EnvironmentFactory {
    pub fn new(backend: Arc<dyn LifecycleBackend>, settings: &Settings) -> Self {
        Self {
            backend,
            chaincode_timeout: settings.chaincode_timeout,
            local_settings: settings.local.clone(),
            runtimes: Mutex::new(HashMap::new()),
            local: Mutex::new(None),
        }
    }

    /// The reserved name of the primary local network.
    pub fn local_name(&self) -> &str {
        &self.local_settings.name
    }

    /// Resolves a descriptor to its environment handle.
    ///
    /// First match wins:
    /// 1. managed, ansible-type, reserved local name: the local singleton;
    /// 2. managed, ansible-type: the cached controller for that name;
    /// 3. unmanaged, ansible-type: an inspection-only handle;
    /// 4. anything else: a remote handle.
    pub fn get_environment(
        &self,
        descriptor: &EnvironmentDescriptor,
    ) -> Result<EnvironmentHandle, ConfigurationError> {
        let name = descriptor.name.trim();
        if name.is_empty() {
            return Err(ConfigurationError::MissingName);
        }

        if descriptor.is_managed_ansible() {
            let directory = descriptor
                .environment_directory
                .as_deref()
                .filter(|dir| !dir.as_os_str().is_empty())
                .ok_or_else(|| ConfigurationError::MissingDirectory {
                    name: name.to_string(),
                })?;
            if name == self.local_settings.name {
                return Ok(EnvironmentHandle::Local(self.ensure_local(directory)));
            }
            return Ok(EnvironmentHandle::Managed(self.ensure_runtime(name, directory)));
        }

        if descriptor.environment_type.is_ansible() {
            let directory = descriptor
                .environment_directory
                .clone()
                .unwrap_or_default();
            return Ok(EnvironmentHandle::Unmanaged(UnmanagedEnvironment::new(
                name, directory,
            )));
        }

        Ok(EnvironmentHandle::Remote(RemoteEnvironment::new(
            descriptor.clone(),
        )))
    }

    /// Returns the controller for `name`, creating it if absent or if its directory moved.
    /// The reserved local name always maps to the local singleton's controller.
    pub fn ensure_runtime(&self, name: &str, directory: &Path) -> Arc<ManagedEnvironment> {
        if name == self.local_settings.name {
            return Arc::clone(self.ensure_local(directory).controller());
        }
        let mut runtimes = lock(&self.runtimes);
        if let Some(existing) = runtimes.get(name) {
            if existing.directory() == directory {
                return Arc::clone(existing);
            }
            log::debug!(
                "Directory of '{}' changed from '{}' to '{}', replacing its controller",
                name,
                existing.directory().display(),
                directory.display()
            );
        }
        let runtime = Arc::new(self.new_controller(name, directory.to_path_buf()));
        runtimes.insert(name.to_string(), Arc::clone(&runtime));
        runtime
    }

    pub fn get_runtime(&self, name: &str) -> Option<Arc<ManagedEnvironment>> {
        lock(&self.runtimes).get(name).cloned()
    }

    /// Forgets the controller for `name`, including the local singleton.
    pub fn remove_runtime(&self, name: &str) -> Option<Arc<ManagedEnvironment>> {
        if name == self.local_settings.name {
            return lock(&self.local)
                .take()
                .map(|local| Arc::clone(local.controller()));
        }
        lock(&self.runtimes).remove(name)
    }

    pub fn runtime_count(&self) -> usize {
        lock(&self.runtimes).len()
    }

    /// Returns the local singleton, creating it on first use or if its directory moved.
    pub fn ensure_local(&self, directory: &Path) -> Arc<LocalEnvironment> {
        let mut local = lock(&self.local);
        if let Some(existing) = local.as_ref() {
            if existing.directory() == directory {
                return Arc::clone(existing);
            }
        }
        let controller = Arc::new(self.new_controller(&self.local_settings.name, directory.to_path_buf()));
        let environment = Arc::new(LocalEnvironment::new(controller, self.local_settings.clone()));
        *local = Some(Arc::clone(&environment));
        environment
    }

    pub fn local_environment(&self) -> Option<Arc<LocalEnvironment>> {
        lock(&self.local).clone()
    }

    /// Drops every cached controller. Later lookups build fresh ones.
    pub fn clear(&self) {
        lock(&self.runtimes).clear();
        *lock(&self.local) = None;
    }

    fn new_controller(&self, name: &str, directory: PathBuf) -> ManagedEnvironment {
        log::debug!(
            "Creating controller for '{}' at '{}'",
            name,
            directory.display()
        );
        ManagedEnvironment::new(
            name,
            directory,
            Arc::clone(&self.backend),
            self.chaincode_timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LOCAL_ENVIRONMENT_NAME;
    use crate::models::{EnvironmentType, RuntimeState};
    use crate::testing::FakeBackend;

    fn factory() -> (Arc<FakeBackend>, EnvironmentFactory) {
        let backend = FakeBackend::new();
        let factory = EnvironmentFactory::new(
            Arc::clone(&backend) as Arc<dyn LifecycleBackend>,
            &Settings::default(),
        );
        (backend, factory)
    }

    fn managed(name: &str, dir: &str) -> EnvironmentDescriptor {
        EnvironmentDescriptor::new(
            name,
            EnvironmentType::AnsibleManaged,
            true,
            Some(PathBuf::from(dir)),
        )
    }

    fn controller_of(handle: EnvironmentHandle) -> Arc<ManagedEnvironment> {
        match handle {
            EnvironmentHandle::Managed(env) => env,
            other => panic!("expected a managed handle, got {other:?}"),
        }
    }

    #[test]
    fn test_ensure_runtime_twice_returns_same_instance() {
        let (_, factory) = factory();
        let first = factory.ensure_runtime("myRuntime", Path::new("/path"));
        let second = factory.ensure_runtime("myRuntime", Path::new("/path"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.runtime_count(), 1);
    }

    #[test]
    fn test_same_name_shares_controller_other_name_does_not() {
        let (_, factory) = factory();
        let a = controller_of(factory.get_environment(&managed("net", "/envs/net")).unwrap());
        let b = controller_of(factory.get_environment(&managed("net", "/envs/net")).unwrap());
        let c = controller_of(factory.get_environment(&managed("other", "/envs/other")).unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(factory.runtime_count(), 2);
    }

    #[tokio::test]
    async fn test_shared_controller_keeps_state_across_lookups() {
        let (backend, factory) = factory();
        backend.set_generated(true);
        let first = controller_of(factory.get_environment(&managed("net", "/envs/net")).unwrap());
        first.start(None).await.unwrap();

        let again = controller_of(factory.get_environment(&managed("net", "/envs/net")).unwrap());
        assert_eq!(again.get_state(), RuntimeState::Started);
    }

    #[test]
    fn test_directory_change_replaces_controller() {
        let (_, factory) = factory();
        let old = factory.ensure_runtime("net", Path::new("/old"));
        let new = factory.ensure_runtime("net", Path::new("/new"));

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(new.directory(), Path::new("/new"));
        assert_eq!(factory.runtime_count(), 1);
    }

    #[test]
    fn test_clear_forgets_controllers() {
        let (_, factory) = factory();
        let before = factory.ensure_runtime("net", Path::new("/path"));
        factory.clear();
        assert_eq!(factory.runtime_count(), 0);
        assert!(factory.local_environment().is_none());

        let after = factory.ensure_runtime("net", Path::new("/path"));
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_reserved_name_resolves_to_local_singleton() {
        let (_, factory) = factory();
        let descriptor = EnvironmentDescriptor::new(
            LOCAL_ENVIRONMENT_NAME,
            EnvironmentType::LocalManaged,
            true,
            Some(PathBuf::from("/envs/local")),
        );

        let first = factory.get_environment(&descriptor).unwrap();
        let second = factory.get_environment(&descriptor).unwrap();

        match (first, second) {
            (EnvironmentHandle::Local(a), EnvironmentHandle::Local(b)) => {
                assert!(Arc::ptr_eq(&a, &b));
            }
            other => panic!("expected local handles, got {other:?}"),
        }
        assert_eq!(factory.runtime_count(), 0);
        assert!(factory.local_environment().is_some());
    }

    #[test]
    fn test_local_name_never_enters_the_runtime_cache() {
        let (_, factory) = factory();
        let local = factory.ensure_local(Path::new("/envs/local"));
        let runtime = factory.ensure_runtime(LOCAL_ENVIRONMENT_NAME, Path::new("/envs/local"));

        assert!(Arc::ptr_eq(local.controller(), &runtime));
        assert_eq!(factory.runtime_count(), 0);
        assert!(factory.get_runtime(LOCAL_ENVIRONMENT_NAME).is_none());
    }

    #[test]
    fn test_remove_runtime_forgets_local_singleton() {
        let (_, factory) = factory();
        let before = factory.ensure_local(Path::new("/envs/local"));

        let removed = factory.remove_runtime(LOCAL_ENVIRONMENT_NAME).unwrap();
        assert!(Arc::ptr_eq(before.controller(), &removed));
        assert!(factory.local_environment().is_none());
        assert!(factory.remove_runtime(LOCAL_ENVIRONMENT_NAME).is_none());

        let after = factory.ensure_local(Path::new("/envs/local"));
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_unmanaged_and_remote_selection() {
        let (_, factory) = factory();
        let unmanaged = EnvironmentDescriptor::new(
            "ext",
            EnvironmentType::AnsibleUnmanaged,
            false,
            Some(PathBuf::from("/envs/ext")),
        );
        let remote = EnvironmentDescriptor::new("prod", EnvironmentType::Remote, false, None);
        let managed_remote = EnvironmentDescriptor::new("odd", EnvironmentType::Remote, true, None);

        assert!(matches!(
            factory.get_environment(&unmanaged).unwrap(),
            EnvironmentHandle::Unmanaged(_)
        ));
        assert!(matches!(
            factory.get_environment(&remote).unwrap(),
            EnvironmentHandle::Remote(_)
        ));
        assert!(matches!(
            factory.get_environment(&managed_remote).unwrap(),
            EnvironmentHandle::Remote(_)
        ));
        assert_eq!(factory.runtime_count(), 0);
    }

    #[test]
    fn test_configuration_errors() {
        let (_, factory) = factory();
        let nameless = managed("  ", "/envs/x");
        let homeless = EnvironmentDescriptor::new("net", EnvironmentType::AnsibleManaged, true, None);

        assert_eq!(
            factory.get_environment(&nameless).unwrap_err(),
            ConfigurationError::MissingName
        );
        assert_eq!(
            factory.get_environment(&homeless).unwrap_err(),
            ConfigurationError::MissingDirectory {
                name: "net".to_string()
            }
        );
    }
}
