// src/core/managed.rs

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::fmt;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::constants::{
    SCRIPT_GENERATE, SCRIPT_IS_GENERATED, SCRIPT_IS_RUNNING, SCRIPT_START, SCRIPT_STOP,
    SCRIPT_TEARDOWN,
};
use crate::core::nodes::{self, DomainError, NodeInventory};
use crate::core::runtime_state::RuntimeStatus;
use crate::models::{FabricNode, RuntimeState};
use crate::system::backend::LifecycleBackend;
use crate::system::executor::{ProcessFailure, ScriptInvocation};
use crate::system::output::OutputSink;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Process(#[from] ProcessFailure),
    #[error("Environment '{name}' is busy with another operation.")]
    Busy { name: String },
    #[error("Could not delete environment directory '{path}': {source}")]
    Delete {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

type SharedCheck = Shared<BoxFuture<'static, bool>>;

/// Controller for one script-driven network environment.
///
/// Every lifecycle operation follows the same bracket: enter a transitional
/// state and raise the busy flag, run the script(s), then re-check
/// [`is_running`](Self::is_running), settle on `Started` or `Stopped` and
/// clear the busy flag. The bracket closes whether the scripts succeeded or
/// not, and the script error is returned untouched afterwards.
///
/// Only one lifecycle operation may be in flight at a time; a second one is
/// rejected with [`LifecycleError::Busy`].
pub struct ManagedEnvironment {
    name: String,
    directory: PathBuf,
    chaincode_timeout: u64,
    backend: Arc<dyn LifecycleBackend>,
    status: RuntimeStatus,
    running_check: Mutex<Option<SharedCheck>>,
}

impl fmt::Debug for ManagedEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedEnvironment")
            .field("name", &self.name)
            .field("directory", &self.directory)
            .field("state", &self.status.state())
            .field("busy", &self.status.is_busy())
            .finish()
    }
}

impl ManagedEnvironment {
    pub fn new(
        name: impl Into<String>,
        directory: impl Into<PathBuf>,
        backend: Arc<dyn LifecycleBackend>,
        chaincode_timeout: u64,
    ) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            chaincode_timeout,
            backend,
            status: RuntimeStatus::new(),
            running_check: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn is_busy(&self) -> bool {
        self.status.is_busy()
    }

    pub fn get_state(&self) -> RuntimeState {
        self.status.state()
    }

    /// Busy-flag changes: `true` when an operation begins, `false` when it settles.
    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.status.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> &RuntimeStatus {
        &self.status
    }

    pub fn tick_count(&self) -> u64 {
        self.status.tick_count()
    }

    pub fn advance_tick(&self) -> u64 {
        self.status.advance_tick()
    }

    /// Whether the environment directory exists on disk.
    pub fn is_created(&self) -> bool {
        self.directory.is_dir()
    }

    // --- Status checks ---

    /// Runs `is_generated`. Any failure, including a spawn failure, means "no".
    pub async fn is_generated(&self) -> bool {
        match self.execute(SCRIPT_IS_GENERATED, Vec::new(), None).await {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Environment '{}' is not generated: {}", self.name, e);
                false
            }
        }
    }

    /// Runs `is_running`, sharing one in-flight check between concurrent callers.
    ///
    /// A caller arriving while a check is still pending awaits that same check
    /// instead of spawning another process. Once it settles the slot is cleared,
    /// so the next call starts a fresh check. Any failure means "not running".
    pub async fn is_running(&self, args: &[String]) -> bool {
        let check = {
            let mut slot = self.lock_check();
            match slot.as_ref() {
                Some(in_flight) if in_flight.peek().is_none() => in_flight.clone(),
                _ => {
                    let fresh = self.running_check_future(args);
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        let running = check.clone().await;

        let mut slot = self.lock_check();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&check)) {
            *slot = None;
        }
        running
    }

    fn running_check_future(&self, args: &[String]) -> SharedCheck {
        let backend = Arc::clone(&self.backend);
        let invocation = self.invocation(SCRIPT_IS_RUNNING, args.to_vec());
        let name = self.name.clone();
        async move {
            match backend.run(&invocation, None).await {
                Ok(()) => true,
                Err(e) => {
                    log::debug!("Environment '{}' is not running: {}", name, e);
                    false
                }
            }
        }
        .boxed()
        .shared()
    }

    fn lock_check(&self) -> MutexGuard<'_, Option<SharedCheck>> {
        self.running_check
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // --- Lifecycle operations ---

    pub async fn generate(&self, sink: Option<&dyn OutputSink>) -> Result<(), LifecycleError> {
        self.run_operation(
            RuntimeState::Starting,
            self.execute(SCRIPT_GENERATE, Vec::new(), sink),
        )
        .await
    }

    /// Generates the network first if `is_generated` says it is missing.
    pub async fn start(&self, sink: Option<&dyn OutputSink>) -> Result<(), LifecycleError> {
        if !self.is_generated().await {
            log::info!("Environment '{}' has not been generated yet", self.name);
            self.generate(sink).await?;
        }
        self.run_operation(
            RuntimeState::Starting,
            self.execute(SCRIPT_START, Vec::new(), sink),
        )
        .await
    }

    pub async fn stop(&self, sink: Option<&dyn OutputSink>) -> Result<(), LifecycleError> {
        self.run_operation(
            RuntimeState::Stopping,
            self.execute(SCRIPT_STOP, Vec::new(), sink),
        )
        .await
    }

    /// Runs `stop` then `start`. A failed `start` is not rolled back.
    pub async fn restart(&self, sink: Option<&dyn OutputSink>) -> Result<(), LifecycleError> {
        self.run_operation(RuntimeState::Restarting, async {
            self.execute(SCRIPT_STOP, Vec::new(), sink).await?;
            self.execute(SCRIPT_START, Vec::new(), sink).await
        })
        .await
    }

    pub async fn teardown(&self, sink: Option<&dyn OutputSink>) -> Result<(), LifecycleError> {
        self.run_operation(
            RuntimeState::Stopping,
            self.execute(SCRIPT_TEARDOWN, Vec::new(), sink),
        )
        .await
    }

    /// Removes the environment directory. A directory that is already gone is not an error.
    pub async fn delete(&self) -> Result<(), LifecycleError> {
        if self.is_busy() {
            return Err(LifecycleError::Busy {
                name: self.name.clone(),
            });
        }
        match tokio::fs::remove_dir_all(&self.directory).await {
            Ok(()) => {
                log::info!(
                    "Deleted environment '{}' at '{}'",
                    self.name,
                    self.directory.display()
                );
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LifecycleError::Delete {
                path: self.directory.display().to_string(),
                source,
            }),
        }
    }

    async fn run_operation<F>(&self, transitional: RuntimeState, work: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = Result<(), ProcessFailure>>,
    {
        if !self.status.try_begin(transitional) {
            log::warn!(
                "Rejected '{}' on environment '{}': another operation is in flight",
                transitional,
                self.name
            );
            return Err(LifecycleError::Busy {
                name: self.name.clone(),
            });
        }
        log::debug!("Environment '{}' is {}", self.name, transitional);

        let outcome = work.await;

        // The state must never be left transitional, whatever the outcome.
        let settled = if self.is_running(&[]).await {
            RuntimeState::Started
        } else {
            RuntimeState::Stopped
        };
        self.status.finish(settled);

        match &outcome {
            Ok(()) => log::info!("Environment '{}' is now {}", self.name, settled),
            Err(e) => log::warn!(
                "Operation on environment '{}' failed ({}); state resolved to {}",
                self.name,
                e,
                settled
            ),
        }
        outcome.map_err(LifecycleError::from)
    }

    // --- Script plumbing ---

    pub(crate) async fn execute(
        &self,
        script: &str,
        args: Vec<String>,
        sink: Option<&dyn OutputSink>,
    ) -> Result<(), ProcessFailure> {
        let invocation = self.invocation(script, args);
        self.backend.run(&invocation, sink).await
    }

    fn invocation(&self, script: &str, args: Vec<String>) -> ScriptInvocation {
        ScriptInvocation::new(script, args, &self.directory)
            .with_chaincode_overlay(self.chaincode_timeout)
    }

    // --- Node queries ---

    pub fn get_nodes(&self) -> Result<Vec<FabricNode>, DomainError> {
        NodeInventory::for_environment(&self.directory).get_nodes()
    }

    pub fn get_peer_chaincode_url(&self, org_name: Option<&str>) -> Result<String, DomainError> {
        nodes::peer_chaincode_url(&self.get_nodes()?, org_name)
    }

    pub fn get_peer_container_name(&self) -> Result<String, DomainError> {
        nodes::peer_container_name(&self.get_nodes()?)
    }

    pub fn get_all_organization_names(&self) -> Result<Vec<String>, DomainError> {
        Ok(nodes::organization_names(&self.get_nodes()?))
    }
}
