// src/core/local.rs

use std::ops::{Deref, RangeInclusive};
use std::sync::Arc;

use crate::constants::{DEFAULT_LOCAL_ORG, SCRIPT_KILL_CHAINCODE};
use crate::core::managed::ManagedEnvironment;
use crate::core::nodes::DomainError;
use crate::models::LocalSettings;
use crate::system::executor::ProcessFailure;
use crate::system::output::OutputSink;

/// The primary local network: a managed environment plus its local-only settings.
///
/// Derefs to the underlying [`ManagedEnvironment`] for every lifecycle
/// operation and status check.
#[derive(Debug)]
pub struct LocalEnvironment {
    controller: Arc<ManagedEnvironment>,
    settings: LocalSettings,
}

impl LocalEnvironment {
    pub fn new(controller: Arc<ManagedEnvironment>, settings: LocalSettings) -> Self {
        Self {
            controller,
            settings,
        }
    }

    pub fn controller(&self) -> &Arc<ManagedEnvironment> {
        &self.controller
    }

    pub fn number_of_orgs(&self) -> u32 {
        self.settings.number_of_orgs
    }

    pub fn ports(&self) -> RangeInclusive<u16> {
        self.settings.start_port..=self.settings.end_port
    }

    /// Stops the chaincode containers matching `args` (typically name and version).
    /// This does not touch the lifecycle state.
    pub async fn kill_chaincode(
        &self,
        args: &[String],
        sink: Option<&dyn OutputSink>,
    ) -> Result<(), ProcessFailure> {
        log::debug!(
            "Killing chaincode {:?} on '{}'",
            args,
            self.controller.name()
        );
        self.controller
            .execute(SCRIPT_KILL_CHAINCODE, args.to_vec(), sink)
            .await
    }

    /// Like [`ManagedEnvironment::get_peer_chaincode_url`], defaulting to `Org1`.
    pub fn get_peer_chaincode_url(&self, org_name: Option<&str>) -> Result<String, DomainError> {
        self.controller
            .get_peer_chaincode_url(Some(org_name.unwrap_or(DEFAULT_LOCAL_ORG)))
    }
}

impl Deref for LocalEnvironment {
    type Target = ManagedEnvironment;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}
