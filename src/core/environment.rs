// src/core/environment.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::local::LocalEnvironment;
use crate::core::managed::ManagedEnvironment;
use crate::core::nodes::{self, DomainError, NodeInventory};
use crate::models::{EnvironmentDescriptor, EnvironmentType, FabricNode};

/// An ansible-style environment whose processes are owned by someone else.
/// It can be inspected but never started or stopped from here.
#[derive(Debug, Clone)]
pub struct UnmanagedEnvironment {
    name: String,
    directory: PathBuf,
}

impl UnmanagedEnvironment {
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn get_nodes(&self) -> Result<Vec<FabricNode>, DomainError> {
        NodeInventory::for_environment(&self.directory).get_nodes()
    }

    pub fn get_peer_chaincode_url(&self, org_name: Option<&str>) -> Result<String, DomainError> {
        nodes::peer_chaincode_url(&self.get_nodes()?, org_name)
    }
}

/// Any other environment. Only its metadata is available.
#[derive(Debug, Clone)]
pub struct RemoteEnvironment {
    descriptor: EnvironmentDescriptor,
}

impl RemoteEnvironment {
    pub fn new(descriptor: EnvironmentDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &EnvironmentDescriptor {
        &self.descriptor
    }

    /// Node records imported alongside the descriptor, if it has a directory.
    pub fn get_nodes(&self) -> Result<Vec<FabricNode>, DomainError> {
        match &self.descriptor.environment_directory {
            Some(dir) => NodeInventory::for_environment(dir).get_nodes(),
            None => Ok(Vec::new()),
        }
    }
}

/// What the factory hands out for a descriptor.
#[derive(Debug, Clone)]
pub enum EnvironmentHandle {
    Local(Arc<LocalEnvironment>),
    Managed(Arc<ManagedEnvironment>),
    Unmanaged(UnmanagedEnvironment),
    Remote(RemoteEnvironment),
}

impl EnvironmentHandle {
    pub fn name(&self) -> &str {
        match self {
            Self::Local(env) => env.name(),
            Self::Managed(env) => env.name(),
            Self::Unmanaged(env) => env.name(),
            Self::Remote(env) => env.name(),
        }
    }

    pub fn environment_type(&self) -> EnvironmentType {
        match self {
            Self::Local(_) => EnvironmentType::LocalManaged,
            Self::Managed(_) => EnvironmentType::AnsibleManaged,
            Self::Unmanaged(_) => EnvironmentType::AnsibleUnmanaged,
            Self::Remote(env) => env.descriptor().environment_type,
        }
    }

    /// The lifecycle controller, for handles that have one.
    pub fn controller(&self) -> Option<&Arc<ManagedEnvironment>> {
        match self {
            Self::Local(env) => Some(env.controller()),
            Self::Managed(env) => Some(env),
            Self::Unmanaged(_) | Self::Remote(_) => None,
        }
    }

    pub fn get_nodes(&self) -> Result<Vec<FabricNode>, DomainError> {
        match self {
            Self::Local(env) => env.get_nodes(),
            Self::Managed(env) => env.get_nodes(),
            Self::Unmanaged(env) => env.get_nodes(),
            Self::Remote(env) => env.get_nodes(),
        }
    }

    /// Remote handles resolve against whatever node records they carry.
    pub fn get_peer_chaincode_url(&self, org_name: Option<&str>) -> Result<String, DomainError> {
        match self {
            Self::Local(env) => env.get_peer_chaincode_url(org_name),
            Self::Managed(env) => env.get_peer_chaincode_url(org_name),
            Self::Unmanaged(env) => env.get_peer_chaincode_url(org_name),
            Self::Remote(env) => nodes::peer_chaincode_url(&env.get_nodes()?, org_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::nodes::{ORG1_PEER, write_node};
    use tempfile::tempdir;

    #[test]
    fn test_unmanaged_inspection() {
        let dir = tempdir().unwrap();
        write_node(dir.path(), "peer.json", ORG1_PEER);
        let handle = EnvironmentHandle::Unmanaged(UnmanagedEnvironment::new("ext", dir.path()));

        assert!(handle.controller().is_none());
        assert_eq!(handle.get_nodes().unwrap().len(), 1);
        assert_eq!(handle.environment_type(), EnvironmentType::AnsibleUnmanaged);
        assert_eq!(
            handle.get_peer_chaincode_url(Some("Org1")).unwrap(),
            "grpc://localhost:17052"
        );
    }

    #[test]
    fn test_remote_without_directory_has_no_nodes() {
        let handle = EnvironmentHandle::Remote(RemoteEnvironment::new(EnvironmentDescriptor::new(
            "prod",
            EnvironmentType::Remote,
            false,
            None,
        )));

        assert_eq!(handle.name(), "prod");
        assert!(handle.controller().is_none());
        assert!(handle.get_nodes().unwrap().is_empty());
        assert!(matches!(
            handle.get_peer_chaincode_url(None),
            Err(DomainError::NoPeerNodes)
        ));
    }
}
