// src/models.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CHAINCODE_TIMEOUT_SECS, DEFAULT_ENVIRONMENTS_DIR, DEFAULT_LOCAL_END_PORT,
    DEFAULT_LOCAL_START_PORT, LOCAL_ENVIRONMENT_NAME,
};

// --- ENVIRONMENT DESCRIPTORS ---
// These are persisted as `.config.json` inside each environment's registry entry.

/// The kind of network an environment descriptor points at.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentType {
    LocalManaged,
    AnsibleManaged,
    AnsibleUnmanaged,
    Remote,
}

impl EnvironmentType {
    /// Whether the environment is laid out as an ansible-style directory of
    /// lifecycle scripts and node files.
    pub fn is_ansible(self) -> bool {
        matches!(
            self,
            Self::LocalManaged | Self::AnsibleManaged | Self::AnsibleUnmanaged
        )
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LocalManaged => "local",
            Self::AnsibleManaged => "ansible-managed",
            Self::AnsibleUnmanaged => "ansible-unmanaged",
            Self::Remote => "remote",
        };
        f.write_str(label)
    }
}

/// A persisted record identifying a named network environment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDescriptor {
    pub name: String,
    #[serde(default)]
    pub managed_runtime: bool,
    pub environment_type: EnvironmentType,
    #[serde(default)]
    pub environment_directory: Option<PathBuf>,
}

impl EnvironmentDescriptor {
    pub fn new(
        name: impl Into<String>,
        environment_type: EnvironmentType,
        managed_runtime: bool,
        environment_directory: Option<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            managed_runtime,
            environment_type,
            environment_directory,
        }
    }

    /// True for descriptors whose process lifecycle this tool drives through scripts.
    pub fn is_managed_ansible(&self) -> bool {
        self.managed_runtime && self.environment_type.is_ansible()
    }
}

// --- RUNTIME STATE ---

/// The lifecycle state of a managed environment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeState {
    Starting,
    Started,
    Stopping,
    #[default]
    Stopped,
    Restarting,
}

impl RuntimeState {
    /// States that only exist while an operation is in flight.
    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Starting | Self::Stopping | Self::Restarting)
    }
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Starting => "starting",
            Self::Started => "started",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Restarting => "restarting",
        };
        f.write_str(label)
    }
}

// --- NODE INVENTORY ---
// Node records as written by the network's own tooling into `<env>/nodes/*.json`.

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    #[serde(rename = "fabric-peer")]
    Peer,
    #[serde(rename = "fabric-orderer")]
    Orderer,
    #[serde(rename = "fabric-ca")]
    CertificateAuthority,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FabricNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub chaincode_url: Option<String>,
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(default)]
    pub msp_id: Option<String>,
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub cluster_name: Option<String>,
}

impl FabricNode {
    /// Matches an organization either by its bare name (`Org1`) or by its MSP id (`Org1MSP`).
    pub fn belongs_to(&self, org_name: &str) -> bool {
        match &self.msp_id {
            Some(msp_id) => {
                msp_id == org_name || msp_id.strip_suffix("MSP") == Some(org_name)
            }
            None => false,
        }
    }
}

// --- SETTINGS (`settings.toml`) ---

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LocalSettings {
    /// The reserved name of the primary local network.
    #[serde(default = "default_local_name")]
    pub name: String,
    #[serde(default = "default_number_of_orgs")]
    pub number_of_orgs: u32,
    #[serde(default = "default_start_port")]
    pub start_port: u16,
    #[serde(default = "default_end_port")]
    pub end_port: u16,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            name: default_local_name(),
            number_of_orgs: default_number_of_orgs(),
            start_port: default_start_port(),
            end_port: default_end_port(),
        }
    }
}

/// Represents the deserialized structure of `settings.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Seconds a chaincode invocation may run before the peer gives up on it.
    #[serde(default = "default_chaincode_timeout")]
    pub chaincode_timeout: u64,
    /// Path template for the environment registry. Supports `~` and `$VAR`.
    #[serde(default = "default_environments_dir")]
    pub environments_dir: String,
    #[serde(default)]
    pub local: LocalSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chaincode_timeout: default_chaincode_timeout(),
            environments_dir: default_environments_dir(),
            local: LocalSettings::default(),
        }
    }
}

fn default_chaincode_timeout() -> u64 {
    DEFAULT_CHAINCODE_TIMEOUT_SECS
}

fn default_environments_dir() -> String {
    DEFAULT_ENVIRONMENTS_DIR.to_string()
}

fn default_local_name() -> String {
    LOCAL_ENVIRONMENT_NAME.to_string()
}

fn default_number_of_orgs() -> u32 {
    1
}

fn default_start_port() -> u16 {
    DEFAULT_LOCAL_START_PORT
}

fn default_end_port() -> u16 {
    DEFAULT_LOCAL_END_PORT
}
