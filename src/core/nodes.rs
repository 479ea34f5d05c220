// src/core/nodes.rs

use crate::constants::NODES_DIR;
use crate::models::{FabricNode, NodeType};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised by queries over an environment's node records.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("There are no Fabric peer nodes")]
    NoPeerNodes,
    #[error("There are no Fabric peer nodes for organization '{org}'")]
    NoPeerNodesForOrg { org: String },
    #[error("Could not read node records from '{path}': {source}")]
    Inventory {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Node record '{path}' is malformed: {source}")]
    MalformedNode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads node records from `<environment>/nodes/*.json`.
#[derive(Debug, Clone)]
pub struct NodeInventory {
    nodes_dir: PathBuf,
}

impl NodeInventory {
    pub fn for_environment(environment_dir: &Path) -> Self {
        Self {
            nodes_dir: environment_dir.join(NODES_DIR),
        }
    }

    /// Loads every node record, sorted by name. A missing `nodes/` directory
    /// means the network has not been generated yet and yields no nodes.
    pub fn get_nodes(&self) -> Result<Vec<FabricNode>, DomainError> {
        if !self.nodes_dir.is_dir() {
            log::debug!(
                "No nodes directory at '{}', returning an empty inventory",
                self.nodes_dir.display()
            );
            return Ok(Vec::new());
        }

        let mut nodes = Vec::new();
        for entry in WalkDir::new(&self.nodes_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| DomainError::Inventory {
                path: self.nodes_dir.display().to_string(),
                source: e.into(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some("json")
            {
                continue;
            }
            let content = fs::read_to_string(path).map_err(|source| DomainError::Inventory {
                path: path.display().to_string(),
                source,
            })?;
            let node: FabricNode =
                serde_json::from_str(&content).map_err(|source| DomainError::MalformedNode {
                    path: path.display().to_string(),
                    source,
                })?;
            nodes.push(node);
        }
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }
}

// --- Queries over a loaded node list ---

fn find_peer<'a>(nodes: &'a [FabricNode], org_name: Option<&str>) -> Result<&'a FabricNode, DomainError> {
    let mut peers = nodes.iter().filter(|n| n.node_type == NodeType::Peer);
    match org_name {
        Some(org) => peers
            .find(|n| n.belongs_to(org))
            .ok_or_else(|| DomainError::NoPeerNodesForOrg {
                org: org.to_string(),
            }),
        None => peers.next().ok_or(DomainError::NoPeerNodes),
    }
}

/// The chaincode endpoint of the first peer (of `org_name`, if given).
pub fn peer_chaincode_url(nodes: &[FabricNode], org_name: Option<&str>) -> Result<String, DomainError> {
    let peer = find_peer(nodes, org_name)?;
    peer.chaincode_url.clone().ok_or_else(|| match org_name {
        Some(org) => DomainError::NoPeerNodesForOrg {
            org: org.to_string(),
        },
        None => DomainError::NoPeerNodes,
    })
}

/// The docker container name of the first peer.
pub fn peer_container_name(nodes: &[FabricNode]) -> Result<String, DomainError> {
    nodes
        .iter()
        .filter(|n| n.node_type == NodeType::Peer)
        .find_map(|n| n.container_name.clone())
        .ok_or(DomainError::NoPeerNodes)
}

/// Organization names derived from peer MSP ids (`Org1MSP` -> `Org1`), deduplicated and sorted.
pub fn organization_names(nodes: &[FabricNode]) -> Vec<String> {
    nodes
        .iter()
        .filter(|n| n.node_type == NodeType::Peer)
        .filter_map(|n| n.msp_id.as_deref())
        .map(|msp_id| msp_id.strip_suffix("MSP").unwrap_or(msp_id).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
pub(crate) fn write_node(environment_dir: &Path, file_name: &str, json: &str) {
    let nodes_dir = environment_dir.join(NODES_DIR);
    fs::create_dir_all(&nodes_dir).unwrap();
    fs::write(nodes_dir.join(file_name), json).unwrap();
}

#[cfg(test)]
pub(crate) const ORG1_PEER: &str = r#"{
    "name": "Org1Peer1",
    "type": "fabric-peer",
    "api_url": "grpc://localhost:17051",
    "chaincode_url": "grpc://localhost:17052",
    "container_name": "fabricvscodelocalfabric_peer0.org1.example.com",
    "msp_id": "Org1MSP",
    "wallet": "Org1",
    "identity": "admin"
}"#;

#[cfg(test)]
pub(crate) const ORDERER: &str = r#"{
    "name": "Orderer",
    "type": "fabric-orderer",
    "api_url": "grpc://localhost:17050",
    "msp_id": "OrdererMSP"
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_nodes_dir_is_empty() {
        let dir = tempdir().unwrap();
        let nodes = NodeInventory::for_environment(dir.path()).get_nodes().unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_reads_only_json_records() {
        let dir = tempdir().unwrap();
        write_node(dir.path(), "peer.json", ORG1_PEER);
        write_node(dir.path(), "orderer.json", ORDERER);
        write_node(dir.path(), "README.txt", "not a node");

        let nodes = NodeInventory::for_environment(dir.path()).get_nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "Orderer");
        assert_eq!(nodes[1].name, "Org1Peer1");
    }

    #[test]
    fn test_malformed_record_is_reported() {
        let dir = tempdir().unwrap();
        write_node(dir.path(), "broken.json", "{ \"name\": ");

        let result = NodeInventory::for_environment(dir.path()).get_nodes();
        assert!(matches!(result, Err(DomainError::MalformedNode { .. })));
    }

    #[test]
    fn test_peer_queries() {
        let nodes: Vec<FabricNode> = vec![
            serde_json::from_str(ORDERER).unwrap(),
            serde_json::from_str(ORG1_PEER).unwrap(),
        ];

        assert_eq!(
            peer_chaincode_url(&nodes, None).unwrap(),
            "grpc://localhost:17052"
        );
        assert_eq!(
            peer_chaincode_url(&nodes, Some("Org1")).unwrap(),
            "grpc://localhost:17052"
        );
        assert!(matches!(
            peer_chaincode_url(&nodes, Some("Org2")),
            Err(DomainError::NoPeerNodesForOrg { .. })
        ));
        assert_eq!(
            peer_container_name(&nodes).unwrap(),
            "fabricvscodelocalfabric_peer0.org1.example.com"
        );
        assert_eq!(organization_names(&nodes), vec!["Org1".to_string()]);
    }

    #[test]
    fn test_no_peer_nodes() {
        let nodes: Vec<FabricNode> = vec![serde_json::from_str(ORDERER).unwrap()];
        assert!(matches!(
            peer_chaincode_url(&nodes, None),
            Err(DomainError::NoPeerNodes)
        ));
        assert!(matches!(
            peer_container_name(&nodes),
            Err(DomainError::NoPeerNodes)
        ));
    }
}
