// src/core/registry.rs

use crate::constants::DESCRIPTOR_FILENAME;
use crate::models::EnvironmentDescriptor;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    // Names double as directory names, so no separators or leading dots.
    static ref VALID_NAME: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _.\-]*$").expect("environment name pattern is valid");
}

/// Represents errors that can occur while reading or writing persisted descriptors.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Filesystem error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Descriptor '{path}' is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Environment '{name}' does not exist.")]
    NotFound { name: String },
    #[error("Environment '{name}' already exists.")]
    AlreadyExists { name: String },
    #[error("'{name}' is not a valid environment name.")]
    InvalidName { name: String },
}

type RegistryResult<T> = Result<T, RegistryError>;

fn io_error(path: &Path, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// File-backed store of environment descriptors.
///
/// Each environment owns a directory `<root>/<name>/` holding its
/// `.config.json`. Managed environments created here also use that
/// directory as their environment directory.
#[derive(Debug, Clone)]
pub struct EnvironmentRegistry {
    root: PathBuf,
}

impl EnvironmentRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn entry_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn descriptor_path(&self, name: &str) -> PathBuf {
        self.entry_dir(name).join(DESCRIPTOR_FILENAME)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.descriptor_path(name).is_file()
    }

    pub fn get(&self, name: &str) -> RegistryResult<EnvironmentDescriptor> {
        let path = self.descriptor_path(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RegistryError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(io_error(&path, e)),
        };
        serde_json::from_str(&content).map_err(|source| RegistryError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// All descriptors, sorted by name. Entries without a descriptor file are skipped.
    pub fn get_all(&self) -> RegistryResult<Vec<EnvironmentDescriptor>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.root, e)),
        };

        let mut descriptors = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(&self.root, e))?;
            if !entry.path().join(DESCRIPTOR_FILENAME).is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match self.get(&name) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => log::warn!("Skipping unreadable environment '{}': {}", name, e),
            }
        }
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(descriptors)
    }

    pub fn add(&self, descriptor: &EnvironmentDescriptor) -> RegistryResult<()> {
        if !VALID_NAME.is_match(&descriptor.name) {
            return Err(RegistryError::InvalidName {
                name: descriptor.name.clone(),
            });
        }
        if self.exists(&descriptor.name) {
            return Err(RegistryError::AlreadyExists {
                name: descriptor.name.clone(),
            });
        }
        let dir = self.entry_dir(&descriptor.name);
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        self.write(descriptor)?;
        log::info!("Registered environment '{}'", descriptor.name);
        Ok(())
    }

    pub fn update(&self, descriptor: &EnvironmentDescriptor) -> RegistryResult<()> {
        if !self.exists(&descriptor.name) {
            return Err(RegistryError::NotFound {
                name: descriptor.name.clone(),
            });
        }
        self.write(descriptor)
    }

    /// Removes the registry entry for `name`, including anything stored in its directory.
    pub fn delete(&self, name: &str) -> RegistryResult<()> {
        if !self.exists(name) {
            return Err(RegistryError::NotFound {
                name: name.to_string(),
            });
        }
        let dir = self.entry_dir(name);
        fs::remove_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        log::info!("Removed environment '{}'", name);
        Ok(())
    }

    fn write(&self, descriptor: &EnvironmentDescriptor) -> RegistryResult<()> {
        let path = self.descriptor_path(&descriptor.name);
        let json = serde_json::to_string_pretty(descriptor).map_err(|source| RegistryError::Json {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(&path, json).map_err(|e| io_error(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnvironmentType;
    use tempfile::tempdir;

    fn descriptor(registry: &EnvironmentRegistry, name: &str) -> EnvironmentDescriptor {
        EnvironmentDescriptor::new(
            name,
            EnvironmentType::AnsibleManaged,
            true,
            Some(registry.entry_dir(name)),
        )
    }

    #[test]
    fn test_add_get_and_list() {
        let dir = tempdir().unwrap();
        let registry = EnvironmentRegistry::new(dir.path());

        registry.add(&descriptor(&registry, "zeta")).unwrap();
        registry.add(&descriptor(&registry, "1 Org Local Fabric")).unwrap();

        let fetched = registry.get("zeta").unwrap();
        assert_eq!(fetched, descriptor(&registry, "zeta"));

        let names: Vec<String> = registry
            .get_all()
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["1 Org Local Fabric", "zeta"]);
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        let dir = tempdir().unwrap();
        let registry = EnvironmentRegistry::new(dir.path().join("nowhere"));
        assert!(registry.get_all().unwrap().is_empty());
        assert!(matches!(
            registry.get("ghost"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_and_invalid_names_rejected() {
        let dir = tempdir().unwrap();
        let registry = EnvironmentRegistry::new(dir.path());
        registry.add(&descriptor(&registry, "net")).unwrap();

        assert!(matches!(
            registry.add(&descriptor(&registry, "net")),
            Err(RegistryError::AlreadyExists { .. })
        ));
        assert!(matches!(
            registry.add(&descriptor(&registry, "../escape")),
            Err(RegistryError::InvalidName { .. })
        ));
        assert!(matches!(
            registry.add(&descriptor(&registry, "")),
            Err(RegistryError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let dir = tempdir().unwrap();
        let registry = EnvironmentRegistry::new(dir.path());
        let mut net = descriptor(&registry, "net");
        registry.add(&net).unwrap();

        net.managed_runtime = false;
        net.environment_type = EnvironmentType::AnsibleUnmanaged;
        registry.update(&net).unwrap();
        assert_eq!(registry.get("net").unwrap(), net);

        registry.delete("net").unwrap();
        assert!(!registry.exists("net"));
        assert!(matches!(
            registry.delete("net"),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(matches!(
            registry.update(&net),
            Err(RegistryError::NotFound { .. })
        ));
    }
}
