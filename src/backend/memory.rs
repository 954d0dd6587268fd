//! # In-Memory Backend
//!
//! An in-process [`SecretManagerBackend`] that models Secret Manager's
//! version chains: per-secret ordered versions with 1-based ordinals and a
//! DESTROYED state. Used by the contract tests, and handy for local
//! development without GCP credentials.
//!
//! Version-state inspection ([`MemoryBackend::version_states`]) is exposed
//! so tests can verify which versions a write retired.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::{
    AccessedVersion, BackendError, SecretManagerBackend, SecretMetadata, VersionSelector,
};

#[derive(Debug, Default)]
struct SecretRecord {
    versions: Vec<VersionRecord>,
}

#[derive(Debug)]
struct VersionRecord {
    data: Vec<u8>,
    destroyed: bool,
}

/// Observable state of one version, for test assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionState {
    /// 1-based ordinal, as in `versions/{n}` resource names
    pub ordinal: u64,
    /// Whether the version has been destroyed (payload gone)
    pub destroyed: bool,
}

/// In-process Secret Manager backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    secrets: RwLock<HashMap<(String, String), SecretRecord>>,
}

impl MemoryBackend {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerate version states of a secret, in append order
    ///
    /// Returns `None` if the secret does not exist.
    pub async fn version_states(
        &self,
        project_id: &str,
        secret_id: &str,
    ) -> Option<Vec<VersionState>> {
        let secrets = self.secrets.read().await;
        let record = secrets.get(&(project_id.to_string(), secret_id.to_string()))?;
        Some(
            record
                .versions
                .iter()
                .enumerate()
                .map(|(index, version)| VersionState {
                    ordinal: index as u64 + 1,
                    destroyed: version.destroyed,
                })
                .collect(),
        )
    }

    fn version_resource_name(project_id: &str, secret_id: &str, ordinal: u64) -> String {
        format!("projects/{project_id}/secrets/{secret_id}/versions/{ordinal}")
    }

    /// Parse `projects/{p}/secrets/{s}/versions/{n}` into its components
    fn parse_version_name(version_name: &str) -> Option<(String, String, u64)> {
        let parts: Vec<&str> = version_name.split('/').collect();
        match parts.as_slice() {
            ["projects", project, "secrets", secret, "versions", ordinal] => Some((
                (*project).to_string(),
                (*secret).to_string(),
                ordinal.parse().ok()?,
            )),
            _ => None,
        }
    }
}

#[async_trait]
impl SecretManagerBackend for MemoryBackend {
    async fn create_secret(&self, project_id: &str, secret_id: &str) -> Result<(), BackendError> {
        let mut secrets = self.secrets.write().await;
        let key = (project_id.to_string(), secret_id.to_string());
        if secrets.contains_key(&key) {
            return Err(BackendError::AlreadyExists(format!(
                "projects/{project_id}/secrets/{secret_id}"
            )));
        }
        secrets.insert(key, SecretRecord::default());
        Ok(())
    }

    async fn add_secret_version(
        &self,
        project_id: &str,
        secret_id: &str,
        data: &[u8],
    ) -> Result<(), BackendError> {
        let mut secrets = self.secrets.write().await;
        let record = secrets
            .get_mut(&(project_id.to_string(), secret_id.to_string()))
            .ok_or_else(|| {
                BackendError::NotFound(format!("projects/{project_id}/secrets/{secret_id}"))
            })?;
        record.versions.push(VersionRecord {
            data: data.to_vec(),
            destroyed: false,
        });
        Ok(())
    }

    async fn access_secret_version(
        &self,
        project_id: &str,
        secret_id: &str,
        version: VersionSelector,
    ) -> Result<AccessedVersion, BackendError> {
        let secrets = self.secrets.read().await;
        let record = secrets
            .get(&(project_id.to_string(), secret_id.to_string()))
            .ok_or_else(|| {
                BackendError::NotFound(format!("projects/{project_id}/secrets/{secret_id}"))
            })?;
        let not_found = || {
            BackendError::NotFound(format!(
                "projects/{project_id}/secrets/{secret_id}/versions/{version}"
            ))
        };
        let (index, record) = match version {
            // Latest resolves to the most recently appended, non-destroyed version
            VersionSelector::Latest => record
                .versions
                .iter()
                .enumerate()
                .rev()
                .find(|(_, v)| !v.destroyed)
                .ok_or_else(not_found)?,
            VersionSelector::Ordinal(ordinal) => {
                let index = usize::try_from(ordinal)
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .ok_or_else(not_found)?;
                let record = record
                    .versions
                    .get(index)
                    .filter(|v| !v.destroyed)
                    .ok_or_else(not_found)?;
                (index, record)
            }
        };
        Ok(AccessedVersion {
            name: Self::version_resource_name(project_id, secret_id, index as u64 + 1),
            data: Some(record.data.clone()),
        })
    }

    async fn destroy_secret_version(&self, version_name: &str) -> Result<(), BackendError> {
        let (project_id, secret_id, ordinal) = Self::parse_version_name(version_name)
            .ok_or_else(|| BackendError::NotFound(version_name.to_string()))?;
        let mut secrets = self.secrets.write().await;
        let record = secrets
            .get_mut(&(project_id, secret_id))
            .ok_or_else(|| BackendError::NotFound(version_name.to_string()))?;
        let version = usize::try_from(ordinal)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| record.versions.get_mut(index))
            .ok_or_else(|| BackendError::NotFound(version_name.to_string()))?;
        version.destroyed = true;
        version.data.clear();
        Ok(())
    }

    async fn delete_secret(&self, project_id: &str, secret_id: &str) -> Result<(), BackendError> {
        let mut secrets = self.secrets.write().await;
        secrets
            .remove(&(project_id.to_string(), secret_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| {
                BackendError::NotFound(format!("projects/{project_id}/secrets/{secret_id}"))
            })
    }

    async fn list_secrets(&self, project_id: &str) -> Result<Vec<String>, BackendError> {
        let secrets = self.secrets.read().await;
        let mut secret_ids: Vec<String> = secrets
            .keys()
            .filter(|(project, _)| project == project_id)
            .map(|(_, secret)| secret.clone())
            .collect();
        secret_ids.sort();
        Ok(secret_ids)
    }

    async fn get_secret(
        &self,
        project_id: &str,
        secret_id: &str,
    ) -> Result<SecretMetadata, BackendError> {
        let secrets = self.secrets.read().await;
        let key = (project_id.to_string(), secret_id.to_string());
        if secrets.contains_key(&key) {
            Ok(SecretMetadata {
                name: format!("projects/{project_id}/secrets/{secret_id}"),
            })
        } else {
            Err(BackendError::NotFound(format!(
                "projects/{project_id}/secrets/{secret_id}"
            )))
        }
    }
}
