//! # Secret Manager Backend
//!
//! The narrow Secret Manager surface consumed by [`crate::SecretCache`]:
//! seven primitives over per-secret immutable version chains.
//!
//! Two implementations are provided:
//! - [`rest::SecretManagerRest`]: native REST client using reqwest with
//!   rustls (no gRPC SDK, no OpenSSL dependencies)
//! - [`memory::MemoryBackend`]: in-process version chains for tests
//!
//! Errors here are the *internal* vocabulary. The cache deliberately keeps
//! them separate from [`crate::CacheError`]: not-found is an ordinary cache
//! miss at the contract boundary, but internal code can still distinguish it
//! from a transport failure.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

/// Backend-originated errors, never propagated across the cache contract
#[derive(Debug, Error)]
pub enum BackendError {
    /// Secret or version does not exist (or is destroyed/disabled)
    #[error("not found: {0}")]
    NotFound(String),

    /// Secret already exists (create collision)
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Any other API-level failure (auth, quota, server error)
    #[error("secret manager API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Connection-level failure before an API response was obtained
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected API schema
    #[error("malformed API response: {0}")]
    MalformedResponse(String),
}

/// Selects which version of a secret to access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    /// The most recently added, non-destroyed version
    Latest,
    /// An explicit version ordinal (1-based, as assigned by the backend)
    Ordinal(u64),
}

impl std::fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionSelector::Latest => write!(f, "latest"),
            VersionSelector::Ordinal(n) => write!(f, "{n}"),
        }
    }
}

/// A version resolved by [`SecretManagerBackend::access_secret_version`]
///
/// Carries the full resource name so the caller can later destroy exactly
/// this version, plus the decoded payload bytes (if the version has one).
#[derive(Debug, Clone)]
pub struct AccessedVersion {
    /// Full resource name: `projects/{project}/secrets/{secret}/versions/{n}`
    pub name: String,
    /// Payload bytes, already base64-decoded; `None` if the version carries
    /// no payload
    pub data: Option<Vec<u8>>,
}

/// Secret metadata, as returned by a metadata-only fetch (no payload access)
#[derive(Debug, Clone)]
pub struct SecretMetadata {
    /// Full resource name: `projects/{project}/secrets/{secret}`
    pub name: String,
}

/// The Secret Manager primitives the cache adapter is built from
///
/// One implementation instance is shared process-wide (the REST client wraps
/// a single `reqwest::Client`); all methods take `&self` and are safe to
/// call concurrently. The backend provides no cross-call coordination:
/// append ordering within a secret is whatever the service guarantees.
#[async_trait]
pub trait SecretManagerBackend: Send + Sync {
    /// Create an empty secret with automatic replication.
    async fn create_secret(&self, project_id: &str, secret_id: &str) -> Result<(), BackendError>;

    /// Append an immutable version holding `data` to an existing secret.
    async fn add_secret_version(
        &self,
        project_id: &str,
        secret_id: &str,
        data: &[u8],
    ) -> Result<(), BackendError>;

    /// Access one version's payload (and resource name).
    async fn access_secret_version(
        &self,
        project_id: &str,
        secret_id: &str,
        version: VersionSelector,
    ) -> Result<AccessedVersion, BackendError>;

    /// Irreversibly destroy one version, addressed by full resource name.
    async fn destroy_secret_version(&self, version_name: &str) -> Result<(), BackendError>;

    /// Delete a secret and all of its versions.
    async fn delete_secret(&self, project_id: &str, secret_id: &str) -> Result<(), BackendError>;

    /// Enumerate all secret IDs in a project.
    ///
    /// The REST implementation follows pagination internally; a failure on
    /// any page fails the whole enumeration.
    async fn list_secrets(&self, project_id: &str) -> Result<Vec<String>, BackendError>;

    /// Fetch secret metadata without touching any version payload.
    async fn get_secret(
        &self,
        project_id: &str,
        secret_id: &str,
    ) -> Result<SecretMetadata, BackendError>;
}

impl BackendError {
    /// Whether this error means the secret or version simply does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_selector_display() {
        assert_eq!(VersionSelector::Latest.to_string(), "latest");
        assert_eq!(VersionSelector::Ordinal(7).to_string(), "7");
    }

    #[test]
    fn test_is_not_found() {
        assert!(BackendError::NotFound("projects/p/secrets/s".into()).is_not_found());
        assert!(!BackendError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_not_found());
    }
}
