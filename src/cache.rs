//! # Secret Cache
//!
//! The cache adapter over Secret Manager's append-only version model.
//!
//! One [`SecretCache`] is bound to one GCP project. Every operation is a
//! sequential chain of backend calls with no adapter-side locking or
//! transactions; concurrent callers race at the backend level. Backend
//! failures (dominated by not-found, which is an ordinary cache miss) are
//! absorbed into boolean/default-value outcomes; only input validation is a
//! hard error. See [`crate::error::CacheError`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{SecretManagerBackend, VersionSelector};
use crate::codec;
use crate::error::CacheError;

/// Simple cache interface over Google Cloud Secret Manager
///
/// Cheap to share (`Arc` the instance, or clone the inner backend handle);
/// safe for concurrent use. Provides no cross-operation coordination beyond
/// what Secret Manager itself guarantees.
pub struct SecretCache {
    backend: Arc<dyn SecretManagerBackend>,
    project_id: String,
}

impl std::fmt::Debug for SecretCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCache")
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl SecretCache {
    /// Environment variable consulted when no project ID is given
    pub const GCP_ENV_KEY: &'static str = "GOOGLE_CLOUD_PROJECT";

    /// Construct an instance for a specific project
    ///
    /// If no project ID is provided, the standard `GOOGLE_CLOUD_PROJECT`
    /// environment variable is used.
    ///
    /// # Errors
    /// Returns [`CacheError::MissingProject`] if neither source yields a
    /// project ID. This is the only construction-time failure; it is never
    /// deferred to call time.
    pub fn new(
        backend: Arc<dyn SecretManagerBackend>,
        project_id: Option<&str>,
    ) -> Result<Self, CacheError> {
        let project_id = match project_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => std::env::var(Self::GCP_ENV_KEY)
                .ok()
                .filter(|id| !id.is_empty())
                .ok_or(CacheError::MissingProject)?,
        };
        Ok(Self {
            backend,
            project_id,
        })
    }

    /// The GCP project this cache reads and writes
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Validate the Secret Manager secret-ID shape before any backend call
    fn validate_key(key: &str) -> Result<(), CacheError> {
        let valid = !key.is_empty()
            && key.len() <= 255
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid {
            Ok(())
        } else {
            Err(CacheError::InvalidKey(key.to_string()))
        }
    }

    /// Fetch a value from the project's secrets.
    ///
    /// Reads the latest version of `key` and decodes it (JSON if it parses,
    /// raw text otherwise). Any backend failure — including the secret not
    /// existing — yields `default`; "not found" never raises.
    ///
    /// # Errors
    /// Only [`CacheError::InvalidKey`].
    pub async fn get(&self, key: &str, default: Value) -> Result<Value, CacheError> {
        Self::validate_key(key)?;
        match self
            .backend
            .access_secret_version(&self.project_id, key, VersionSelector::Latest)
            .await
        {
            Ok(version) => Ok(version.data.map_or(default, |data| codec::decode(&data))),
            Err(error) => {
                debug!("cache miss for {}: {}", key, error);
                Ok(default)
            }
        }
    }

    /// Create an empty secret for `key`, with automatic replication.
    ///
    /// Returns `Ok(false)` if creation fails (typically: already exists).
    /// When a value is supplied and creation succeeded, one version is
    /// appended immediately (no TTL); the append outcome does not change the
    /// creation result.
    ///
    /// # Errors
    /// [`CacheError::InvalidKey`] or [`CacheError::Unserializable`], both
    /// raised before any backend call.
    pub async fn create<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: Option<&T>,
    ) -> Result<bool, CacheError> {
        Self::validate_key(key)?;
        let data = value.map(codec::encode).transpose()?;
        if let Err(error) = self.backend.create_secret(&self.project_id, key).await {
            debug!("create {} failed: {}", key, error);
            return Ok(false);
        }
        if let Some(data) = data {
            if let Err(error) = self
                .backend
                .add_secret_version(&self.project_id, key, data.as_bytes())
                .await
            {
                warn!("created {} but initial version append failed: {}", key, error);
            }
        }
        Ok(true)
    }

    /// Persist a value under `key`, with an optional pseudo-TTL.
    ///
    /// Secret Manager only appends: every `set` adds a new immutable
    /// version. A non-`None` `ttl` does **not** schedule expiry — it reads
    /// the current latest version first, appends, then destroys the captured
    /// prior version, best-effort. The read-append-destroy triplet is not
    /// atomic: a concurrent writer between the read and the destroy can
    /// cause the wrong version to be retired.
    ///
    /// If the append fails (typically: the secret does not exist yet), falls
    /// back to creating the secret and appending once more. Ordinary backend
    /// failures yield `Ok(false)`.
    ///
    /// # Errors
    /// [`CacheError::InvalidKey`] or [`CacheError::Unserializable`], both
    /// raised before any backend call.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        Self::validate_key(key)?;
        let data = codec::encode(value)?;
        Ok(self.write(key, data.as_bytes(), ttl.is_some()).await)
    }

    /// Append `data` as a new version, optionally retiring the prior latest.
    async fn write(&self, key: &str, data: &[u8], retire_previous: bool) -> bool {
        // Capture the current latest before appending so the retire step can
        // destroy exactly that version. Errors are ignored: the secret may
        // not exist yet.
        let previous = if retire_previous {
            self.backend
                .access_secret_version(&self.project_id, key, VersionSelector::Latest)
                .await
                .ok()
        } else {
            None
        };
        match self
            .backend
            .add_secret_version(&self.project_id, key, data)
            .await
        {
            Ok(()) => {
                if let Some(previous) = previous {
                    // Best effort, non-atomic with the append
                    if let Err(error) = self.backend.destroy_secret_version(&previous.name).await {
                        warn!("failed to retire prior version {}: {}", previous.name, error);
                    }
                }
                true
            }
            Err(error) => {
                debug!("append to {} failed ({}); falling back to create", key, error);
                match self.backend.create_secret(&self.project_id, key).await {
                    Ok(()) => self
                        .backend
                        .add_secret_version(&self.project_id, key, data)
                        .await
                        .is_ok(),
                    Err(error) => {
                        debug!("fallback create {} failed: {}", key, error);
                        false
                    }
                }
            }
        }
    }

    /// Delete the secret under `key`, destroying all of its versions.
    ///
    /// Failure (e.g. not found) yields `Ok(false)`.
    ///
    /// # Errors
    /// Only [`CacheError::InvalidKey`].
    pub async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Self::validate_key(key)?;
        match self.backend.delete_secret(&self.project_id, key).await {
            Ok(()) => Ok(true),
            Err(error) => {
                debug!("delete {} failed: {}", key, error);
                Ok(false)
            }
        }
    }

    /// Wipe every secret in the project.
    ///
    /// Destructive and unscoped: this deletes **all** secrets under the
    /// project, not only keys this cache wrote. The first failure aborts the
    /// remaining work and returns `false`; secrets already deleted stay
    /// deleted (no rollback).
    pub async fn clear(&self) -> bool {
        info!("clearing all secrets in project {}", self.project_id);
        let secret_ids = match self.backend.list_secrets(&self.project_id).await {
            Ok(ids) => ids,
            Err(error) => {
                warn!("clear aborted: listing secrets failed: {}", error);
                return false;
            }
        };
        for secret_id in secret_ids {
            if let Err(error) = self.backend.delete_secret(&self.project_id, &secret_id).await {
                warn!("clear aborted at {}: {}", secret_id, error);
                return false;
            }
        }
        true
    }

    /// Whether a secret exists under `key`.
    ///
    /// Fetches secret metadata only; no version payload is accessed.
    ///
    /// NOTE: use this as a hint (cache warming and the like), not for
    /// correctness — existence may change between this call and a subsequent
    /// `get`/`set`.
    ///
    /// # Errors
    /// Only [`CacheError::InvalidKey`].
    pub async fn has(&self, key: &str) -> Result<bool, CacheError> {
        Self::validate_key(key)?;
        Ok(self.backend.get_secret(&self.project_id, key).await.is_ok())
    }

    /// Fetch multiple keys with a shared default.
    ///
    /// All keys are validated up front: one bad key fails the whole batch
    /// with zero backend calls. After that, each key is an independent
    /// `get`; per-key failures degrade to `default` and never abort the
    /// batch. The returned pairs preserve input order.
    ///
    /// # Errors
    /// Only [`CacheError::InvalidKey`].
    pub async fn get_multiple(
        &self,
        keys: &[&str],
        default: &Value,
    ) -> Result<Vec<(String, Value)>, CacheError> {
        for key in keys {
            Self::validate_key(key)?;
        }
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get(key, default.clone()).await?;
            results.push(((*key).to_string(), value));
        }
        Ok(results)
    }

    /// Persist multiple entries, with an optional shared pseudo-TTL.
    ///
    /// Keys are validated and values encoded before any backend call, so an
    /// input-validation error aborts the whole batch with zero RPCs. Every
    /// entry is then attempted regardless of earlier failures (no
    /// short-circuit, no atomicity); the result is the AND of all per-entry
    /// outcomes.
    ///
    /// # Errors
    /// [`CacheError::InvalidKey`] or [`CacheError::Unserializable`].
    pub async fn set_multiple<T: Serialize>(
        &self,
        entries: &[(&str, T)],
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        let mut encoded = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            Self::validate_key(key)?;
            encoded.push((*key, codec::encode(value)?));
        }
        let mut success = true;
        for (key, data) in encoded {
            let written = self.write(key, data.as_bytes(), ttl.is_some()).await;
            success = success && written;
        }
        Ok(success)
    }

    /// Delete multiple keys.
    ///
    /// Same aggregation policy as [`SecretCache::set_multiple`]: whole-batch
    /// key validation first, then independent per-key deletes, AND-combined,
    /// with every key attempted.
    ///
    /// # Errors
    /// Only [`CacheError::InvalidKey`].
    pub async fn delete_multiple(&self, keys: &[&str]) -> Result<bool, CacheError> {
        for key in keys {
            Self::validate_key(key)?;
        }
        let mut success = true;
        for key in keys {
            let deleted = self.delete(key).await?;
            success = success && deleted;
        }
        Ok(success)
    }
}
