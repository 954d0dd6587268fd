//! # Secrets Registry
//!
//! Memoized per-project [`SecretCache`] instances behind one shared backend.
//!
//! Plays the role of a process-wide accessor without being one: the registry
//! is an explicitly owned object, so tests and libraries can hold
//! independent registries with no cross-instance pollution. Construct one
//! `Secrets` where the application wires its dependencies and share it
//! (`Arc`) from there.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::backend::SecretManagerBackend;
use crate::cache::SecretCache;
use crate::error::CacheError;

/// Lazily constructed, memoized caches, one per GCP project
pub struct Secrets {
    backend: Arc<dyn SecretManagerBackend>,
    caches: RwLock<HashMap<String, Arc<SecretCache>>>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets").finish_non_exhaustive()
    }
}

impl Secrets {
    /// Create a registry sharing `backend` across all projects
    #[must_use]
    pub fn new(backend: Arc<dyn SecretManagerBackend>) -> Self {
        Self {
            backend,
            caches: RwLock::new(HashMap::new()),
        }
    }

    /// Get (or lazily construct) the cache for a project
    ///
    /// With `None`, the project is resolved from `GOOGLE_CLOUD_PROJECT`, the
    /// same as constructing a [`SecretCache`] directly.
    ///
    /// # Errors
    /// Returns [`CacheError::MissingProject`] when no project ID can be
    /// resolved.
    pub async fn cache(&self, project_id: Option<&str>) -> Result<Arc<SecretCache>, CacheError> {
        // Resolve first so explicit and environment-derived requests for the
        // same project share one instance
        let resolved = match project_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => std::env::var(SecretCache::GCP_ENV_KEY)
                .ok()
                .filter(|id| !id.is_empty())
                .ok_or(CacheError::MissingProject)?,
        };
        if let Some(cache) = self.caches.read().await.get(&resolved) {
            return Ok(Arc::clone(cache));
        }
        let mut caches = self.caches.write().await;
        // Re-check under the write lock; another caller may have raced us
        if let Some(cache) = caches.get(&resolved) {
            return Ok(Arc::clone(cache));
        }
        let cache = Arc::new(SecretCache::new(
            Arc::clone(&self.backend),
            Some(&resolved),
        )?);
        caches.insert(resolved, Arc::clone(&cache));
        Ok(cache)
    }

    /// Convenience passthrough to [`SecretCache::create`]
    ///
    /// # Errors
    /// [`CacheError::MissingProject`], [`CacheError::InvalidKey`] or
    /// [`CacheError::Unserializable`].
    pub async fn create<T: Serialize + ?Sized>(
        &self,
        secret_id: &str,
        data: Option<&T>,
        project_id: Option<&str>,
    ) -> Result<bool, CacheError> {
        self.cache(project_id).await?.create(secret_id, data).await
    }

    /// Convenience passthrough to [`SecretCache::set`] (no TTL)
    ///
    /// # Errors
    /// [`CacheError::MissingProject`], [`CacheError::InvalidKey`] or
    /// [`CacheError::Unserializable`].
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        secret_id: &str,
        data: &T,
        project_id: Option<&str>,
    ) -> Result<bool, CacheError> {
        self.cache(project_id).await?.set(secret_id, data, None).await
    }

    /// Convenience passthrough to [`SecretCache::get`] with a null default
    ///
    /// # Errors
    /// [`CacheError::MissingProject`] or [`CacheError::InvalidKey`].
    pub async fn get(
        &self,
        secret_id: &str,
        project_id: Option<&str>,
    ) -> Result<Value, CacheError> {
        self.cache(project_id).await?.get(secret_id, Value::Null).await
    }
}
