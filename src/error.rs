//! # Cache Error Types
//!
//! The public error vocabulary of the cache contract.
//!
//! Only input-validation failures are surfaced as hard errors: a malformed
//! key or an unserializable value is a programmer error and fails before any
//! backend call. Environmental failures (secret not found, transport errors)
//! are a normal cache-miss condition and are absorbed into the
//! boolean/default-value vocabulary of [`crate::SecretCache`]; they never
//! appear here. The backend-side taxonomy lives in
//! [`crate::backend::BackendError`] and stays internal.

use thiserror::Error;

/// Errors surfaced by the cache contract
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache key fails shape validation.
    ///
    /// Keys must be non-empty, at most 255 characters, and restricted to
    /// ASCII letters, digits, `-` and `_` (the Secret Manager secret-ID
    /// shape). Raised before any backend call; in batched operations a
    /// single bad key fails the whole batch with zero backend calls.
    #[error("invalid secret ID {0:?}: keys must be non-empty and match [A-Za-z0-9_-]{{1,255}}")]
    InvalidKey(String),

    /// The value cannot be encoded for storage.
    #[error("unserializable value: {0}")]
    Unserializable(#[from] serde_json::Error),

    /// No project ID was supplied and `GOOGLE_CLOUD_PROJECT` is unset.
    ///
    /// Construction-time only; never raised per call.
    #[error("missing project ID as argument or environment variable")]
    MissingProject,
}
