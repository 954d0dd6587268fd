//! # lazy-secrets
//!
//! Lazily store and retrieve key-value pairs from Google Cloud Secret Manager
//! through a simple cache interface.
//!
//! Secret Manager is an append-only, versioned store: a secret holds an
//! immutable chain of versions, and "updating" a value really means appending
//! a new version. This crate adapts that model to a flat cache contract
//! (`get` / `set` / `delete` / `has` / `clear` plus batched variants):
//!
//! - [`SecretCache`] is the adapter, bound to one GCP project.
//! - [`codec`] decides per value whether a payload is stored as raw text or
//!   JSON, and reverses that decision heuristically on read.
//! - [`backend`] is the narrow Secret Manager surface the adapter consumes:
//!   a trait with REST and in-memory implementations.
//! - [`Secrets`] memoizes one cache per project for callers that want a
//!   shared, process-wide accessor without global state.
//!
//! The "TTL" parameter on writes does not implement time-based expiry: a
//! non-`None` TTL only retires the version immediately preceding the new
//! write. See [`SecretCache::set`] for the exact (non-atomic) semantics.

pub mod backend;
pub mod cache;
pub mod codec;
pub mod error;
pub mod registry;

pub use backend::memory::MemoryBackend;
pub use backend::rest::{SecretManagerRest, StaticToken, TokenProvider};
pub use backend::{BackendError, SecretManagerBackend, VersionSelector};
pub use cache::SecretCache;
pub use error::CacheError;
pub use registry::Secrets;
