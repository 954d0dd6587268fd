//! # Token Provider
//!
//! Bearer-token acquisition for the REST client.
//!
//! Credential management (ADC, workload identity, metadata server) is an
//! external concern: the client only needs a fresh OAuth2 access token per
//! request, so it takes any [`TokenProvider`]. Production callers typically
//! wrap their credential library of choice; tests and short-lived tools use
//! [`StaticToken`].

use async_trait::async_trait;

use crate::backend::BackendError;

/// Supplies OAuth2 bearer tokens for Secret Manager API calls
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid access token.
    async fn token(&self) -> Result<String, BackendError>;
}

/// A fixed, pre-fetched token
///
/// Suitable for tests, mock servers, and callers that refresh tokens
/// out-of-band and rebuild the client.
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Wrap an already-acquired access token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, BackendError> {
        Ok(self.token.clone())
    }
}
