//! # GCP Secret Manager REST Client
//!
//! Native REST implementation of [`SecretManagerBackend`] using reqwest with
//! rustls. This avoids SSL/OpenSSL issues present in the official gRPC SDK
//! and works directly against HTTP mock servers in tests.
//!
//! API Reference: https://cloud.google.com/secret-manager/docs/reference/rest

mod auth;
mod requests;
mod responses;

pub use self::auth::{StaticToken, TokenProvider};

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use tracing::debug;

use crate::backend::{
    AccessedVersion, BackendError, SecretManagerBackend, SecretMetadata, VersionSelector,
};
use self::requests::{AddVersionRequest, CreateSecretRequest};
use self::responses::{AccessVersionResponse, ApiErrorResponse, ListSecretsResponse, SecretResource};

/// Default Secret Manager API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://secretmanager.googleapis.com";

/// Secret Manager REST client
///
/// Wraps a single `reqwest::Client`, so one instance (behind an `Arc`) is
/// intended to be shared process-wide across caches and callers.
pub struct SecretManagerRest {
    http_client: ReqwestClient,
    endpoint: String,
    token_provider: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for SecretManagerRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretManagerRest")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SecretManagerRest {
    /// Create a client against the public Secret Manager endpoint
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(token_provider: Arc<dyn TokenProvider>) -> Result<Self, BackendError> {
        Self::with_endpoint(token_provider, DEFAULT_ENDPOINT)
    }

    /// Create a client against a custom endpoint (e.g. an in-process mock)
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_endpoint(
        token_provider: Arc<dyn TokenProvider>,
        endpoint: impl Into<String>,
    ) -> Result<Self, BackendError> {
        let http_client = ReqwestClient::builder().build()?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Ok(Self {
            http_client,
            endpoint,
            token_provider,
        })
    }

    fn secret_url(&self, project_id: &str, secret_id: &str) -> String {
        format!(
            "{}/v1/projects/{project_id}/secrets/{secret_id}",
            self.endpoint
        )
    }

    async fn bearer(&self) -> Result<String, BackendError> {
        self.token_provider.token().await
    }

    /// Map a non-success API response into the backend error taxonomy
    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let resource = response.url().path().to_string();
        let message = match response.json::<ApiErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("request to {resource} failed"),
        };
        match status {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(message)),
            StatusCode::CONFLICT => Err(BackendError::AlreadyExists(message)),
            _ => Err(BackendError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

#[async_trait]
impl SecretManagerBackend for SecretManagerRest {
    async fn create_secret(&self, project_id: &str, secret_id: &str) -> Result<(), BackendError> {
        debug!("CREATE secret: project={}, secret={}", project_id, secret_id);
        let url = format!("{}/v1/projects/{project_id}/secrets", self.endpoint);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.bearer().await?)
            .json(&CreateSecretRequest::new(secret_id.to_string()))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn add_secret_version(
        &self,
        project_id: &str,
        secret_id: &str,
        data: &[u8],
    ) -> Result<(), BackendError> {
        debug!(
            "ADD VERSION: project={}, secret={}",
            project_id, secret_id
        );
        let url = format!("{}:addVersion", self.secret_url(project_id, secret_id));
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.bearer().await?)
            .json(&AddVersionRequest::new(BASE64.encode(data)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn access_secret_version(
        &self,
        project_id: &str,
        secret_id: &str,
        version: VersionSelector,
    ) -> Result<AccessedVersion, BackendError> {
        debug!(
            "ACCESS version: project={}, secret={}, version={}",
            project_id, secret_id, version
        );
        let url = format!(
            "{}/versions/{version}:access",
            self.secret_url(project_id, secret_id)
        );
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;
        let body: AccessVersionResponse = Self::check(response).await?.json().await?;
        let data = match body.payload.and_then(|payload| payload.data) {
            Some(encoded) => Some(BASE64.decode(encoded.as_bytes()).map_err(|e| {
                BackendError::MalformedResponse(format!("payload is not valid base64: {e}"))
            })?),
            None => None,
        };
        Ok(AccessedVersion {
            name: body.name,
            data,
        })
    }

    async fn destroy_secret_version(&self, version_name: &str) -> Result<(), BackendError> {
        debug!("DESTROY version: {}", version_name);
        let url = format!("{}/v1/{version_name}:destroy", self.endpoint);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_secret(&self, project_id: &str, secret_id: &str) -> Result<(), BackendError> {
        debug!("DELETE secret: project={}, secret={}", project_id, secret_id);
        let response = self
            .http_client
            .delete(self.secret_url(project_id, secret_id))
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_secrets(&self, project_id: &str) -> Result<Vec<String>, BackendError> {
        debug!("LIST secrets: project={}", project_id);
        let url = format!("{}/v1/projects/{project_id}/secrets", self.endpoint);
        let prefix = format!("projects/{project_id}/secrets/");
        let mut secret_ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .http_client
                .get(&url)
                .bearer_auth(self.bearer().await?);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let response = request.send().await?;
            let body: ListSecretsResponse = Self::check(response).await?.json().await?;
            for SecretResource { name } in body.secrets.unwrap_or_default() {
                // Responses carry full resource names; the trait deals in IDs
                let id = name.strip_prefix(&prefix).unwrap_or(&name).to_string();
                secret_ids.push(id);
            }
            match body.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(secret_ids)
    }

    async fn get_secret(
        &self,
        project_id: &str,
        secret_id: &str,
    ) -> Result<SecretMetadata, BackendError> {
        debug!(
            "GET secret metadata: project={}, secret={}",
            project_id, secret_id
        );
        let response = self
            .http_client
            .get(self.secret_url(project_id, secret_id))
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;
        let body: SecretResource = Self::check(response).await?.json().await?;
        Ok(SecretMetadata { name: body.name })
    }
}
