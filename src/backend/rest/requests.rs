//! # Request Types
//!
//! GCP Secret Manager REST API request structures.
//!
//! These structs represent the JSON payloads sent to the Secret Manager
//! REST API v1, matching the schema documented at:
//! https://cloud.google.com/secret-manager/docs/reference/rest

use serde::Serialize;

/// Request body for creating a new secret
///
/// Used in `POST /v1/projects/{project}/secrets`. This creates the secret
/// resource only, not a value; values are appended with
/// [`AddVersionRequest`].
#[derive(Debug, Serialize)]
pub struct CreateSecretRequest {
    /// The ID of the secret (not the full resource name)
    ///
    /// Note: the GCP API expects camelCase "secretId" in JSON
    #[serde(rename = "secretId")]
    pub secret_id: String,
    /// Replication configuration for the secret
    pub replication: Replication,
}

impl CreateSecretRequest {
    /// Create a new request with automatic replication
    pub fn new(secret_id: String) -> Self {
        Self {
            secret_id,
            replication: Replication {
                automatic: Some(AutomaticReplication {}),
            },
        }
    }
}

/// Replication policy for a secret
#[derive(Debug, Serialize)]
pub struct Replication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic: Option<AutomaticReplication>,
}

/// Automatic (Google-managed) replication; an empty JSON object on the wire
#[derive(Debug, Serialize)]
pub struct AutomaticReplication {}

/// Request body for adding a new version to an existing secret
///
/// Used in `POST /v1/projects/{project}/secrets/{secret}:addVersion`.
///
/// **Important**: the payload data must be base64-encoded before sending.
#[derive(Debug, Serialize)]
pub struct AddVersionRequest {
    /// The secret payload containing the base64-encoded secret value
    pub payload: SecretPayload,
}

impl AddVersionRequest {
    /// Create a new request with base64-encoded data
    pub fn new(data: String) -> Self {
        Self {
            payload: SecretPayload { data },
        }
    }
}

/// Secret payload wrapper; `data` is base64-encoded
#[derive(Debug, Serialize)]
pub struct SecretPayload {
    pub data: String,
}
