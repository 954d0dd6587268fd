//! # Response Types
//!
//! GCP Secret Manager REST API response structures.
//!
//! Only the fields the client consumes are deserialized; everything else in
//! the API responses (timestamps, etag, replication echo) is ignored.

use serde::Deserialize;

/// Response from `versions/{version}:access`
#[derive(Debug, Deserialize)]
pub struct AccessVersionResponse {
    /// Full resource name:
    /// `projects/{project}/secrets/{secret}/versions/{version}`
    pub name: String,
    /// Payload; absent on versions without data
    pub payload: Option<AccessPayload>,
}

/// Payload carried by an access response; `data` is base64-encoded
#[derive(Debug, Deserialize)]
pub struct AccessPayload {
    pub data: Option<String>,
}

/// A secret resource, as returned by create/get/list
#[derive(Debug, Deserialize)]
pub struct SecretResource {
    /// Full resource name: `projects/{project}/secrets/{secret}`
    pub name: String,
}

/// Response from `GET /v1/projects/{project}/secrets`
#[derive(Debug, Deserialize)]
pub struct ListSecretsResponse {
    /// Absent (not empty) when the project has no secrets
    pub secrets: Option<Vec<SecretResource>>,
    /// Present when more pages remain
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// GCP error response format
///
/// Format: `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
/// Reference: https://cloud.google.com/apis/design/errors
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Inner error object of [`ApiErrorResponse`]
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
}
