//! # REST Backend Tests
//!
//! Exercises the native REST client against a lightweight in-process Axum
//! mock of the Secret Manager REST API v1: create, addVersion, access,
//! destroy, delete, and paginated list, including the GCP error response
//! format (`{"error": {"code", "message", "status"}}`).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use lazy_secrets::{
    BackendError, SecretCache, SecretManagerBackend, SecretManagerRest, StaticToken,
    VersionSelector,
};

const PROJECT: &str = "rest-tests";
const PAGE_SIZE: usize = 2;

#[derive(Clone)]
struct MockVersion {
    data: String,
    destroyed: bool,
}

/// Mock server state: secret ID -> version chain (base64 payloads)
#[derive(Clone, Default)]
struct MockState {
    secrets: Arc<RwLock<BTreeMap<String, Vec<MockVersion>>>>,
}

/// GCP error response format
/// Reference: https://cloud.google.com/apis/design/errors
fn error_response(status: StatusCode, message: String, status_str: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "code": status.as_u16(),
                "message": message,
                "status": status_str
            }
        })),
    )
        .into_response()
}

/// POST /v1/projects/{project}/secrets
async fn create_secret(
    State(state): State<MockState>,
    Path(project): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Some(secret_id) = body.get("secretId").and_then(Value::as_str) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing secretId".to_string(),
            "INVALID_ARGUMENT",
        );
    };
    let mut secrets = state.secrets.write().await;
    if secrets.contains_key(secret_id) {
        return error_response(
            StatusCode::CONFLICT,
            format!("Secret already exists: projects/{project}/secrets/{secret_id}"),
            "ALREADY_EXISTS",
        );
    }
    secrets.insert(secret_id.to_string(), Vec::new());
    Json(json!({
        "name": format!("projects/{project}/secrets/{secret_id}"),
        "replication": { "automatic": {} }
    }))
    .into_response()
}

/// GET /v1/projects/{project}/secrets (paginated)
async fn list_secrets(
    State(state): State<MockState>,
    Path(project): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let offset: usize = params
        .get("pageToken")
        .and_then(|token| token.parse().ok())
        .unwrap_or(0);
    let secrets = state.secrets.read().await;
    let names: Vec<Value> = secrets
        .keys()
        .skip(offset)
        .take(PAGE_SIZE)
        .map(|id| json!({ "name": format!("projects/{project}/secrets/{id}") }))
        .collect();
    let mut body = json!({ "secrets": names });
    if offset + PAGE_SIZE < secrets.len() {
        body["nextPageToken"] = json!((offset + PAGE_SIZE).to_string());
    }
    Json(body).into_response()
}

/// GET /v1/projects/{project}/secrets/{secret}
async fn get_secret_metadata(
    State(state): State<MockState>,
    Path((project, secret)): Path<(String, String)>,
) -> Response {
    if state.secrets.read().await.contains_key(&secret) {
        Json(json!({ "name": format!("projects/{project}/secrets/{secret}") })).into_response()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Secret not found: projects/{project}/secrets/{secret}"),
            "NOT_FOUND",
        )
    }
}

/// DELETE /v1/projects/{project}/secrets/{secret}
async fn delete_secret(
    State(state): State<MockState>,
    Path((project, secret)): Path<(String, String)>,
) -> Response {
    if state.secrets.write().await.remove(&secret).is_some() {
        Json(json!({})).into_response()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Secret not found: projects/{project}/secrets/{secret}"),
            "NOT_FOUND",
        )
    }
}

/// Handler for routes with colons in the path; Axum cannot route them
/// directly, so they land in the fallback:
/// - POST /v1/projects/{project}/secrets/{secret}:addVersion
/// - GET /v1/projects/{project}/secrets/{secret}/versions/{version}:access
/// - POST /v1/projects/{project}/secrets/{secret}/versions/{version}:destroy
async fn handle_colon_routes(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    body: Option<Json<Value>>,
) -> Response {
    let path = uri.path().to_string();
    let parts: Vec<&str> = path.split('/').collect();
    let project = parts.get(3).unwrap_or(&"unknown").to_string();

    if method == Method::POST && path.contains(":addVersion") {
        let secret_part = parts.get(5).unwrap_or(&"unknown");
        let secret = secret_part.split(':').next().unwrap_or("unknown").to_string();
        let data = body
            .as_ref()
            .and_then(|Json(b)| b.pointer("/payload/data"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut secrets = state.secrets.write().await;
        let Some(versions) = secrets.get_mut(&secret) else {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("Secret not found: projects/{project}/secrets/{secret}"),
                "NOT_FOUND",
            );
        };
        versions.push(MockVersion {
            data: data.clone(),
            destroyed: false,
        });
        let ordinal = versions.len();
        return Json(json!({
            "name": format!("projects/{project}/secrets/{secret}/versions/{ordinal}"),
            "payload": { "data": data }
        }))
        .into_response();
    }

    if method == Method::GET && path.contains(":access") {
        let secret = parts.get(5).unwrap_or(&"unknown").to_string();
        let selector = parts
            .get(7)
            .unwrap_or(&"unknown")
            .split(':')
            .next()
            .unwrap_or("unknown")
            .to_string();

        let secrets = state.secrets.read().await;
        let resolved = secrets.get(&secret).and_then(|versions| {
            if selector == "latest" {
                versions
                    .iter()
                    .enumerate()
                    .rev()
                    .find(|(_, v)| !v.destroyed)
            } else {
                let index = selector.parse::<usize>().ok()?.checked_sub(1)?;
                versions.get(index).filter(|v| !v.destroyed).map(|v| (index, v))
            }
        });
        return match resolved {
            Some((index, version)) => Json(json!({
                "name": format!(
                    "projects/{project}/secrets/{secret}/versions/{}",
                    index + 1
                ),
                "payload": { "data": version.data }
            }))
            .into_response(),
            None => error_response(
                StatusCode::NOT_FOUND,
                format!("Version not found: projects/{project}/secrets/{secret}/versions/{selector}"),
                "NOT_FOUND",
            ),
        };
    }

    if method == Method::POST && path.contains(":destroy") {
        let secret = parts.get(5).unwrap_or(&"unknown").to_string();
        let ordinal = parts
            .get(7)
            .unwrap_or(&"unknown")
            .split(':')
            .next()
            .and_then(|n| n.parse::<usize>().ok());

        let mut secrets = state.secrets.write().await;
        let version = ordinal.and_then(|n| n.checked_sub(1)).and_then(|index| {
            secrets
                .get_mut(&secret)
                .and_then(|versions| versions.get_mut(index))
        });
        return match version {
            Some(version) => {
                version.destroyed = true;
                version.data.clear();
                Json(json!({
                    "name": format!("projects/{project}/secrets/{secret}/versions/{}", ordinal.unwrap_or(0))
                }))
                .into_response()
            }
            None => error_response(
                StatusCode::NOT_FOUND,
                format!("Version not found under projects/{project}/secrets/{secret}"),
                "NOT_FOUND",
            ),
        };
    }

    error_response(
        StatusCode::NOT_FOUND,
        format!("Route not found: {method} {path}"),
        "NOT_FOUND",
    )
}

/// Start the mock on an ephemeral port; returns its state and base URL
async fn spawn_mock() -> (MockState, String) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let state = MockState::default();
    let app = Router::new()
        .route(
            "/v1/projects/{project}/secrets",
            post(create_secret).get(list_secrets),
        )
        .route(
            "/v1/projects/{project}/secrets/{secret}",
            // POST on this shape is `{secret}:addVersion`; the `{secret}`
            // param captures the colon suffix, so route it to the colon
            // handler rather than letting axum answer 405.
            get(get_secret_metadata)
                .delete(delete_secret)
                .post(handle_colon_routes),
        )
        .fallback(handle_colon_routes)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (state, format!("http://{addr}"))
}

fn rest_client(endpoint: &str) -> Arc<SecretManagerRest> {
    Arc::new(
        SecretManagerRest::with_endpoint(Arc::new(StaticToken::new("test-token")), endpoint)
            .unwrap(),
    )
}

#[tokio::test]
async fn test_rest_round_trip() {
    let (_, endpoint) = spawn_mock().await;
    let cache = SecretCache::new(rest_client(&endpoint), Some(PROJECT)).unwrap();

    // First set exercises the append-fails -> create fallback
    assert!(cache.set("api-token", "s3cr3t", None).await.unwrap());
    assert_eq!(
        cache.get("api-token", Value::Null).await.unwrap(),
        json!("s3cr3t")
    );
    assert!(cache.has("api-token").await.unwrap());

    assert!(cache.delete("api-token").await.unwrap());
    assert!(!cache.has("api-token").await.unwrap());
}

#[tokio::test]
async fn test_rest_structured_payload_base64_round_trip() {
    let (state, endpoint) = spawn_mock().await;
    let cache = SecretCache::new(rest_client(&endpoint), Some(PROJECT)).unwrap();

    let value = json!({"user": "svc", "password": "p@ss"});
    assert!(cache.set("creds", &value, None).await.unwrap());
    assert_eq!(cache.get("creds", Value::Null).await.unwrap(), value);

    // The wire payload must be base64, not raw JSON
    let secrets = state.secrets.read().await;
    let stored = &secrets.get("creds").unwrap()[0].data;
    assert!(!stored.contains('{'), "payload should be base64-encoded");
}

#[tokio::test]
async fn test_rest_ttl_retires_prior_version() {
    let ttl = Some(Duration::from_secs(60));
    let (_, endpoint) = spawn_mock().await;
    let backend = rest_client(&endpoint);
    let cache = SecretCache::new(Arc::clone(&backend) as Arc<dyn SecretManagerBackend>, Some(PROJECT)).unwrap();

    assert!(cache.set("rotating", "v1", ttl).await.unwrap());
    assert!(cache.set("rotating", "v2", ttl).await.unwrap());

    // Version 1 is destroyed and no longer accessible
    let destroyed = backend
        .access_secret_version(PROJECT, "rotating", VersionSelector::Ordinal(1))
        .await;
    assert!(matches!(destroyed, Err(BackendError::NotFound(_))));

    let latest = backend
        .access_secret_version(PROJECT, "rotating", VersionSelector::Latest)
        .await
        .unwrap();
    assert_eq!(latest.name, format!("projects/{PROJECT}/secrets/rotating/versions/2"));
    assert_eq!(latest.data.unwrap(), b"v2");
}

#[tokio::test]
async fn test_rest_create_conflict_reports_failure() {
    let (_, endpoint) = spawn_mock().await;
    let cache = SecretCache::new(rest_client(&endpoint), Some(PROJECT)).unwrap();

    assert!(cache.create::<Value>("dup", None).await.unwrap());
    assert!(!cache.create::<Value>("dup", None).await.unwrap());
}

#[tokio::test]
async fn test_rest_get_missing_secret_returns_default() {
    let (_, endpoint) = spawn_mock().await;
    let cache = SecretCache::new(rest_client(&endpoint), Some(PROJECT)).unwrap();

    assert_eq!(
        cache.get("absent", json!("fallback")).await.unwrap(),
        json!("fallback")
    );
}

#[tokio::test]
async fn test_rest_clear_follows_pagination() {
    let (state, endpoint) = spawn_mock().await;
    let cache = SecretCache::new(rest_client(&endpoint), Some(PROJECT)).unwrap();

    // Five secrets across three mock pages
    for key in ["a", "b", "c", "d", "e"] {
        assert!(cache.set(key, "v", None).await.unwrap());
    }
    assert!(cache.clear().await);
    assert!(state.secrets.read().await.is_empty());
}
