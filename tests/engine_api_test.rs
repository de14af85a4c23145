// End-to-end tests for the /v1 engine routes against a mock Packet API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use mockito::{Matcher, Server};
use packet_secrets::api::{create_app, AdminAppState, EngineAppState};
use packet_secrets::backend::Backend;
use packet_secrets::config::{new_lease_config, LeaseConfig};
use packet_secrets::remote::PacketClientFactory;
use packet_secrets::storage::InmemStorage;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const PROJECT_ID: &str = "3f2b8c1e-9d4a-4b7e-8c21-5a6f0e9d1b34";

fn create_test_app(base_url: &str, root_token: Option<&str>) -> Router {
    let lease_config = new_lease_config(LeaseConfig {
        default_ttl_seconds: 600,
        max_ttl_seconds: 1200,
    });
    let backend = Arc::new(Backend::new(
        Arc::new(InmemStorage::new()),
        Arc::new(PacketClientFactory::new(base_url, "packet-secrets-test")),
        lease_config.clone(),
    ));
    create_app(
        EngineAppState::new(backend, root_token.map(|t| t.to_string())),
        AdminAppState {
            lease_config,
            root_token: root_token.map(|t| t.to_string()),
        },
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn configure(app: &Router) {
    let (status, _) = send(app, "PUT", "/v1/config", Some(json!({"api_token": "acct-token-1234"}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_config_write_and_masked_read() {
    let app = create_test_app("http://127.0.0.1:1", None);

    let (status, body) = send(&app, "GET", "/v1/config", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({}));

    configure(&app).await;

    let (status, body) = send(&app, "GET", "/v1/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_token"], "***********1234");
}

#[tokio::test]
async fn test_config_without_token_rejected() {
    let app = create_test_app("http://127.0.0.1:1", None);

    let (status, body) = send(&app, "POST", "/v1/config", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "api_token is required");
}

#[tokio::test]
async fn test_role_lifecycle() {
    let app = create_test_app("http://127.0.0.1:1", None);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/role/Deploy",
        Some(json!({"type": "project", "project_id": PROJECT_ID, "ttl": "1h", "max_ttl": 7200})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", "/v1/role/deploy", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "project");
    assert_eq!(body["project_id"], PROJECT_ID);
    assert_eq!(body["read_only"], true);
    assert_eq!(body["ttl"], 3600);
    assert_eq!(body["max_ttl"], 7200);

    let (status, _) = send(&app, "PUT", "/v1/role/deploy", Some(json!({"read_only": false}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&app, "GET", "/v1/role/deploy", None).await;
    assert_eq!(body["read_only"], false);
    assert_eq!(body["ttl"], 3600);

    let (status, body) = send(&app, "GET", "/v1/role", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"keys": ["deploy"]}));

    let (status, _) = send(&app, "DELETE", "/v1/role/deploy", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", "/v1/role/deploy", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({}));

    let (_, body) = send(&app, "GET", "/v1/role/", None).await;
    assert_eq!(body, json!({"keys": []}));
}

#[tokio::test]
async fn test_role_validation_errors() {
    let app = create_test_app("http://127.0.0.1:1", None);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/role/ops",
        Some(json!({"type": "user", "project_id": PROJECT_ID})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "for user API key role, project_id must be left empty"
    );

    let (status, body) = send(&app, "PUT", "/v1/role/ghost", Some(json!({"type": "user"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no role found to update for ghost");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/role/ops",
        Some(json!({"type": "user", "ttl": 100, "max_ttl": 50})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ttl exceeds max_ttl");

    let (status, _) = send(&app, "GET", "/v1/role/ops", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_creds_unknown_role_is_not_found() {
    let app = create_test_app("http://127.0.0.1:1", None);
    configure(&app).await;

    let (status, body) = send(&app, "GET", "/v1/creds/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_creds_before_config() {
    let app = create_test_app("http://127.0.0.1:1", None);
    send(&app, "POST", "/v1/role/ops", Some(json!({"type": "user"}))).await;

    let (status, body) = send(&app, "GET", "/v1/creds/ops", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "setup the config first");
}

#[tokio::test]
async fn test_role_name_with_edge_underscore() {
    let app = create_test_app("http://127.0.0.1:1", None);

    let (status, _) = send(&app, "POST", "/v1/role/deploy_", Some(json!({"type": "user"}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", "/v1/role/deploy_", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "user");
}

async fn mock_create(server: &mut Server, key_id: &str, token: &str) -> mockito::Mock {
    server
        .mock("POST", format!("/projects/{}/api-keys", PROJECT_ID).as_str())
        .match_header("x-auth-token", "acct-token-1234")
        .match_body(Matcher::Json(json!({
            "description": "packet-secrets-deploy",
            "read_only": true
        })))
        .with_status(201)
        .with_body(format!(r#"{{"id": "{}", "token": "{}"}}"#, key_id, token))
        .create_async()
        .await
}

async fn deploy_role(app: &Router) {
    let (status, _) = send(
        app,
        "POST",
        "/v1/role/deploy",
        Some(json!({"type": "project", "project_id": PROJECT_ID, "ttl": 60, "max_ttl": 120})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_issue_renew_revoke() {
    let mut server = Server::new_async().await;
    let create = mock_create(&mut server, "key-77", "minted-token").await;
    let delete = server
        .mock("DELETE", "/api-keys/key-77")
        .match_header("x-auth-token", "acct-token-1234")
        .with_status(204)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), None);
    configure(&app).await;
    deploy_role(&app).await;

    let (status, lease) = send(&app, "GET", "/v1/creds/deploy", None).await;
    assert_eq!(status, StatusCode::OK);
    create.assert_async().await;
    assert_eq!(lease["data"]["api_key_token"], "minted-token");
    assert_eq!(lease["ttl"], 60);
    assert_eq!(lease["max_ttl"], 120);
    assert_eq!(lease["renewable"], true);
    let lease_id = lease["lease_id"].as_str().unwrap().to_string();
    assert!(lease_id.starts_with("creds/deploy/"));

    let (status, renewed) = send(
        &app,
        "PUT",
        "/v1/sys/leases/renew",
        Some(json!({"lease_id": lease_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renewed["ttl"], 600);
    assert_eq!(renewed["max_ttl"], 1200);
    assert_eq!(renewed["data"], lease["data"]);

    let (status, _) = send(
        &app,
        "PUT",
        "/v1/sys/leases/revoke",
        Some(json!({"lease_id": lease_id})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    delete.assert_async().await;

    // Revoked leases are gone for good.
    let (status, body) = send(
        &app,
        "PUT",
        "/v1/sys/leases/renew",
        Some(json!({"lease_id": lease_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], format!("lease not found: {}", lease_id));
}

#[tokio::test]
async fn test_creds_response_hides_internal_data() {
    let mut server = Server::new_async().await;
    mock_create(&mut server, "key-77", "minted-token").await;

    let app = create_test_app(&server.url(), None);
    configure(&app).await;
    deploy_role(&app).await;

    let (status, lease) = send(&app, "GET", "/v1/creds/deploy", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(lease.get("internal_data").is_none());
    assert!(!lease.to_string().contains("key-77"));
}

#[tokio::test]
async fn test_revoke_ignores_caller_supplied_key_id() {
    let mut server = Server::new_async().await;
    mock_create(&mut server, "key-77", "minted-token").await;
    let foreign = server
        .mock("DELETE", "/api-keys/operator-root-key")
        .expect(0)
        .create_async()
        .await;
    let own = server
        .mock("DELETE", "/api-keys/key-77")
        .with_status(204)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), None);
    configure(&app).await;
    deploy_role(&app).await;
    let (_, lease) = send(&app, "GET", "/v1/creds/deploy", None).await;

    let (status, _) = send(
        &app,
        "PUT",
        "/v1/sys/leases/revoke",
        Some(json!({
            "lease_id": lease["lease_id"],
            "internal_data": {"api_key_id": "operator-root-key"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    own.assert_async().await;
    foreign.assert_async().await;
}

#[tokio::test]
async fn test_revoke_unknown_lease_is_rejected() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), None);
    configure(&app).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/v1/sys/leases/revoke",
        Some(json!({"lease_id": "creds/deploy/forged"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "lease not found: creds/deploy/forged");
    delete.assert_async().await;
}

#[tokio::test]
async fn test_failed_revoke_keeps_lease_for_retry() {
    let mut server = Server::new_async().await;
    mock_create(&mut server, "key-77", "minted-token").await;
    let failing = server
        .mock("DELETE", "/api-keys/key-77")
        .with_status(500)
        .with_body(r#"{"errors": ["upstream unavailable"]}"#)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), None);
    configure(&app).await;
    deploy_role(&app).await;
    let (_, lease) = send(&app, "GET", "/v1/creds/deploy", None).await;
    let request = json!({"lease_id": lease["lease_id"]});

    let (status, body) = send(&app, "PUT", "/v1/sys/leases/revoke", Some(request.clone())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("upstream unavailable"));
    failing.assert_async().await;
    failing.remove_async().await;

    let ok = server
        .mock("DELETE", "/api-keys/key-77")
        .with_status(204)
        .create_async()
        .await;
    let (status, _) = send(&app, "PUT", "/v1/sys/leases/revoke", Some(request)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    ok.assert_async().await;
}

#[tokio::test]
async fn test_remote_error_is_bad_gateway() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/user/api-keys")
        .with_status(401)
        .with_body(r#"{"errors": ["Invalid authentication token"]}"#)
        .create_async()
        .await;

    let app = create_test_app(&server.url(), None);
    configure(&app).await;
    send(&app, "POST", "/v1/role/ops", Some(json!({"type": "user"}))).await;

    let (status, body) = send(&app, "GET", "/v1/creds/ops", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Invalid authentication token"));
}

#[tokio::test]
async fn test_root_token_required() {
    let app = create_test_app("http://127.0.0.1:1", Some("root-secret"));

    let (status, body) = send(&app, "GET", "/v1/role", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing root token");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/role")
                .header("Authorization", "Bearer root-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/role")
                .header("Authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
