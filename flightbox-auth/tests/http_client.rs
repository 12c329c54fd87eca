//! Tests for the HTTP refresh client using wiremock.

mod common;

use std::sync::Arc;

use flightbox_auth::{AuthError, CredentialManager, HttpRefreshClient, RefreshClient, RefreshError};
use pretty_assertions::assert_eq;
use wiremock::matchers::{basic_auth, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{config, grant};

const TOKEN_PATH: &str = "/authentication/v2/token";

async fn token_endpoint(response: ResponseTemplate) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(basic_auth("client-id", "client-secret"))
        .and(header("accept", "application/json"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=r1"))
        .respond_with(response)
        .expect(1)
        .mount(&mock_server)
        .await;
    mock_server
}

fn client_for(mock_server: &MockServer) -> HttpRefreshClient {
    HttpRefreshClient::new(format!("{}{TOKEN_PATH}", mock_server.uri()))
}

#[tokio::test]
async fn test_refresh_grant_is_decoded() {
    let mock_server = token_endpoint(ResponseTemplate::new(200).set_body_json(
        serde_json::json!({
            "access_token": "new-access",
            "refresh_token": "r2",
            "token_type": "Bearer",
            "expires_in": 3599
        }),
    ))
    .await;

    let grant_received = client_for(&mock_server)
        .refresh(&config().client_credentials(), "r1")
        .await
        .unwrap();

    assert_eq!(grant_received, grant("new-access", Some("r2"), 3599));
}

#[tokio::test]
async fn test_missing_refresh_token_in_response_is_none() {
    let mock_server = token_endpoint(ResponseTemplate::new(200).set_body_json(
        serde_json::json!({ "access_token": "new-access", "expires_in": 3599 }),
    ))
    .await;

    let grant_received = client_for(&mock_server)
        .refresh(&config().client_credentials(), "r1")
        .await
        .unwrap();

    assert_eq!(grant_received.refresh_token, None);
}

#[tokio::test]
async fn test_rejected_refresh_keeps_status_and_body() {
    let mock_server = token_endpoint(
        ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#),
    )
    .await;

    let err = client_for(&mock_server)
        .refresh(&config().client_credentials(), "r1")
        .await
        .unwrap_err();

    match err {
        RefreshError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_response_is_a_decode_error() {
    let mock_server =
        token_endpoint(ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let err = client_for(&mock_server)
        .refresh(&config().client_credentials(), "r1")
        .await
        .unwrap_err();

    assert!(matches!(err, RefreshError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_an_http_error() {
    let client = HttpRefreshClient::new("http://127.0.0.1:1/token");

    let err = client
        .refresh(&config().client_credentials(), "r1")
        .await
        .unwrap_err();

    assert!(matches!(err, RefreshError::Http(_)));
}

#[tokio::test]
async fn test_manager_refreshes_through_endpoint() {
    let mock_server = token_endpoint(ResponseTemplate::new(200).set_body_json(
        serde_json::json!({ "access_token": "new-access", "expires_in": 3599 }),
    ))
    .await;
    let manager = CredentialManager::new(config(), Arc::new(client_for(&mock_server)));
    manager.install(grant("old-access", Some("r1"), 3600)).unwrap();

    assert_eq!(manager.force_refresh().await.unwrap(), "new-access");
    assert_eq!(manager.current_token().await.as_deref(), Some("new-access"));
    assert_eq!(manager.credential().unwrap().refresh_token(), "r1");
}

#[tokio::test]
async fn test_manager_reports_rejected_refresh() {
    let mock_server = token_endpoint(ResponseTemplate::new(401)).await;
    let manager = CredentialManager::new(config(), Arc::new(client_for(&mock_server)));
    manager.install(grant("old-access", Some("r1"), 3600)).unwrap();

    let err = manager.force_refresh().await.unwrap_err();

    assert!(matches!(
        err,
        AuthError::Refresh(RefreshError::Rejected { status: 401, .. })
    ));
    assert_eq!(manager.current_token().await.as_deref(), Some("old-access"));
}
