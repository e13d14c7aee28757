use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_api_client::{FileSessionStore, MemorySessionStore, PortalClient, SessionContext, SessionStore};
use shared_models::error::PortalError;
use shared_utils::test_utils::{MockPortalResponses, TestConfig, TestUser};

async fn logged_in_client(mock_server: &MockServer, user: &TestUser) -> (PortalClient, Arc<SessionContext>) {
    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let store = Arc::new(MemorySessionStore::with_session(user.to_session()));
    let session = Arc::new(SessionContext::load(store).await.unwrap());
    let client = PortalClient::new(&config, session.clone()).unwrap();
    (client, session)
}

#[tokio::test]
async fn test_bearer_token_and_query_are_sent() {
    let mock_server = MockServer::start().await;
    let user = TestUser::provider("doc@example.com");
    let (client, session) = logged_in_client(&mock_server, &user).await;
    let token = session.access_token().await.unwrap();

    Mock::given(method("GET"))
        .and(path("/availability"))
        .and(query_param("start_date", "2024-01-14"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"ok": true}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let envelope = client
        .get::<Value>("/availability", &[("start_date".to_string(), "2024-01-14".to_string())])
        .await
        .unwrap();

    assert_eq!(envelope.data.unwrap()["ok"], true);
}

#[tokio::test]
async fn test_success_false_is_rejected_with_message() {
    let mock_server = MockServer::start().await;
    let user = TestUser::provider("doc@example.com");
    let (client, _) = logged_in_client(&mock_server, &user).await;

    Mock::given(method("POST"))
        .and(path("/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::error_response("Slot full")))
        .mount(&mock_server)
        .await;

    let result = client.post::<Value>("/availability", json!({})).await;

    assert_matches!(result, Err(PortalError::Rejected(msg)) if msg == "Slot full");
}

#[tokio::test]
async fn test_error_status_with_envelope_keeps_message() {
    let mock_server = MockServer::start().await;
    let user = TestUser::provider("doc@example.com");
    let (client, _) = logged_in_client(&mock_server, &user).await;

    Mock::given(method("PUT"))
        .and(path("/availability/abc"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockPortalResponses::error_response("Overlaps an existing slot")))
        .mount(&mock_server)
        .await;

    let result = client.put::<Value>("/availability/abc", json!({})).await;

    assert_matches!(result, Err(PortalError::Rejected(msg)) if msg == "Overlaps an existing slot");
}

#[tokio::test]
async fn test_server_error_without_envelope_is_transport_failure() {
    let mock_server = MockServer::start().await;
    let user = TestUser::provider("doc@example.com");
    let (client, _) = logged_in_client(&mock_server, &user).await;

    Mock::given(method("DELETE"))
        .and(path("/availability/abc"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
        .mount(&mock_server)
        .await;

    let result = client.delete::<Value>("/availability/abc").await;

    assert_matches!(result, Err(PortalError::Transport(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_failure() {
    let config = TestConfig::with_base_url("http://127.0.0.1:9").to_app_config();
    let client = PortalClient::new(&config, Arc::new(SessionContext::in_memory())).unwrap();

    let result = client.get::<Value>("/availability", &[]).await;

    assert_matches!(result, Err(PortalError::Transport(_)));
}

#[tokio::test]
async fn test_unauthorized_triggers_single_refresh_and_retry() {
    let mock_server = MockServer::start().await;
    let user = TestUser::provider("doc@example.com");
    let (client, session) = logged_in_client(&mock_server, &user).await;
    let old_token = session.access_token().await.unwrap();
    let refresh_token = session.refresh_token().await.unwrap();

    Mock::given(method("GET"))
        .and(path("/availability"))
        .and(header("Authorization", format!("Bearer {}", old_token).as_str()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refresh_token": refresh_token})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"access_token": "fresh-token", "refresh_token": "fresh-refresh"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/availability"))
        .and(header("Authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let envelope = client.get::<Vec<Value>>("/availability", &[]).await.unwrap();

    assert!(envelope.data.unwrap().is_empty());
    assert_eq!(session.access_token().await.as_deref(), Some("fresh-token"));
    assert_eq!(session.refresh_token().await.as_deref(), Some("fresh-refresh"));
}

#[tokio::test]
async fn test_second_unauthorized_clears_session() {
    let mock_server = MockServer::start().await;
    let user = TestUser::provider("doc@example.com");
    let (client, session) = logged_in_client(&mock_server, &user).await;

    Mock::given(method("GET"))
        .and(path("/availability"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"access_token": "fresh-token"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client.get::<Value>("/availability", &[]).await;

    assert_eq!(result.unwrap_err(), PortalError::SessionExpired);
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn test_failed_refresh_clears_session() {
    let mock_server = MockServer::start().await;
    let user = TestUser::patient("pat@example.com");
    let (client, session) = logged_in_client(&mock_server, &user).await;

    Mock::given(method("GET"))
        .and(path("/availability/search"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(MockPortalResponses::error_response("Refresh token revoked")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client.get::<Value>("/availability/search", &[]).await;

    assert_eq!(result.unwrap_err(), PortalError::SessionExpired);
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn test_file_store_persists_session_across_contexts() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    let user = TestUser::provider("doc@example.com");

    let first = SessionContext::load(Arc::new(FileSessionStore::new(&file))).await.unwrap();
    first.set(user.to_session()).await.unwrap();
    assert!(file.exists());

    let second = SessionContext::load(Arc::new(FileSessionStore::new(&file))).await.unwrap();
    assert_eq!(second.current_user().await.unwrap().id, user.id);

    second.clear().await.unwrap();
    assert!(!file.exists());
    assert_eq!(FileSessionStore::new(&file).load().await.unwrap(), None);
}

#[tokio::test]
async fn test_file_store_ignores_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    std::fs::write(&file, "{not json").unwrap();

    let store = FileSessionStore::new(&file);

    assert_eq!(store.load().await.unwrap(), None);
}

#[cfg(unix)]
#[tokio::test]
async fn test_file_store_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    std::fs::write(&file, "{}").unwrap();
    std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();

    let store = FileSessionStore::new(&file);
    store.save(&TestUser::patient("pat@example.com").to_session()).await.unwrap();

    let mode = std::fs::metadata(&file).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
    assert!(store.load().await.unwrap().is_some());
}
