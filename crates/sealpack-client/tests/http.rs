use std::time::Duration;

use sealpack_client::{AbilityApi, AbilityConfig, ClientError, HttpAbilityApi};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(server: &MockServer) -> AbilityConfig {
    AbilityConfig {
        api_key: "key-1".into(),
        api_secret: "secret-1".into(),
        integration_id: "integration-1".into(),
        base_url: server.uri(),
        request_timeout_secs: 1,
        ..AbilityConfig::default()
    }
}

async fn setup(server: &MockServer) -> HttpAbilityApi {
    init_tracing();
    HttpAbilityApi::new(config(server)).unwrap()
}

// --- Device keys ---

#[tokio::test]
async fn device_keys_sends_credentials_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/api/integration/device-keys"))
        .and(query_param("userId", "user-7"))
        .and(query_param("integrationId", "integration-1"))
        .and(query_param("apiKey", "key-1"))
        .and(query_param("apiSecret", "secret-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["pem-a", "pem-b"])))
        .expect(1)
        .mount(&server)
        .await;

    let api = setup(&server).await;
    let keys = api.device_keys("user-7").await.unwrap();
    assert_eq!(keys, vec!["pem-a", "pem-b"]);
}

#[tokio::test]
async fn device_keys_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/api/integration/device-keys"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = setup(&server).await;
    let err = api.device_keys("user-7").await.unwrap_err();
    assert!(matches!(err, ClientError::DeviceKeys(_)));
}

#[tokio::test]
async fn device_keys_rejects_non_array_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/api/integration/device-keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"keys": []})))
        .mount(&server)
        .await;

    let api = setup(&server).await;
    let err = api.device_keys("user-7").await.unwrap_err();
    assert!(matches!(err, ClientError::DeviceKeys(_)));
}

#[tokio::test]
async fn device_keys_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/api/integration/device-keys"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let api = setup(&server).await;
    let err = api.device_keys("user-7").await.unwrap_err();
    assert!(matches!(err, ClientError::DeviceKeys(_)));
}

// --- Publishing ---

#[tokio::test]
async fn publish_posts_packet() {
    let server = MockServer::start().await;
    let packet = json!({"title": "hello"});
    Mock::given(method("POST"))
        .and(path("/v1/api/integration/publish-to-user"))
        .and(body_json(json!({
            "apiKey": "key-1",
            "apiSecret": "secret-1",
            "integrationId": "integration-1",
            "targetUserId": "user-7",
            "packet": {"title": "hello"},
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = setup(&server).await;
    api.publish_to_user("user-7", &packet).await.unwrap();
}

#[tokio::test]
async fn encrypted_publish_uses_secure_endpoint() {
    let server = MockServer::start().await;
    let envelope = json!({"version": "2.0.0", "plain": {}, "encrypted": {}});
    Mock::given(method("POST"))
        .and(path("/v1/api/integration/secure/publish-to-user"))
        .and(body_json(json!({
            "apiKey": "key-1",
            "apiSecret": "secret-1",
            "integrationId": "integration-1",
            "targetUserId": "user-7",
            "packet": envelope.clone(),
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = setup(&server).await;
    api.encrypted_publish_to_user("user-7", &envelope).await.unwrap();
}

#[tokio::test]
async fn publish_errors_are_distinguished() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let api = setup(&server).await;
    let packet = json!({});

    let plain = api.publish_to_user("user-7", &packet).await.unwrap_err();
    assert!(matches!(plain, ClientError::PublishToUser(_)));

    let secure = api.encrypted_publish_to_user("user-7", &packet).await.unwrap_err();
    assert!(matches!(secure, ClientError::EncryptedPublishToUser(_)));
}

#[tokio::test]
async fn unreachable_server() {
    init_tracing();
    let api = HttpAbilityApi::new(AbilityConfig {
        base_url: "http://127.0.0.1:9".into(),
        request_timeout_secs: 1,
        ..AbilityConfig::default()
    })
    .unwrap();

    assert!(matches!(
        api.device_keys("user-7").await,
        Err(ClientError::DeviceKeys(_))
    ));
}
