//! Transport retry, failure classification and proxy fallback

use crate::{create_test_config, create_transport};
use gibdd_crashes::{Config, GibddError, Transport};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_post_json_returns_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/map/getDTPCardData"))
        .and(body_string_contains("MONTHS:1.2019"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": "{}"}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = create_transport(&create_test_config(&mock_server));
    let response = transport
        .post_json(
            "/map/getDTPCardData",
            &serde_json::json!({ "data": "{\"date\":[\"MONTHS:1.2019\"]}" }),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    let value: serde_json::Value = response.json().unwrap();
    assert_eq!(value["data"], "{}");
}

#[tokio::test]
async fn test_non_success_status_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/map/getDTPCardData"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server);
    config.client.max_retries = 3;
    let transport = create_transport(&config);

    let result = transport
        .post_json("/map/getDTPCardData", &serde_json::json!({}))
        .await;

    match result {
        Err(GibddError::RequestFailed { status, body, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("Expected RequestFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_host_after_retries() {
    let mut config = Config::default();
    config.client.host_url = "http://127.0.0.1:1".to_string();
    config.client.max_retries = 2;
    config.client.retry_backoff_ms = 1;
    config.client.connect_timeout_secs = 1;
    let transport = Transport::new(&config).unwrap();

    let result = transport
        .post_json("/map/getDTPCardData", &serde_json::json!({}))
        .await;

    assert!(
        matches!(result, Err(GibddError::Unreachable { .. })),
        "Expected Unreachable, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_dead_proxy_falls_back_to_direct() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/map/getMainMapData"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server);
    config.proxy.enabled = true;
    config.proxy.proxies = vec!["http://127.0.0.1:1".to_string()];
    let transport = create_transport(&config);

    let response = transport
        .post_json("/map/getMainMapData", &serde_json::json!({}))
        .await
        .unwrap();
    assert_eq!(response.body, "{}");

    let rotation = transport.proxies().unwrap();
    assert_eq!(rotation.available_count(), 0);
}
