//! HTTP alert source tests against a wiremock server.
//!
//! These verify the request shapes of every endpoint, bearer-token handling
//! and the classification of failures that the monitor relies on.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use virtualeye_client::{AlertSource, ClientError, HttpAlertSource};
use virtualeye_core::{AlertToggleSet, AlertType, ApiConfig};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

fn config_for(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        token_env: "VIRTUALEYE_TEST_TOKEN_NOT_SET".to_string(),
    }
}

#[tokio::test]
async fn test_fetch_recent_alerts_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alerts/recent"))
        .and(header("authorization", "Bearer jwt-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "alerts": [
                {
                    "id": "a1",
                    "type": "human",
                    "message": "Person detected",
                    "timestamp": "2026-10-16T08:30:00Z"
                }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::with_token(&config_for(&mock_server), "jwt-123").unwrap();
    let alerts = source.fetch_recent_alerts().await.unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id.as_deref(), Some("a1"));
    assert_eq!(alerts[0].alert_type, AlertType::Human);
    assert_eq!(alerts[0].message, "Person detected");
}

#[tokio::test]
async fn test_empty_recent_alerts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alerts/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"alerts": []})))
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::from_config(&config_for(&mock_server)).unwrap();
    assert!(source.fetch_recent_alerts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_alert_config_round_trip_shapes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alerts/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "toggles": {"motion": true, "human": false, "cameraCovered": false}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/alerts/config"))
        .and(body_json(serde_json::json!({
            "toggles": {"motion": true, "human": true, "cameraCovered": false}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::with_token(&config_for(&mock_server), "jwt").unwrap();

    let toggles = source.fetch_alert_config().await.unwrap();
    assert!(toggles.motion);
    assert!(!toggles.human);

    let updated = toggles.with(AlertType::Human, true);
    source.update_alert_config(&updated).await.unwrap();
}

#[tokio::test]
async fn test_trigger_marks_alert_as_simulated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/alerts/trigger"))
        .and(body_json(serde_json::json!({
            "type": "motion",
            "message": "Motion detected",
            "simulated": true
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::with_token(&config_for(&mock_server), "jwt").unwrap();
    source
        .trigger_test_alert(AlertType::Motion, "Motion detected")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unauthorized_clears_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/alerts/trigger"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"message": "Token has expired"})),
        )
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::with_token(&config_for(&mock_server), "stale").unwrap();
    let err = source
        .trigger_test_alert(AlertType::Human, "x")
        .await
        .unwrap_err();

    assert!(err.is_auth_error());
    assert!(err.to_string().contains("Token has expired"));
    assert!(!source.has_token(), "a rejected session must be dropped");
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alerts/recent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::from_config(&config_for(&mock_server)).unwrap();
    let err = source.fetch_recent_alerts().await.unwrap_err();

    assert!(matches!(err, ClientError::ApiTransientError(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alerts/history"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::from_config(&config_for(&mock_server)).unwrap();
    let err = source.fetch_alert_history().await.unwrap_err();
    assert!(matches!(err, ClientError::JsonError(_)));
}

#[tokio::test]
async fn test_login_stores_token_for_later_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "admin@virtualeye.local",
            "password": "pw"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "fresh-jwt",
            "user": {"email": "admin@virtualeye.local", "role": "ADMIN"}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/alerts/history"))
        .and(header("authorization", "Bearer fresh-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "alerts": [
                {"_id": "h2", "type": "motion", "timestamp": "2026-10-16T09:00:00Z", "severity": "LOW"},
                {"_id": "h1", "type": "human", "timestamp": "2026-10-16T08:00:00Z", "severity": "HIGH"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::from_config(&config_for(&mock_server)).unwrap();
    assert!(!source.has_token());

    source.login("admin@virtualeye.local", "pw").await.unwrap();
    assert!(source.has_token());

    let history = source.fetch_alert_history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id.as_deref(), Some("h2"));
}

#[tokio::test]
async fn test_login_failure_surfaces_backend_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"message": "Invalid email or password."})),
        )
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::from_config(&config_for(&mock_server)).unwrap();
    let err = source.login("x@y.z", "wrong").await.unwrap_err();

    assert!(err.is_auth_error());
    assert!(err.to_string().contains("Invalid email or password."));
}

#[tokio::test]
async fn test_health_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "service": "VirtualEye backend"
        })))
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::from_config(&config_for(&mock_server)).unwrap();
    let health = source.health().await.unwrap();
    assert!(health.is_ok());
    assert_eq!(health.service, "VirtualEye backend");
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    drop(mock_server);

    let source = HttpAlertSource::from_config(&config).unwrap();
    let err = source.fetch_recent_alerts().await.unwrap_err();
    assert!(err.is_network_error(), "expected a network error, got {err:?}");
}

#[tokio::test]
async fn test_toggle_set_default_is_all_disabled_when_server_omits_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alerts/config"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"toggles": {"human": true}})),
        )
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::from_config(&config_for(&mock_server)).unwrap();
    let toggles = source.fetch_alert_config().await.unwrap();
    assert_eq!(toggles, AlertToggleSet::default().with(AlertType::Human, true));
}

#[tokio::test]
async fn test_recent_alerts_accept_backend_date_formats() {
    let mock_server = MockServer::start().await;

    // Flask jsonify emits HTTP dates; detectors send naive isoformat() or epoch seconds
    Mock::given(method("GET"))
        .and(path("/alerts/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "alerts": [
                {"_id": "m1", "type": "motion", "message": "Motion", "timestamp": "Fri, 16 Oct 2026 08:30:00 GMT"},
                {"_id": "h1", "type": "human", "message": "Person", "timestamp": "2026-10-16T08:30:00.123456"},
                {"_id": "c1", "type": "cameraCovered", "message": "Covered", "timestamp": 1792139400.5},
                {"_id": "h2", "type": "human", "message": "Person", "timestamp": "2026-10-16T08:30:00Z"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let source = HttpAlertSource::from_config(&config_for(&mock_server)).unwrap();
    let alerts = source.fetch_recent_alerts().await.unwrap();

    let base = Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap();
    assert_eq!(alerts.len(), 4);
    assert_eq!(alerts[0].timestamp, base);
    assert_eq!(alerts[1].timestamp, base + chrono::Duration::microseconds(123_456));
    assert_eq!(alerts[2].timestamp, base + chrono::Duration::milliseconds(500));
    assert_eq!(alerts[3].timestamp, base);
}

#[tokio::test]
async fn test_slow_backend_is_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alerts/recent"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"alerts": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let config = ApiConfig {
        timeout_secs: 1,
        ..config_for(&mock_server)
    };
    let source = HttpAlertSource::from_config(&config).unwrap();
    let err = source.fetch_recent_alerts().await.unwrap_err();

    assert!(matches!(err, ClientError::Timeout(_)), "expected a timeout, got {err:?}");
    assert!(err.is_retryable());
    assert_eq!(err.friendly_message(), "Request timed out. Check your connection.");
}
