// =====================================================================================
// SECURITY CELL - SUPABASE AUDIT STORE
// =====================================================================================

use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use security_cell::{AuditAction, AuditEntry, AuditStore, RateLimitKey, SupabaseAuditStore};
use shared_utils::test_utils::TestConfig;

#[tokio::test]
async fn test_append_posts_audit_row() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/rest/v1/audit_logs"))
        .and(header("Prefer", "return=representation"))
        .and(header("apikey", "test-service-role-key"))
        .and(body_partial_json(json!({
            "action": "public_booking_attempt",
            "table_name": "appointments",
            "ip_address": "203.0.113.7"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseAuditStore::new(&config);
    let entry = AuditEntry::new(AuditAction::PublicBookingAttempt, "appointments").with_ip("203.0.113.7");

    store.append(&entry).await.unwrap();
}

#[tokio::test]
async fn test_count_filters_by_action_and_subject() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/audit_logs"))
        .and(query_param("action", "eq.public_booking_attempt"))
        .and(query_param("ip_address", "eq.203.0.113.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }, { "id": 2 }, { "id": 3 }])))
        .mount(&mock_server)
        .await;

    let store = SupabaseAuditStore::new(&config);
    let count = store
        .count_since(
            AuditAction::PublicBookingAttempt,
            RateLimitKey::IpAddress,
            "203.0.113.7",
            Utc::now() - Duration::hours(1),
        )
        .await
        .unwrap();

    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_count_encodes_email_subject() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/audit_logs"))
        .and(query_param("actor", "eq.ana+spa@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .mount(&mock_server)
        .await;

    let store = SupabaseAuditStore::new(&config);
    let count = store
        .count_since(
            AuditAction::LoginAttempt,
            RateLimitKey::Actor,
            "ana+spa@example.com",
            Utc::now() - Duration::minutes(15),
        )
        .await
        .unwrap();

    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_store_error_propagates() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/audit_logs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;

    let store = SupabaseAuditStore::new(&config);
    let result = store
        .count_since(
            AuditAction::PublicBookingAttempt,
            RateLimitKey::IpAddress,
            "203.0.113.7",
            Utc::now(),
        )
        .await;

    assert!(result.is_err());
}
