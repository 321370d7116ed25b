//! `SecopClient` against a mock Socrata endpoint.

use secop_relay::domain::DateSpec;
use secop_relay::services::{
    fetch_records, FetchError, FieldSet, QueryProfile, RecordSource, SecopClient, SecopConfig,
};
use secrecy::Secret;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATASET_PATH: &str = "/resource/p6dx-8zbt.json";

fn client(server: &MockServer, app_token: Option<&str>, timeout: Duration) -> SecopClient {
    SecopClient::new(SecopConfig {
        dataset_url: format!("{}{}", server.uri(), DATASET_PATH),
        app_token: app_token.map(|t| Secret::new(t.to_string())),
        timeout,
    })
    .expect("Failed to build SECOP client")
}

fn reduced_query() -> secop_relay::services::QuerySpec {
    let date = DateSpec::parse("2025-04-18").unwrap();
    QueryProfile::default().query_for(FieldSet::Reduced, date)
}

#[tokio::test]
async fn sends_soda_parameters_and_app_token() {
    let server = MockServer::start().await;
    let query = reduced_query();

    Mock::given(method("GET"))
        .and(path(DATASET_PATH))
        .and(header("X-App-Token", "app-token-123"))
        .and(query_param("$select", query.select.as_str()))
        .and(query_param("$where", query.where_clause.as_str()))
        .and(query_param("$order", "precio_base DESC"))
        .and(query_param("$limit", "1000"))
        .and(query_param("$offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id_del_proceso": "CO1.REQ.1", "precio_base": "350000000"},
            {"id_del_proceso": "CO1.REQ.2", "precio_base": "120000000"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let records = client(&server, Some("app-token-123"), Duration::from_secs(5))
        .fetch(&query)
        .await
        .expect("fetch should succeed");

    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["id_del_proceso"], "CO1.REQ.2");
}

#[tokio::test]
async fn non_success_status_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DATASET_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("query.soql.no-such-column"))
        .mount(&server)
        .await;

    let err = client(&server, None, Duration::from_secs(5))
        .fetch(&reduced_query())
        .await
        .unwrap_err();

    match err {
        FetchError::Upstream { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("no-such-column"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_array_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DATASET_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": true})))
        .mount(&server)
        .await;

    let err = client(&server, None, Duration::from_secs(5))
        .fetch(&reduced_query())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidBody(_)));
}

#[tokio::test]
async fn slow_upstream_hits_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DATASET_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client(&server, None, Duration::from_millis(200))
        .fetch(&reduced_query())
        .await
        .unwrap_err();

    match err {
        FetchError::Transport(e) => assert!(e.is_timeout()),
        other => panic!("expected transport timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_records_swallows_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let source = client(&server, None, Duration::from_secs(5));
    let records = fetch_records(&source, &reduced_query()).await;

    assert!(records.is_empty());
}
