//! End-to-end queries against mocked feed endpoints.
//!
//! Feeds are served by WireMock as encoded protobuf and fetched through the
//! real `BasicClient`, so routing, HTTP status handling and decoding are all
//! exercised.

use chrono::{DateTime, TimeZone, Utc};
use gtfs_rt_arrivals::config::FeedConfig;
use gtfs_rt_arrivals::fetch::{ApiKey, BasicClient};
use gtfs_rt_arrivals::gtfs_rt::translated_string::Translation;
use gtfs_rt_arrivals::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use gtfs_rt_arrivals::gtfs_rt::{
    self, EntitySelector, FeedEntity, FeedHeader, TimeRange, TranslatedString, TripDescriptor,
};
use gtfs_rt_arrivals::routes::MtaRouteTable;
use gtfs_rt_arrivals::{FeedQueryEngine, Query, QueryError};
use prost::Message;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

const NOW: i64 = 1_700_000_000;

// =============================================================================
// Test Helpers
// =============================================================================

fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(NOW, 0).unwrap()
}

fn config(server: &MockServer) -> FeedConfig {
    FeedConfig {
        subway_feed_base_url: format!("{}/subway/gtfs", server.uri()),
        bus_feed_url: format!("{}/bus/tripUpdates", server.uri()),
        alert_feed_url: format!("{}/alerts", server.uri()),
        bus_api_key: Some("bus-key".to_string()),
        ..FeedConfig::default()
    }
}

fn engine(config: &FeedConfig) -> FeedQueryEngine<BasicClient, MtaRouteTable> {
    FeedQueryEngine::new(
        BasicClient::new(),
        MtaRouteTable::new(config).expect("valid route table"),
        config.alert_feed_url.clone(),
    )
}

fn encode(entity: Vec<FeedEntity>) -> Vec<u8> {
    gtfs_rt::FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(NOW as u64),
            incrementality: None,
            feed_version: None,
        },
        entity,
    }
    .encode_to_vec()
}

fn trip(id: &str, route: &str, stop: &str, arrival: i64) -> FeedEntity {
    FeedEntity {
        id: id.to_string(),
        trip_update: Some(gtfs_rt::TripUpdate {
            trip: TripDescriptor {
                trip_id: Some(id.to_string()),
                route_id: Some(route.to_string()),
                ..Default::default()
            },
            stop_time_update: vec![StopTimeUpdate {
                stop_id: Some(stop.to_string()),
                arrival: Some(StopTimeEvent {
                    time: Some(arrival),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn alert(id: &str, periods: Vec<TimeRange>, selector: EntitySelector, text: &str) -> FeedEntity {
    FeedEntity {
        id: id.to_string(),
        alert: Some(gtfs_rt::Alert {
            active_period: periods,
            informed_entity: vec![selector],
            header_text: Some(TranslatedString {
                translation: vec![Translation {
                    text: text.to_string(),
                    language: Some("en".to_string()),
                }],
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn current() -> Vec<TimeRange> {
    vec![TimeRange {
        start: Some(NOW as u64 - 3_600),
        end: Some(NOW as u64 + 3_600),
    }]
}

fn subway(route: Option<&str>, stop: Option<&str>) -> EntitySelector {
    EntitySelector {
        agency_id: Some("MTASBWY".to_string()),
        route_id: route.map(str::to_string),
        stop_id: stop.map(str::to_string),
        ..Default::default()
    }
}

fn protobuf(bytes: Vec<u8>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(bytes, "application/x-protobuf")
}

async fn mount(server: &MockServer, feed_path: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(feed_path))
        .respond_with(response)
        .mount(server)
        .await;
}

fn rail(route: &str, stop: &str) -> Query {
    Query::parse(route, stop, "rail").unwrap()
}

// =============================================================================
// Query Tests
// =============================================================================

#[tokio::test]
async fn test_subway_query_returns_arrivals_and_alerts() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/subway/gtfs",
        protobuf(encode(vec![
            trip("t1", "6", "103N", NOW + 300),
            trip("t2", "6", "103N", NOW - 60),
            trip("t3", "6", "103S", NOW + 120),
        ])),
    )
    .await;
    mount(
        &server,
        "/alerts",
        protobuf(encode(vec![
            alert("a1", current(), subway(None, Some("103S")), "Elevator out"),
            alert("a2", current(), subway(Some("006"), None), "Elevator out"),
            alert("a3", vec![], subway(Some("6"), None), "Never shown"),
            alert("a4", current(), subway(Some("A"), None), "A train rerouted"),
        ])),
    )
    .await;

    let response = engine(&config(&server))
        .run_query_at(&rail("6", "103N"), now())
        .await
        .unwrap();

    assert_eq!(response.arrivals, vec![5]);
    assert_eq!(response.alerts, vec!["Elevator out".to_string()]);
}

#[tokio::test]
async fn test_lettered_route_uses_its_own_feed() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/subway/gtfs-ace",
        protobuf(encode(vec![
            trip("t1", "A", "A02N", NOW + 600),
            trip("t2", "A", "A02N", NOW + 60),
            trip("t3", "A", "A02N", NOW + 900),
            trip("t4", "A", "A02N", NOW + 1_800),
        ])),
    )
    .await;
    mount(&server, "/alerts", protobuf(encode(vec![]))).await;

    let response = engine(&config(&server))
        .run_query_at(&rail("A", "A02N"), now())
        .await
        .unwrap();

    assert_eq!(response.arrivals, vec![1, 10, 15]);
    assert!(response.alerts.is_empty());
}

#[tokio::test]
async fn test_bus_query_sends_key_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bus/tripUpdates"))
        .and(query_param("key", "bus-key"))
        .respond_with(protobuf(encode(vec![trip(
            "b1",
            "MTA NYCT_B63",
            "308212",
            NOW + 240,
        )])))
        .expect(1)
        .mount(&server)
        .await;
    mount(&server, "/alerts", protobuf(encode(vec![]))).await;

    let query = Query::parse("MTA NYCT_B63", "308212", "bus").unwrap();
    let response = engine(&config(&server))
        .run_query_at(&query, now())
        .await
        .unwrap();

    assert_eq!(response.arrivals, vec![4]);
}

#[tokio::test]
async fn test_api_key_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("x-api-key", "secret"))
        .respond_with(protobuf(encode(vec![])))
        .expect(2)
        .mount(&server)
        .await;

    let config = config(&server);
    let engine = FeedQueryEngine::new(
        ApiKey::new(BasicClient::new(), &config.api_key_header, "secret").unwrap(),
        MtaRouteTable::new(&config).unwrap(),
        config.alert_feed_url.clone(),
    );

    let response = engine.run_query_at(&rail("L", "L01N"), now()).await.unwrap();
    assert!(response.arrivals.is_empty());
}

// =============================================================================
// Failure Tests
// =============================================================================

#[tokio::test]
async fn test_alert_feed_error_status_fails_query() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/subway/gtfs",
        protobuf(encode(vec![trip("t1", "6", "103N", NOW + 300)])),
    )
    .await;
    mount(&server, "/alerts", ResponseTemplate::new(503)).await;

    let err = engine(&config(&server))
        .run_query_at(&rail("6", "103N"), now())
        .await
        .unwrap_err();

    match &err {
        QueryError::FeedUnavailable { url, .. } => assert!(url.ends_with("/alerts")),
        other => panic!("expected FeedUnavailable, got {other:?}"),
    }
    assert!(err.status().is_server_error());
}

#[tokio::test]
async fn test_garbage_payload_is_malformed() {
    let server = MockServer::start().await;
    mount(&server, "/subway/gtfs", protobuf(vec![0xFF, 0xFE, 0x00, 0x01])).await;
    mount(&server, "/alerts", protobuf(encode(vec![]))).await;

    let err = engine(&config(&server))
        .run_query_at(&rail("6", "103N"), now())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::MalformedFeed { .. }));
    assert_eq!(err.kind(), "malformed_feed");
}

#[tokio::test]
async fn test_empty_body_is_malformed() {
    let server = MockServer::start().await;
    mount(&server, "/subway/gtfs", protobuf(Vec::new())).await;
    mount(&server, "/alerts", protobuf(encode(vec![]))).await;

    let err = engine(&config(&server))
        .run_query_at(&rail("6", "103N"), now())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::MalformedFeed { .. }));
}

#[tokio::test]
async fn test_missing_parameters_are_invalid_requests() {
    let server = MockServer::start().await;
    let engine = engine(&config(&server));

    let err = engine.run_query("6", "", "rail").await.unwrap_err();

    assert!(matches!(err, QueryError::InvalidRequest(_)));
    assert!(err.status().is_client_error());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
