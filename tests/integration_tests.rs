//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: config → HTTP requests → protocol messages

use brella_source::{BrellaSource, Message, Source, SourceConfig, State};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn config(server: &MockServer) -> SourceConfig {
    SourceConfig::new(TOKEN, "acme").with_base_url(server.uri())
}

async fn collect(
    source: &BrellaSource,
    config: &SourceConfig,
    streams: &[&str],
    state: Option<&State>,
) -> Vec<Message> {
    let streams: Vec<String> = streams.iter().map(|s| (*s).to_string()).collect();
    source
        .read(config, &streams, state)
        .await
        .unwrap()
        .collect()
        .await
}

fn records_of<'a>(messages: &'a [Message], stream_name: &str) -> Vec<&'a Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { stream, data, .. } if stream == stream_name => Some(data),
            _ => None,
        })
        .collect()
}

fn state_of(messages: &[Message], stream_name: &str) -> Option<Value> {
    messages.iter().find_map(|m| match m {
        Message::State { stream, data } if stream == stream_name => Some(data.clone()),
        _ => None,
    })
}

async fn mount_brella(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/organizations/acme"))
        .and(header("Brella-API-Access-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "acme", "type": "organization"},
            "updated_at": "2024-01-05T12:00:00Z"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/organizations/acme/events"))
        .and(header("Brella-API-Access-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 101, "name": "Summit", "updated_at": "2024-02-01T09:00:00Z"},
                {"id": 102, "name": "Meetup", "updated_at": "2024-03-01T09:00:00Z"}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/organizations/acme/events/101/invites"))
        .and(header("Brella-API-Access-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1, "email": "a@example.com"}, {"id": 4, "email": "b@example.com"}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/organizations/acme/events/102/invites"))
        .and(header("Brella-API-Access-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 3, "email": "c@example.com"}]
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Source Read Tests
// ============================================================================

#[tokio::test]
async fn test_full_read_all_streams() {
    let server = MockServer::start().await;
    mount_brella(&server).await;

    let messages = collect(&BrellaSource::new(), &config(&server), &[], None).await;

    let organization = records_of(&messages, "organization");
    assert_eq!(organization.len(), 1);
    assert_eq!(organization[0]["data"]["id"], "acme");

    let events = records_of(&messages, "events");
    let names: Vec<&Value> = events.iter().map(|e| &e["name"]).collect();
    assert_eq!(names, vec![&json!("Summit"), &json!("Meetup")]);

    let invites = records_of(&messages, "invites");
    let ids: Vec<&Value> = invites.iter().map(|i| &i["id"]).collect();
    assert_eq!(ids, vec![&json!(1), &json!(4), &json!(3)]);

    assert_eq!(
        state_of(&messages, "organization"),
        Some(json!({"updated_at": "2024-01-05T12:00:00Z"}))
    );
    assert_eq!(
        state_of(&messages, "events"),
        Some(json!({"updated_at": "2024-03-01T09:00:00Z"}))
    );
    assert_eq!(
        state_of(&messages, "invites"),
        Some(json!({"id": 4, "events": {"updated_at": "2024-03-01T09:00:00Z"}}))
    );
}

#[tokio::test]
async fn test_message_order_per_stream() {
    let server = MockServer::start().await;
    mount_brella(&server).await;

    let messages = collect(&BrellaSource::new(), &config(&server), &["events"], None).await;

    // start log, two records, state, completion log
    assert_eq!(messages.len(), 5);
    assert!(messages[0].is_log());
    assert!(messages[1].is_record());
    assert!(messages[2].is_record());
    assert!(messages[3].is_state());
    assert!(messages[4].is_log());
}

#[tokio::test]
async fn test_read_resumes_without_regressing_state() {
    let server = MockServer::start().await;
    mount_brella(&server).await;

    let state = State::from_value(json!({
        "invites": {"id": 99, "events": {"updated_at": "2025-01-01T00:00:00Z"}}
    }))
    .unwrap();

    let messages = collect(
        &BrellaSource::new(),
        &config(&server),
        &["invites"],
        Some(&state),
    )
    .await;

    // The API has no server-side filter, so every invite is emitted again
    assert_eq!(records_of(&messages, "invites").len(), 3);
    assert_eq!(
        state_of(&messages, "invites"),
        Some(json!({"id": 99, "events": {"updated_at": "2025-01-01T00:00:00Z"}}))
    );
}

#[tokio::test]
async fn test_failed_stream_does_not_stop_the_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/organizations/acme"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/organizations/acme/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 1}]})))
        .mount(&server)
        .await;

    let messages = collect(
        &BrellaSource::new(),
        &config(&server),
        &["organization", "events"],
        None,
    )
    .await;

    assert!(state_of(&messages, "organization").is_none());
    let error = messages.iter().find_map(|m| match m {
        Message::Log { level, message } if *level == brella_source::LogLevel::Error => {
            Some(message.clone())
        }
        _ => None,
    });
    let error = error.unwrap();
    assert!(error.contains("organization"));
    assert!(error.contains("403"));

    assert_eq!(records_of(&messages, "events").len(), 1);
    assert!(state_of(&messages, "events").is_some());
}

#[tokio::test]
async fn test_invites_without_events() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/organizations/acme/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let messages = collect(&BrellaSource::new(), &config(&server), &["invites"], None).await;

    assert!(records_of(&messages, "invites").is_empty());
    assert_eq!(state_of(&messages, "invites"), Some(json!({"events": {}})));
}

#[tokio::test]
async fn test_paginated_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/organizations/acme/events"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1}, {"id": 2}],
            "meta": {"total_pages": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/organizations/acme/events"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 3}, {"id": 4}],
            "meta": {"total_pages": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server).with_page_size(2);
    let messages = collect(&BrellaSource::new(), &config, &["events"], None).await;

    let ids: Vec<&Value> = records_of(&messages, "events")
        .iter()
        .map(|e| &e["id"])
        .collect();
    assert_eq!(ids, vec![&json!(1), &json!(2), &json!(3), &json!(4)]);
}

#[tokio::test]
async fn test_unknown_stream_is_rejected() {
    let server = MockServer::start().await;
    let result = BrellaSource::new()
        .read(&config(&server), &["speakers".to_string()], None)
        .await;
    assert!(matches!(
        result,
        Err(brella_source::Error::StreamNotFound { .. })
    ));
}

// ============================================================================
// CLI Tests
// ============================================================================

fn parse_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_cli_spec() {
    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_source-brella"))
        .arg("spec")
        .output()
        .await
        .unwrap();
    assert!(output.status.success());

    let lines = parse_lines(&output.stdout);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["type"], "SPEC");
    assert_eq!(
        lines[0]["spec"]["connectionSpecification"]["required"],
        json!(["brella_api_access_token", "organization_id"])
    );
}

#[tokio::test]
async fn test_cli_check_requires_config() {
    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_source-brella"))
        .arg("check")
        .output()
        .await
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Configuration not specified"));
}

#[tokio::test]
async fn test_cli_read_writes_state_file() {
    let server = MockServer::start().await;
    mount_brella(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let config_json = json!({
        "brella_api_access_token": TOKEN,
        "organization_id": "acme",
        "base_url": server.uri()
    })
    .to_string();

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_source-brella"))
        .args(["read", "--streams", "events,invites", "--config-json"])
        .arg(&config_json)
        .arg("--state")
        .arg(&state_path)
        .output()
        .await
        .unwrap();
    assert!(output.status.success());

    let lines = parse_lines(&output.stdout);
    let records = lines.iter().filter(|l| l["type"] == "RECORD").count();
    assert_eq!(records, 5);

    let summary = lines.last().unwrap();
    assert_eq!(summary["type"], "SYNC_SUMMARY");
    assert_eq!(summary["summary"]["status"], "SUCCEEDED");
    assert_eq!(summary["summary"]["total_records"], 5);

    let saved: Value =
        serde_json::from_str(&std::fs::read_to_string(&state_path).unwrap()).unwrap();
    assert_eq!(
        saved["streams"]["events"],
        json!({"updated_at": "2024-03-01T09:00:00Z"})
    );
    assert_eq!(saved["streams"]["invites"]["id"], json!(4));
}
