//! Maintenance window lookups against a mock DMS API

mod common;

use cirrus_core::provider::Provider;
use cirrus_core::resource::{Resource, Value};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{PROJECT, provider};

async fn mount_windows(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/{}/instances/maintain-windows", PROJECT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "maintain_windows": [
                {"seq": 1, "begin": "22", "end": "02", "default": false},
                {"seq": 2, "begin": "02", "end": "06", "default": true},
                {"seq": 3, "begin": "06", "end": "10", "default": false}
            ]
        })))
        .mount(server)
        .await;
}

fn lookup(attrs: &[(&str, Value)]) -> Resource {
    attrs.iter().fold(
        Resource::new("dms_maintain_window", "window").with_read_only(true),
        |r, (k, v)| r.with_attribute(*k, v.clone()),
    )
}

#[tokio::test]
async fn finds_default_window() {
    let server = MockServer::start().await;
    mount_windows(&server).await;

    let state = provider(&server)
        .read_data_source(&lookup(&[("default", Value::Bool(true))]))
        .await
        .unwrap();

    assert_eq!(state.identifier.as_deref(), Some("2"));
    assert_eq!(state.attributes["seq"], Value::Int(2));
    assert_eq!(state.attributes["begin"], Value::String("02".to_string()));
    assert_eq!(state.attributes["end"], Value::String("06".to_string()));
}

#[tokio::test]
async fn without_filters_the_first_regular_window_wins() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/{}/instances/maintain-windows", PROJECT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "maintain_windows": [
                {"seq": 2, "begin": "02", "end": "06", "default": true},
                {"seq": 3, "begin": "06", "end": "10", "default": false}
            ]
        })))
        .mount(&server)
        .await;

    let state = provider(&server)
        .read_data_source(&lookup(&[]))
        .await
        .unwrap();
    assert_eq!(state.identifier.as_deref(), Some("3"));
    assert_eq!(state.attributes["default"], Value::Bool(false));
}

#[tokio::test]
async fn begin_alone_skips_the_default_window() {
    let server = MockServer::start().await;
    mount_windows(&server).await;

    let err = provider(&server)
        .read_data_source(&lookup(&[("begin", Value::String("02".to_string()))]))
        .await
        .unwrap_err();
    assert_eq!(
        err.message,
        "Your query returned no results. Please change your filters and try again."
    );
}

#[tokio::test]
async fn no_match_is_an_error() {
    let server = MockServer::start().await;
    mount_windows(&server).await;

    let err = provider(&server)
        .read_data_source(&lookup(&[
            ("begin", Value::String("22".to_string())),
            ("default", Value::Bool(true)),
        ]))
        .await
        .unwrap_err();

    assert_eq!(
        err.message,
        "Your query returned no results. Please change your filters and try again."
    );
}

#[tokio::test]
async fn list_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/{}/instances/maintain-windows", PROJECT)))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = provider(&server)
        .read_data_source(&lookup(&[]))
        .await
        .unwrap_err();
    assert!(err.message.starts_with("Error getting dms maintainwindows"));
}
