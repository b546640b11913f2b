//! Client tests against a mock Bot API server

use botgate::config::{BotConfig, ClientConfig, LoggingConfig, Settings};
use botgate::models::{CallParams, ChatId};
use botgate::services::{BotClient, HttpTransport};
use botgate::utils::error::ErrorKind;
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;

const TOKEN: &str = "123456:test-token";

/// Fast retries so failing paths finish in milliseconds
fn fast_config() -> ClientConfig {
    ClientConfig {
        base_delay: 5,
        max_delay: 20,
        timeout: 2000,
        ..Default::default()
    }
}

fn create_client(server: &MockServer) -> BotClient {
    let transport = HttpTransport::new(server.base_url()).unwrap();
    BotClient::with_transport(Some(TOKEN.to_string()), fast_config(), Arc::new(transport))
}

#[tokio::test]
async fn test_unauthorized_is_attempted_once() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/bot{}/getMe", TOKEN));
            then.status(401)
                .json_body(json!({"ok": false, "error_code": 401, "description": "Unauthorized"}));
        })
        .await;

    let client = create_client(&server);
    let err = client.execute("getMe", &CallParams::new()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(err.description(), Some("Unauthorized"));
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn test_server_error_is_attempted_max_retries_plus_one() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/bot{}/getMe", TOKEN));
            then.status(500).body("internal error");
        })
        .await;

    let client = create_client(&server);
    let err = client.execute("getMe", &CallParams::new()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Generic);
    assert_eq!(err.status(), Some(500));
    assert_eq!(mock.hits_async().await, 4);
}

#[tokio::test]
async fn test_application_level_forbidden_is_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/bot{}/sendMessage", TOKEN));
            then.status(200).json_body(json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            }));
        })
        .await;

    let client = create_client(&server);
    let err = client
        .send_message("hello", Some(&ChatId::Id(42)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn test_send_message_uses_default_target() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/bot{}/sendMessage", TOKEN))
                .json_body(json!({"text": "deploy finished", "chat_id": "@ops"}));
            then.status(200).json_body(json!({
                "ok": true,
                "result": {
                    "message_id": 77,
                    "date": 1_700_000_000,
                    "chat": {"id": -100, "type": "channel", "username": "ops"},
                    "text": "deploy finished"
                }
            }));
        })
        .await;

    let settings = Settings {
        bot: BotConfig {
            token: Some(TOKEN.to_string()),
            base_url: server.base_url(),
            default_chat_id: Some(ChatId::from("@ops")),
        },
        client: fast_config(),
        logging: LoggingConfig::default(),
    };
    let client = BotClient::new(&settings).unwrap();

    let message = client.send_message("deploy finished", None).await.unwrap();
    assert_eq!(message.message_id, 77);
    assert_eq!(message.text.as_deref(), Some("deploy finished"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_me() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/bot{}/getMe", TOKEN));
            then.status(200).json_body(json!({
                "ok": true,
                "result": {"id": 99, "is_bot": true, "first_name": "Gate", "username": "gate_bot"}
            }));
        })
        .await;

    let client = create_client(&server);
    let me = client.get_me().await.unwrap();
    assert_eq!(me.id, 99);
    assert!(me.is_bot);
}

#[tokio::test]
async fn test_unexpected_result_shape_is_reported() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(format!("/bot{}/getMe", TOKEN));
            then.status(200).json_body(json!({"ok": true, "result": "not a user"}));
        })
        .await;

    let client = create_client(&server);
    let err = client.get_me().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Generic);
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn test_delete_message() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/bot{}/deleteMessage", TOKEN))
                .json_body(json!({"chat_id": 5, "message_id": 10}));
            then.status(200).json_body(json!({"ok": true, "result": true}));
        })
        .await;

    let client = create_client(&server);
    assert!(client.delete_message(&ChatId::Id(5), 10).await.unwrap());
    mock.assert_async().await;
}
