//! Integration tests for LiveChatClient against a mock service

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use livechat_client::{ChatService, ClientError, LiveChatClient};
use livechat_core::{FileUpload, InputType, LiveChatConfig, RegistrationData};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, max_retries: u32) -> LiveChatClient {
    let mut config = LiveChatConfig::with_endpoint(server.uri(), "test-token");
    config.max_retries = max_retries;
    LiveChatClient::new(&config).expect("client")
}

#[tokio::test]
async fn test_get_config_sends_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/livechat/config"))
        .and(header("X-LiveChat-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "config": { "firm_name": "Acme", "settings": { "primaryColor": "#000000" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server, 0).get_config().await.unwrap();
    let config = response.config.unwrap();
    assert_eq!(config.title(), "Acme");
    assert_eq!(config.primary_color(), "#000000");
}

#[tokio::test]
async fn test_init_session_posts_registration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/livechat/init"))
        .and(body_json(json!({ "name": "Ada", "phone": "5551234567" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": 7, "name": "Ada", "phone": "5551234567" },
            "external_user_id": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server, 0)
        .init_session(&RegistrationData::new("Ada", "5551234567"))
        .await
        .unwrap();
    assert_eq!(response.user.id, 7);
    assert_eq!(response.history_user_id(), 7);
}

#[tokio::test]
async fn test_send_message_with_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/livechat/message"))
        .and(body_json(json!({
            "external_user_id": 7,
            "message": "hello",
            "object": { "step": 2 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": 31,
            "mode": "bot",
            "response": "hi",
            "options": [{ "label": "Sales", "value": "sales" }],
            "input_type": "file",
            "ended": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let object = json!({ "step": 2 });
    let response = client_for(&server, 0)
        .send_message(7, "hello", Some(&object))
        .await
        .unwrap();

    assert_eq!(response.session_id, Some(31));
    assert_eq!(response.reply_text(), Some("hi"));
    assert_eq!(response.options.len(), 1);
    assert_eq!(response.input_type(), InputType::File);
}

#[tokio::test]
async fn test_send_file_uses_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/livechat/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": 31,
            "mode": "live_agent",
            "response": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = FileUpload::new("receipt.png", "image/png", b"\x89PNG".to_vec());
    let response = client_for(&server, 0)
        .send_file(7, &file, Some("see attached"))
        .await
        .unwrap();
    assert_eq!(response.reply_text(), None);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"), "{content_type}");

    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"external_user_id\""));
    assert!(body.contains("filename=\"receipt.png\""));
    assert!(body.contains("see attached"));
}

#[tokio::test]
async fn test_error_body_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/livechat/init"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "error": "Phone already in use" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server, 0)
        .init_session(&RegistrationData::new("Ada", "5551234567"))
        .await
        .unwrap_err();
    assert!(matches!(&err, ClientError::Api(message) if message == "Phone already in use"));
    assert_eq!(err.to_string(), "Phone already in use");
}

#[tokio::test]
async fn test_error_without_body_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/livechat/history/7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = client_for(&server, 0).get_history(7).await.unwrap_err();
    assert_eq!(err.to_string(), "API request failed");
}

/// History reads are retried on transient failures.
#[tokio::test]
async fn test_history_retries_transient_failure() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    Mock::given(method("GET"))
        .and(path("/livechat/history/7"))
        .respond_with(move |_req: &wiremock::Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({
                    "messages": [
                        { "id": 1, "content": "hello", "sender": "user", "timestamp": "2024-05-01T10:00:00Z" }
                    ],
                    "session_id": 31,
                    "is_live_agent_mode": false
                }))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let history = client_for(&server, 1).get_history(7).await.unwrap();
    assert_eq!(history.messages().len(), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

/// Message sends are never retried, even with retries configured.
#[tokio::test]
async fn test_send_message_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/livechat/message"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server, 2).send_message(7, "hello", None).await;
    assert!(matches!(result, Err(ClientError::Api(_))));
}

#[tokio::test]
async fn test_unconfigured_client_makes_no_request() {
    let server = MockServer::start().await;
    let client = LiveChatClient::new(&LiveChatConfig::with_endpoint(server.uri(), "")).unwrap();

    assert!(!client.is_configured());
    assert!(matches!(client.get_config().await, Err(ClientError::Config(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}
