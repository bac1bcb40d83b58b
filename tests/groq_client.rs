use log::LevelFilter;
use persona_gateway::errors::GatewayError;
use persona_gateway::llm::groq::GroqChatClient;
use persona_gateway::llm::ChatClient;
use persona_gateway::logging::LoggerFactory;
use persona_gateway::models::chat::{ Message, MessageRole };
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{ body_partial_json, header, method, path };
use wiremock::{ Mock, MockServer, ResponseTemplate };

fn client(dir: &TempDir, server: &MockServer, api_key: Option<&str>) -> GroqChatClient {
    client_with_timeout(dir, server, api_key, Duration::from_secs(60))
}

fn client_with_timeout(
    dir: &TempDir,
    server: &MockServer,
    api_key: Option<&str>,
    timeout: Duration
) -> GroqChatClient {
    let logger = LoggerFactory::new(dir.path(), LevelFilter::Info).get_logger("GroqClient").unwrap();
    GroqChatClient::new(
        api_key.map(str::to_string),
        "openai/gpt-oss-20b".to_string(),
        server.uri(),
        timeout,
        logger
    ).unwrap()
}

fn conversation() -> Vec<Message> {
    vec![
        Message::new(MessageRole::System, "You are a friendly doctor."),
        Message::new(MessageRole::User, "I have a sore throat and fever.")
    ]
}

#[tokio::test]
async fn returns_the_first_completion_text() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer gsk_test"))
        .and(
            body_partial_json(
                json!({
                "model": "openai/gpt-oss-20b",
                "messages": [
                    { "role": "system", "content": "You are a friendly doctor." },
                    { "role": "user", "content": "I have a sore throat and fever." }
                ]
            })
            )
        )
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({
                "choices": [
                    { "index": 0, "message": { "role": "assistant", "content": "Rest and drink fluids." } },
                    { "index": 1, "message": { "role": "assistant", "content": "ignored" } }
                ]
            })
            )
        )
        .expect(1)
        .mount(&server).await;

    let reply = client(&dir, &server, Some("gsk_test"))
        .generate_response(&conversation()).await
        .unwrap();
    assert_eq!(reply, "Rest and drink fluids.");
}

#[tokio::test]
async fn missing_api_key_fails_without_calling_upstream() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server).await;

    let err = client(&dir, &server, None).generate_response(&conversation()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Configuration(_)));
}

#[tokio::test]
async fn rejected_credentials_surface_as_upstream_error() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "Invalid API Key" } }))
        )
        .mount(&server).await;

    let err = client(&dir, &server, Some("bad")).generate_response(&conversation()).await.unwrap_err();
    match err {
        GatewayError::Upstream(msg) => {
            assert!(msg.contains("401"));
            assert!(msg.contains("Invalid API Key"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn response_without_choices_is_an_upstream_error() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server).await;

    let err = client(&dir, &server, Some("gsk_test")).generate_response(&[]).await.unwrap_err();
    assert!(matches!(err, GatewayError::Upstream(_)));
}

#[tokio::test]
async fn undecodable_body_is_a_transport_error() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server).await;

    let err = client(&dir, &server, Some("gsk_test"))
        .generate_response(&conversation()).await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}

#[tokio::test]
async fn stalled_upstream_times_out() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "choices": [{ "message": { "content": "too late" } }] }))
                .set_delay(Duration::from_secs(5))
        )
        .mount(&server).await;

    let started = std::time::Instant::now();
    let err = client_with_timeout(&dir, &server, Some("gsk_test"), Duration::from_millis(300))
        .generate_response(&conversation()).await
        .unwrap_err();

    match err {
        GatewayError::Transport(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(4));
}
