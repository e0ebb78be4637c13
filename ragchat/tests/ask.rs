//! One-shot `ask` output against a stand-in answer endpoint.

use ragchat::cli::{run_ask, AskOptions};
use ragchat::config::ChatConfig;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ChatConfig {
    ChatConfig::default().override_with(Some(format!("{}/rag/chat", server.uri())), Some(5))
}

/// Run `ask` and return what it wrote to stdout and stderr.
async fn ask(server: &MockServer, question: &str, opts: &AskOptions) -> (String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    run_ask(&config_for(server), question, opts, &mut out, &mut err)
        .await
        .unwrap();
    (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
}

async fn reply_with(server: &MockServer, reply: Value) {
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(server)
        .await;
}

#[tokio::test]
async fn plain_answer_on_stdout_and_id_on_stderr() {
    let server = MockServer::start().await;
    reply_with(&server, json!({"answer": "Try the Arbitrum meetup", "conversationId": "abc123"}))
        .await;

    let (out, err) = ask(&server, "hello", &AskOptions::default()).await;

    assert_eq!(out, "Try the Arbitrum meetup\n");
    assert_eq!(err, "Conversation ID: abc123\n");
}

#[tokio::test]
async fn json_output_carries_answer_id_and_sources() {
    let server = MockServer::start().await;
    reply_with(
        &server,
        json!({
            "answer": "Two events",
            "conversationId": "abc123",
            "sources": [{"content": "ETH Denver", "metadata": {"city": "Denver"}}],
        }),
    )
    .await;

    let opts = AskOptions {
        json: true,
        ..AskOptions::default()
    };
    let (out, err) = ask(&server, "events?", &opts).await;

    let body: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(body["answer"], "Two events");
    assert_eq!(body["conversationId"], "abc123");
    assert_eq!(body["sources"][0]["content"], "ETH Denver");
    assert_eq!(body["sources"][0]["metadata"]["city"], "Denver");
    assert!(err.is_empty());
}

#[tokio::test]
async fn sources_follow_the_answer_when_requested() {
    let server = MockServer::start().await;
    reply_with(
        &server,
        json!({
            "answer": "Two events",
            "conversationId": "abc123",
            "sources": [{"content": "  ETH Denver  ", "metadata": {}}],
        }),
    )
    .await;

    let opts = AskOptions {
        show_sources: true,
        ..AskOptions::default()
    };
    let (out, _) = ask(&server, "events?", &opts).await;

    assert_eq!(out, "Two events\n\nSources:\n  [1] ETH Denver\n");
}

#[tokio::test]
async fn conversation_id_is_sent_trimmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"question": "again", "conversationId": "abc123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let opts = AskOptions {
        conversation_id: Some("  abc123 ".to_string()),
        ..AskOptions::default()
    };
    let (out, err) = ask(&server, "again", &opts).await;

    assert_eq!(out, "ok\n");
    assert_eq!(err, "Conversation ID: abc123\n");
}

#[tokio::test]
async fn blank_conversation_id_is_ignored() {
    let server = MockServer::start().await;
    reply_with(&server, json!({"answer": "fresh", "conversationId": "new456"})).await;

    let opts = AskOptions {
        conversation_id: Some("   ".to_string()),
        ..AskOptions::default()
    };
    let (_, err) = ask(&server, "hello", &opts).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent, json!({"question": "hello"}));
    assert_eq!(err, "Conversation ID: new456\n");
}

#[tokio::test]
async fn endpoint_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = run_ask(
        &config_for(&server),
        "hello",
        &AskOptions::default(),
        &mut out,
        &mut err,
    )
    .await;

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Failed to get response from the API"), "{message}");
    assert!(out.is_empty());
    assert!(err.is_empty());
}
