//! End-to-end REPL sessions with scripted input.

use std::time::Duration;

use ragchat::chat::{RagClient, SessionController};
use ragchat::cli::run_repl;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn run_script(
    server: &MockServer,
    script: &str,
    show_sources: bool,
) -> (String, SessionController) {
    let endpoint = format!("{}/rag/chat", server.uri());
    let client = RagClient::new(endpoint, Duration::from_secs(5)).unwrap();
    let mut controller = SessionController::new(client);
    let mut out = Vec::new();

    run_repl(&mut controller, script.as_bytes(), &mut out, show_sources)
        .await
        .unwrap();

    (String::from_utf8(out).unwrap(), controller)
}

#[tokio::test]
async fn answers_questions_and_reports_info() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "answer": "Try the Arbitrum meetup",
                "conversationId": "abcdef123456",
            })),
        )
        .mount(&server)
        .await;

    let script = "hello\n\n/info\n/quit\nnever sent\n";
    let (output, controller) = run_script(&server, script, false).await;

    assert!(output.contains("Try the Arbitrum meetup"));
    assert!(output.contains("Messages: 2"));
    assert!(output.contains("Conversation ID: abcdef12..."));
    assert_eq!(controller.message_count(), 2);
}

#[tokio::test]
async fn sample_command_sends_question_without_emoji() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(
            json!({"question": "Where can I grab a beer and network?"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "The rooftop"})))
        .expect(1)
        .mount(&server)
        .await;

    let (output, controller) = run_script(&server, "/4\n/1\n", false).await;

    assert!(output.contains("The rooftop"));
    assert!(output.contains("only available in an empty chat"));
    assert_eq!(controller.message_count(), 2);
}

#[tokio::test]
async fn failure_notice_then_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "back online"})))
        .mount(&server)
        .await;

    let (output, controller) = run_script(&server, "hello\n/retry\n", false).await;

    assert!(output.contains("Failed to get response from the API. Please try again."));
    assert!(output.contains("back online"));
    assert_eq!(controller.message_count(), 2);
}

#[tokio::test]
async fn clear_resets_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"answer": "hi", "conversationId": "abc123"})),
        )
        .mount(&server)
        .await;

    let (output, controller) = run_script(&server, "hello\n/clear\n", false).await;

    assert!(output.contains("Chat history cleared."));
    assert!(controller.transcript().is_empty());
    assert_eq!(controller.conversation_id(), None);
}

#[tokio::test]
async fn prints_sources_when_asked() {
    let server = MockServer::start().await;
    let long_passage: Value = json!("x".repeat(500));
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "See the list",
            "sources": [{"content": long_passage, "metadata": {}}]
        })))
        .mount(&server)
        .await;

    let (output, _) = run_script(&server, "who is hiring?\n", true).await;

    assert!(output.contains("Sources:"));
    assert!(output.contains(&format!("[1] {}...", "x".repeat(120))));
}

#[tokio::test]
async fn unknown_commands_and_empty_retry_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "unused"})))
        .expect(0)
        .mount(&server)
        .await;

    let (output, _) = run_script(&server, "/dance\n/retry\n", false).await;

    assert!(output.contains("Unknown command: /dance"));
    assert!(output.contains("no unanswered question to retry"));
}
