mod common;

use std::sync::Arc;

use common::{ScriptedLlm, StubRag, TestEnv};
use policydesk::chat::client::PortalClient;
use policydesk::chat::session::{AnswerMode, ChatSession, Role, REQUEST_FAILED_MESSAGE};
use policydesk::error::AppError;

fn client_for(server: &axum_test::TestServer) -> PortalClient {
    let address = server
        .server_address()
        .expect("http transport exposes an address");
    PortalClient::new(address.as_str()).unwrap()
}

#[tokio::test]
async fn client_session_round_trip() {
    let llm = Arc::new(ScriptedLlm::new(vec![Ok("FRY reports are filed quarterly.".into())]));
    let env = TestEnv::with_services(Some(llm), Arc::new(StubRag::default()));
    let server = env.http_server();
    let client = client_for(&server);

    let mut session = ChatSession::new();
    session.set_input("What is FRY?");
    assert!(client.send(&mut session, &[]).await);

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "FRY reports are filed quarterly.");
    assert_eq!(messages[1].confidence.as_deref(), Some("92%"));
    assert_eq!(messages[1].mode, Some(AnswerMode::Basic));
    assert_eq!(messages[1].sources.len(), 2);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn client_blank_input_sends_nothing() {
    let env = TestEnv::start();
    let server = env.http_server();
    let client = client_for(&server);

    let mut session = ChatSession::new();
    session.set_input("   ");
    assert!(!client.send(&mut session, &[]).await);
    assert!(session.messages().is_empty());
}

#[tokio::test]
async fn client_surfaces_server_errors() {
    let env = TestEnv::with_services(None, Arc::new(StubRag::default()));
    let server = env.http_server();
    let client = client_for(&server);

    let mut session = ChatSession::new();
    session.set_input("What is FRY?");
    assert!(client.send(&mut session, &[]).await);

    let reply = session.messages().last().unwrap();
    assert_eq!(reply.content, REQUEST_FAILED_MESSAGE);
    assert_eq!(reply.confidence.as_deref(), Some("error"));

    let request = policydesk::chat::ask::AskRequest {
        question: "What is FRY?".into(),
        selected_documents: Vec::new(),
        use_rag: true,
    };
    match client.ask(&request).await {
        Err(AppError::Upstream(message)) => assert!(message.contains("not configured")),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn client_reads_health() {
    let llm = Arc::new(ScriptedLlm::default());
    let env = TestEnv::with_services(Some(llm), Arc::new(StubRag::default()));
    let server = env.http_server();
    let client = client_for(&server);

    let health = client.health().await.unwrap();
    assert!(health.llm_configured);
    assert_eq!(health.message, "All systems operational");
}
