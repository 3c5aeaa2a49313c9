use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use futures::future::join_all;
use serde_json::json;
use shared::domain::Fragment;
use tokio::{net::TcpListener, sync::Mutex};

use super::*;
use crate::{ChatEndpoint, InputField, MessageDispatcher, Transcript};

#[derive(Clone, Default)]
struct BotState {
    received: Arc<Mutex<Vec<String>>>,
}

async fn echo_reply(
    State(state): State<BotState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let message = params.get("message").cloned().unwrap_or_default();
    state.received.lock().await.push(message.clone());
    Json(json!({ "reply": format!("echo: {message}"), "sentiment": "neutral" }))
}

async fn not_json() -> &'static str {
    "<html>Server Error</html>"
}

async fn no_reply_field() -> Json<serde_json::Value> {
    Json(json!({ "answer": "wrong key" }))
}

async fn server_error() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "reply": "should not be shown" })),
    )
}

async fn slow_reply() -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({ "reply": "too late" }))
}

async fn spawn_bot_server() -> Result<(String, BotState)> {
    let state = BotState::default();
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/chatbot/get_response/", get(echo_reply))
        .route("/broken/not_json/", get(not_json))
        .route("/broken/no_reply/", get(no_reply_field))
        .route("/broken/status/", get(server_error))
        .route("/broken/slow/", get(slow_reply))
        .with_state(state.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok((format!("http://{addr}"), state))
}

fn http_dispatcher(
    endpoint: ChatEndpoint,
    input: &InputField,
    transcript: &Transcript,
) -> MessageDispatcher {
    MessageDispatcher::new(
        endpoint,
        Arc::new(input.clone()),
        Arc::new(transcript.clone()),
    )
}

#[tokio::test]
async fn dispatch_over_http_sends_exact_message() {
    let (server_url, state) = spawn_bot_server().await.expect("server");
    let input = InputField::new("Is this sentense correct? 100% & sure");
    let transcript = Transcript::new();
    let endpoint = ChatEndpoint::new(&server_url).expect("endpoint");

    let payload = http_dispatcher(endpoint, &input, &transcript)
        .dispatch()
        .await
        .expect("dispatch");

    assert_eq!(payload.reply, "echo: Is this sentense correct? 100% & sure");
    assert_eq!(
        state.received.lock().await.as_slice(),
        ["Is this sentense correct? 100% & sure".to_string()]
    );
    assert_eq!(
        transcript.fragments().await,
        vec![
            Fragment::you("Is this sentense correct? 100% & sure"),
            Fragment::bot("echo: Is this sentense correct? 100% & sure"),
        ]
    );
}

#[tokio::test]
async fn empty_message_reaches_server() {
    let (server_url, state) = spawn_bot_server().await.expect("server");
    let input = InputField::default();
    let transcript = Transcript::new();
    let endpoint = ChatEndpoint::new(&server_url).expect("endpoint");

    http_dispatcher(endpoint, &input, &transcript)
        .dispatch()
        .await
        .expect("dispatch");

    assert_eq!(state.received.lock().await.as_slice(), [String::new()]);
    assert_eq!(transcript.len().await, 2);
}

#[tokio::test]
async fn overlapping_http_dispatches_all_land() {
    let (server_url, state) = spawn_bot_server().await.expect("server");
    let transcript = Transcript::new();
    let endpoint = ChatEndpoint::new(&server_url).expect("endpoint");
    let dispatchers: Vec<_> = ["alpha", "beta", "gamma"]
        .into_iter()
        .map(|text| http_dispatcher(endpoint.clone(), &InputField::new(text), &transcript))
        .collect();

    let results = join_all(dispatchers.iter().map(|dispatcher| dispatcher.dispatch())).await;

    assert!(results.iter().all(|result| result.is_ok()));
    assert_eq!(state.received.lock().await.len(), 3);
    let fragments = transcript.fragments().await;
    assert_eq!(fragments.len(), 6);
    for text in ["alpha", "beta", "gamma"] {
        assert!(fragments.contains(&Fragment::you(text)));
        assert!(fragments.contains(&Fragment::bot(format!("echo: {text}"))));
    }
}

#[tokio::test]
async fn malformed_body_is_reported() {
    let (server_url, _state) = spawn_bot_server().await.expect("server");
    let endpoint = ChatEndpoint::with_path(&server_url, "/broken/not_json/").expect("endpoint");

    let err = HttpReplyFetcher::new()
        .fetch_reply(&endpoint.request_url("Hello"))
        .await
        .expect_err("must fail");

    assert!(matches!(err, DispatchError::MalformedBody { .. }), "got {err:?}");
}

#[tokio::test]
async fn missing_reply_field_is_reported() {
    let (server_url, _state) = spawn_bot_server().await.expect("server");
    let endpoint = ChatEndpoint::with_path(&server_url, "/broken/no_reply/").expect("endpoint");

    let err = HttpReplyFetcher::new()
        .fetch_reply(&endpoint.request_url("Hello"))
        .await
        .expect_err("must fail");

    assert!(matches!(err, DispatchError::MissingReply { .. }), "got {err:?}");
}

#[tokio::test]
async fn error_status_is_reported_without_appending() {
    let (server_url, _state) = spawn_bot_server().await.expect("server");
    let input = InputField::new("Hello");
    let transcript = Transcript::new();
    let endpoint = ChatEndpoint::with_path(&server_url, "/broken/status/").expect("endpoint");

    let err = http_dispatcher(endpoint, &input, &transcript)
        .dispatch()
        .await
        .expect_err("must fail");

    match err {
        DispatchError::Status { status, .. } => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR)
        }
        other => panic!("unexpected error variant: {other:?}"),
    }
    assert!(transcript.is_empty().await);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let input = InputField::new("Hello");
    let transcript = Transcript::new();
    let endpoint = ChatEndpoint::new(&format!("http://{addr}")).expect("endpoint");

    let err = http_dispatcher(endpoint, &input, &transcript)
        .dispatch()
        .await
        .expect_err("must fail");

    assert!(matches!(err, DispatchError::Transport { .. }), "got {err:?}");
    assert!(transcript.is_empty().await);
}

#[tokio::test]
async fn request_timeout_is_a_transport_error() {
    let (server_url, _state) = spawn_bot_server().await.expect("server");
    let endpoint = ChatEndpoint::with_path(&server_url, "/broken/slow/").expect("endpoint");
    let fetcher = HttpReplyFetcher::with_timeout(Duration::from_millis(200)).expect("client");

    let err = fetcher
        .fetch_reply(&endpoint.request_url("Hello"))
        .await
        .expect_err("must time out");

    match err {
        DispatchError::Transport { source, .. } => assert!(source.is_timeout(), "{source}"),
        other => panic!("unexpected error variant: {other:?}"),
    }
}
