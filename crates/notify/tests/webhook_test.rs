//! Integration tests for chat delivery over real HTTP.
//!
//! A local axum server stands in for the chat space and records every
//! request it receives.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde_json::json;

use blankly_notify::card::{CardDocument, Widget};
use blankly_notify::email::SmtpMailer;
use blankly_notify::preferences::StaticPreferences;
use blankly_notify::webhook::HttpWebhook;
use blankly_notify::{Dispatcher, FilePreferences, NotifyError, NotifyPreferences, Payload, Table};

type Captured = Arc<Mutex<Vec<(Option<String>, String)>>>;

async fn capture(State(store): State<Captured>, headers: HeaderMap, body: String) -> StatusCode {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    store.lock().unwrap().push((content_type, body));
    StatusCode::OK
}

async fn reject() -> (StatusCode, &'static str) {
    (StatusCode::BAD_REQUEST, "invalid card")
}

/// Start the fake chat space; returns its base URL and the request log.
async fn spawn_chat_space() -> (String, Captured) {
    let store = Captured::default();
    let app = Router::new()
        .route("/hook", post(capture))
        .route("/reject", post(reject))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (format!("http://{addr}"), store)
}

fn dispatcher_for(webhook_url: Option<String>) -> Dispatcher {
    let prefs: NotifyPreferences = serde_json::from_value(json!({
        "chat": { "webhook_url": webhook_url }
    }))
    .unwrap();
    Dispatcher::new(
        Arc::new(StaticPreferences(prefs)),
        Arc::new(SmtpMailer::new()),
        Arc::new(HttpWebhook::new()),
    )
}

#[tokio::test]
async fn plain_text_is_posted_verbatim_with_json_content_type() {
    let (base, store) = spawn_chat_space().await;
    let dispatcher = dispatcher_for(Some(format!("{base}/hook")));

    dispatcher.send_chat("hello", None).await.unwrap();

    let requests = store.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].0.as_deref(),
        Some("application/json; charset=UTF-8")
    );
    assert_eq!(requests[0].1, r#"{"text":"hello"}"#);
}

#[tokio::test]
async fn table_is_posted_as_parseable_card() {
    let (base, store) = spawn_chat_space().await;
    let dispatcher = dispatcher_for(Some(format!("{base}/hook")));

    let table = Table::new(["symbol", "pnl"])
        .with_caption("End of day")
        .row([json!("BTC-USD"), json!(120.5)])
        .row([json!("ETH-USD"), json!(-14)]);
    dispatcher
        .send_chat(table, Some("Daily PnL"))
        .await
        .unwrap();

    let requests = store.lock().unwrap();
    let card: CardDocument = serde_json::from_str(&requests[0].1).unwrap();
    assert_eq!(card.title(), Some("Daily PnL"));
    assert_eq!(card.sections().len(), 1);

    let section = &card.sections()[0];
    assert!(section.collapsible);
    assert_eq!(section.widgets.len(), 2);
    match &section.widgets[1] {
        Widget::Grid(grid) => {
            assert_eq!(grid.column_count, 2);
            assert_eq!(grid.items.len(), 6);
            assert_eq!(grid.items[5].title, "-14");
        }
        other => panic!("expected grid, got: {other:?}"),
    }
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let (base, store) = spawn_chat_space().await;
    let dispatcher = dispatcher_for(Some(format!("{base}/reject")));

    let err = dispatcher
        .send_chat(Payload::sequence(["a", "b"]), None)
        .await
        .unwrap_err();
    match err {
        NotifyError::WebhookStatus { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "invalid card");
        }
        other => panic!("expected WebhookStatus, got: {other:?}"),
    }
    assert!(store.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_webhook_url_never_reaches_server() {
    let (_base, store) = spawn_chat_space().await;
    let dispatcher = dispatcher_for(None);

    let err = dispatcher.send_chat("hello", None).await.unwrap_err();
    assert!(matches!(err, NotifyError::WebhookConfig));
    assert!(store.lock().unwrap().is_empty());
}

#[tokio::test]
async fn preferences_file_edits_apply_to_next_send() {
    let (base, store) = spawn_chat_space().await;

    let dir = std::env::temp_dir().join(format!("blankly-notify-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("notify.json");
    std::fs::write(&path, r#"{"chat": {}}"#).unwrap();

    let dispatcher = Dispatcher::new(
        Arc::new(FilePreferences::new(&path)),
        Arc::new(SmtpMailer::new()),
        Arc::new(HttpWebhook::new()),
    );
    assert!(matches!(
        dispatcher.send_chat("first", None).await,
        Err(NotifyError::WebhookConfig)
    ));

    let prefs = json!({ "chat": { "webhook_url": format!("{base}/hook") } });
    std::fs::write(&path, prefs.to_string()).unwrap();
    dispatcher.send_chat("second", None).await.unwrap();

    let requests = store.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1, r#"{"text":"second"}"#);

    std::fs::remove_dir_all(&dir).ok();
}
