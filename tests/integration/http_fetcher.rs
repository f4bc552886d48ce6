//! Integration tests for the reqwest-backed fetcher
//!
//! Runs an in-process axum server on an ephemeral port and drives both the
//! bare fetcher and a full controller against it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Query;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::get;
use axum::{Form, Json, Router};
use regflow::{
    Config, FetchRequest, Fetcher, HeadlessBrowser, HttpFetcher, MemoryStorage, NavOutcome,
    RecordingPrompt, SubmitOutcome, Submitter, WizardController,
};
use reqwest::Url;
use serde_json::json;

use super::common::wizard_page;

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

async fn register_page(headers: HeaderMap) -> Html<String> {
    let marker = format!(
        r#"<p id="requested-with">{}</p>"#,
        header(&headers, "x-requested-with")
    );
    Html(wizard_page(1, &format!("{marker}{}", step_one_fields())))
}

fn step_one_fields() -> &'static str {
    r#"<input type="text" name="full_name" value="" required>
       <input type="tel" name="phone" value="" required>"#
}

async fn register_submit(
    headers: HeaderMap,
    Form(fields): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let csrf_ok = header(&headers, "x-csrftoken") == "tok-1";
    let submitter_ok = fields.get("action").map(String::as_str) == Some("next");
    if !csrf_ok || !submitter_ok {
        return Html(wizard_page(1, "<p>rejected</p>")).into_response();
    }
    Redirect::to("/customers/7/").into_response()
}

async fn duplicate_check(Query(query): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    let exists = query.get("phone").map(String::as_str) == Some("000");
    Json(json!({ "exists": exists }))
}

async fn echo(headers: HeaderMap, Form(fields): Form<HashMap<String, String>>) -> String {
    let mut pairs: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    format!(
        "{}|{}|{}",
        header(&headers, "x-requested-with"),
        header(&headers, "x-csrftoken"),
        pairs.join("&")
    )
}

async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/customer_register/", get(register_page).post(register_submit))
        .route("/start/", get(|| async { Redirect::to("/customer_register/?step=1") }))
        .route("/api/customers/check-duplicate/", get(duplicate_check))
        .route("/echo/", axum::routing::post(echo))
        .route("/customers/7/", get(|| async { Html("<h1>Jane Doe</h1>") }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn base(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{addr}")).unwrap()
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_redirect_reports_resolved_url() {
    let addr = spawn_server().await;
    let response = fetcher()
        .send(FetchRequest::get(base(addr).join("/start/").unwrap()))
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.url.path(), "/customer_register/");
    assert_eq!(response.url.query(), Some("step=1"));
    assert!(response.body.contains("registrationWizard"));
}

#[tokio::test]
async fn test_post_sends_headers_and_encoded_form() {
    let addr = spawn_server().await;
    let request = FetchRequest::post(
        base(addr).join("/echo/").unwrap(),
        vec![
            ("full_name".to_string(), "Jane Doe & Co".to_string()),
            ("phone".to_string(), "0812".to_string()),
        ],
    )
    .ajax()
    .with_header("X-CSRFToken", "tok-9");

    let response = fetcher().send(request).await.unwrap();
    assert_eq!(
        response.body,
        "XMLHttpRequest|tok-9|full_name=Jane Doe & Co&phone=0812"
    );
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let closed = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
    let result = HttpFetcher::new(Duration::from_millis(500))
        .unwrap()
        .send(FetchRequest::get(closed))
        .await;
    assert!(matches!(result, Err(regflow::FetchError::Transport { .. })));
}

#[tokio::test]
async fn test_controller_submits_against_live_server() {
    let addr = spawn_server().await;
    let start = base(addr).join("/customer_register/").unwrap();
    let browser = Arc::new(HeadlessBrowser::new(start));
    let prompt = Arc::new(RecordingPrompt::new());
    let controller = WizardController::new(Config::default(), Arc::new(fetcher()), browser.clone())
        .with_storage(Arc::new(MemoryStorage::new()))
        .with_prompt(prompt.clone());

    controller.load().await.unwrap();
    let region = controller.region().unwrap();
    assert!(region.html().contains(r#"<p id="requested-with">-</p>"#));

    controller.input("full_name", "Jane Doe").unwrap();
    controller.input("phone", "0812 3456 789").unwrap();
    let outcome = controller
        .submit(Some(Submitter::new("action", "next")))
        .await
        .unwrap();

    let created = base(addr).join("/customers/7/").unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Submitted(NavOutcome::HardNavigated { url: created.clone() })
    );
    assert_eq!(browser.hard_navigations(), vec![created]);
    assert!(controller.store().raw().is_none());
    assert!(prompt.shown().is_empty());
}

#[tokio::test]
async fn test_controller_stops_on_existing_customer() {
    let addr = spawn_server().await;
    let start = base(addr).join("/customer_register/").unwrap();
    let browser = Arc::new(HeadlessBrowser::new(start));
    let controller = WizardController::new(Config::default(), Arc::new(fetcher()), browser.clone());

    controller.load().await.unwrap();
    controller.input("full_name", "Jane Doe").unwrap();
    controller.input("phone", "000").unwrap();

    let outcome = controller.submit(None).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::DuplicateFound(_)));
    assert!(browser.hard_navigations().is_empty());
    assert!(controller.store().raw().is_some());
}
