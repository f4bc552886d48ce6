//! Integration tests for step-link, back/forward and reload navigation
//!
//! Tests the flow: click/popstate -> MockFetcher -> SwapDecision -> history
//! and region state on the controller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use regflow::nav::mock::{MockFetcher, MockResponse};
use regflow::nav::AJAX_HEADER;
use regflow::{
    Browser, FetchMethod, HistoryMode, LinkClick, Modifiers, NavOutcome, Region, ScrollTarget,
};

use super::common::*;

#[tokio::test]
async fn test_step_link_swaps_region_and_pushes_history() {
    let fetcher = MockFetcher::new(ORIGIN).route(
        FetchMethod::Get,
        STEP_2,
        MockResponse::html(step_two()),
    );
    let h = Harness::new(REGISTER, fetcher);
    h.controller.attach(&step_one("", ""));

    let href = h.controller.region().unwrap().step_links()[0].href.clone();
    assert_eq!(href, STEP_2);

    let outcome = h.controller.follow_step(&href).await.unwrap();
    assert_eq!(
        outcome,
        NavOutcome::Swapped {
            url: url(STEP_2),
            history: HistoryMode::Push
        }
    );

    assert_eq!(h.step(), Some(2));
    assert_eq!(h.browser.entries(), vec![url(REGISTER), url(STEP_2)]);
    assert_eq!(h.controller.navigation().current_url, url(STEP_2));
    assert_eq!(
        h.browser.scrolls().last(),
        Some(&ScrollTarget::RegionStart("registrationWizard".into()))
    );

    let requests = h.fetcher.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, FetchMethod::Get);
    assert_eq!(requests[0].header(AJAX_HEADER.0), Some("XMLHttpRequest"));
}

#[tokio::test]
async fn test_back_refetches_without_touching_history() {
    let fetcher = MockFetcher::new(ORIGIN)
        .route(FetchMethod::Get, STEP_2, MockResponse::html(step_two()))
        .route(FetchMethod::Get, REGISTER, MockResponse::html(step_one("", "")));
    let h = Harness::new(REGISTER, fetcher);
    h.controller.attach(&step_one("", ""));
    h.controller.follow_step(STEP_2).await.unwrap();

    assert_eq!(h.browser.back(), Some(url(REGISTER)));
    let outcome = h.controller.pop_state().await.unwrap();

    assert_eq!(
        outcome,
        NavOutcome::Swapped {
            url: url(REGISTER),
            history: HistoryMode::PassThrough
        }
    );
    assert_eq!(h.step(), Some(1));
    assert_eq!(h.browser.len(), 2);
    assert_eq!(h.browser.current_url(), url(REGISTER));
    assert_eq!(h.fetcher.requests_with(FetchMethod::Get).len(), 2);
}

#[tokio::test]
async fn test_reload_replaces_current_entry() {
    let fetcher = MockFetcher::new(ORIGIN).route(
        FetchMethod::Get,
        REGISTER,
        MockResponse::html(step_one("", "")),
    );
    let h = Harness::new(REGISTER, fetcher);
    h.controller.attach(&step_one("", ""));

    let outcome = h.controller.reload().await.unwrap();
    assert!(matches!(
        outcome,
        NavOutcome::Swapped {
            history: HistoryMode::Replace,
            ..
        }
    ));
    assert_eq!(h.browser.entries(), vec![url(REGISTER)]);
}

#[tokio::test]
async fn test_redirect_out_of_flow_hard_navigates() {
    // The detail page happens to reuse the container id; the URL still wins
    let fetcher = MockFetcher::new(ORIGIN).route(
        FetchMethod::Get,
        STEP_2,
        MockResponse::html(step_two()).redirected_to("/customers/42/"),
    );
    let h = Harness::new(REGISTER, fetcher);
    h.controller.attach(&step_one("", ""));

    let outcome = h.controller.follow_step(STEP_2).await.unwrap();
    assert_eq!(
        outcome,
        NavOutcome::HardNavigated {
            url: url("/customers/42/")
        }
    );
    assert_eq!(h.browser.hard_navigations(), vec![url("/customers/42/")]);
    assert!(h.controller.region().is_none());
}

#[tokio::test]
async fn test_response_without_container_hard_navigates() {
    let fetcher = MockFetcher::new(ORIGIN).route(
        FetchMethod::Get,
        STEP_2,
        MockResponse::html("<html><body><h1>Session expired</h1></body></html>"),
    );
    let h = Harness::new(REGISTER, fetcher);
    h.controller.attach(&step_one("", ""));

    let outcome = h.controller.follow_step(STEP_2).await.unwrap();
    assert_eq!(outcome, NavOutcome::HardNavigated { url: url(STEP_2) });
    assert_eq!(h.browser.hard_navigations(), vec![url(STEP_2)]);
}

#[tokio::test]
async fn test_transport_failure_leaves_page_alone() {
    let fetcher = MockFetcher::new(ORIGIN).route(
        FetchMethod::Get,
        STEP_2,
        MockResponse::transport_error(),
    );
    let h = Harness::new(REGISTER, fetcher);
    h.controller.attach(&step_one("", ""));

    assert!(h.controller.follow_step(STEP_2).await.is_err());
    assert_eq!(h.step(), Some(1));
    assert_eq!(h.browser.len(), 1);
}

#[tokio::test]
async fn test_new_tab_and_modifier_clicks_are_left_to_browser() {
    let fetcher = MockFetcher::new(ORIGIN);
    let h = Harness::new(REGISTER, fetcher);
    h.controller.attach(&step_one("", ""));

    let blank = LinkClick::new(STEP_2).with_target("_blank");
    let meta = LinkClick::new(STEP_2).with_modifiers(Modifiers {
        meta: true,
        ..Default::default()
    });
    assert_eq!(h.controller.follow_link(blank).await.unwrap(), NavOutcome::Ignored);
    assert_eq!(h.controller.follow_link(meta).await.unwrap(), NavOutcome::Ignored);
    assert_eq!(h.fetcher.request_count(), 0);
    assert_eq!(h.browser.len(), 1);
}

#[tokio::test]
async fn test_stale_response_never_overwrites_newer_one() {
    let fetcher = MockFetcher::new(ORIGIN)
        .route(
            FetchMethod::Get,
            STEP_2,
            MockResponse::html(step_two()).with_delay(Duration::from_millis(150)),
        )
        .route(FetchMethod::Get, STEP_3, MockResponse::html(step_three()));
    let h = Harness::new(REGISTER, fetcher);
    h.controller.attach(&step_one("", ""));

    let (slow, fast) = tokio::join!(
        h.controller.follow_step(STEP_2),
        h.controller.follow_step(STEP_3)
    );

    assert_eq!(slow.unwrap(), NavOutcome::Superseded);
    assert!(matches!(fast.unwrap(), NavOutcome::Swapped { .. }));
    assert_eq!(h.step(), Some(3));
    assert_eq!(h.browser.entries(), vec![url(REGISTER), url(STEP_3)]);
}

#[tokio::test]
async fn test_values_restored_when_returning_to_a_step() {
    let fetcher = MockFetcher::new(ORIGIN)
        .route(FetchMethod::Get, STEP_2, MockResponse::html(step_two()))
        .route(FetchMethod::Get, REGISTER, MockResponse::html(step_one("", "")));
    let h = Harness::new(REGISTER, fetcher);
    h.controller.attach(&step_one("", ""));

    h.controller.input("full_name", "Jane Doe").unwrap();
    h.controller.input("phone", "0812-3456-789").unwrap();
    h.controller.set_checked("newsletter", "yes", true).unwrap();
    h.controller.follow_step(STEP_2).await.unwrap();
    h.controller.set_checked("intent", "service", true).unwrap();

    h.controller.follow_step(REGISTER).await.unwrap();
    let form = h.controller.form().unwrap();
    assert_eq!(form.value_of("full_name"), Some("Jane Doe"));
    assert_eq!(form.value_of("phone"), Some("08123456789"));
    assert_eq!(form.value_of("newsletter"), Some("yes"));
    assert_eq!(form.step("step"), Some(1));

    // Step-2 values survive while step 1 is shown
    let stored = h.stored().unwrap();
    assert!(stored.contains(r#""intent":"service""#), "{stored}");
}

#[tokio::test]
async fn test_rebind_runs_once_per_attach_and_swap() {
    let fetcher = MockFetcher::new(ORIGIN)
        .route(FetchMethod::Get, STEP_2, MockResponse::html(step_two()))
        .route(FetchMethod::Get, STEP_3, MockResponse::html(step_three()));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let h = Harness::new(REGISTER, fetcher);
    let controller = h.controller.with_rebind(Arc::new(move |region: &mut Region| {
        assert_eq!(region.id(), "registrationWizard");
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    controller.attach(&step_one("", ""));
    controller.follow_step(STEP_2).await.unwrap();
    controller.follow_step(STEP_3).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_load_follows_redirect_and_replaces_entry() {
    let fetcher = MockFetcher::new(ORIGIN).route(
        FetchMethod::Get,
        "/register/",
        MockResponse::html(step_one("", "")).redirected_to(REGISTER),
    );
    let h = Harness::new("/register/", fetcher);

    h.controller.load().await.unwrap();
    assert_eq!(h.browser.entries(), vec![url(REGISTER)]);
    assert_eq!(h.controller.navigation().current_url, url(REGISTER));
    assert_eq!(h.step(), Some(1));
    // A full page load is not an AJAX request
    assert_eq!(h.fetcher.requests()[0].header(AJAX_HEADER.0), None);
}

#[tokio::test]
async fn test_service_form_fills_details_region() {
    let fetcher = MockFetcher::new(ORIGIN)
        .route(FetchMethod::Get, STEP_2, MockResponse::html(step_two()))
        .route(
            FetchMethod::Get,
            "/service-form/5/",
            MockResponse::html(r#"<label>Device</label><input name="device">"#),
        )
        .route(FetchMethod::Get, "/service-form/9/", MockResponse::status(404));
    let h = Harness::new(REGISTER, fetcher);
    h.controller.attach(&step_one("", ""));
    h.controller.follow_step(STEP_2).await.unwrap();

    assert!(h.controller.load_service_form("5").await.unwrap());
    assert!(!h.controller.load_service_form("9").await.unwrap());
    assert_eq!(
        h.controller.region().unwrap().details(),
        Some(r#"<label>Device</label><input name="device">"#)
    );
}

#[tokio::test]
async fn test_selecting_service_option_loads_its_form() {
    let fetcher = MockFetcher::new(ORIGIN).route(
        FetchMethod::Get,
        "/service-form/5/",
        MockResponse::html(r#"<input name="device" value="laptop">"#),
    );
    let h = Harness::new(STEP_2, fetcher);
    h.controller.attach(&step_two());

    h.controller.change("service_type", "5", true).await.unwrap();

    let requests = h.fetcher.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, FetchMethod::Get);
    assert_eq!(requests[0].url, url("/service-form/5/"));
    let form = h.controller.form().unwrap();
    assert_eq!(form.value_of("service_type"), Some("5"));
    assert_eq!(form.value_of("device"), Some("laptop"));

    // Unchecking is a plain change
    h.controller.change("service_type", "5", false).await.unwrap();
    assert_eq!(h.fetcher.request_count(), 1);
}
