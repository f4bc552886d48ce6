//! Shared test utilities for regflow
//!
//! This module provides common helpers for integration tests:
//! - Wizard page fixtures shaped like the server templates
//! - A harness wiring the controller to a mock fetcher, headless browser and
//!   in-memory storage

#![allow(dead_code)]

use std::sync::Arc;

use regflow::nav::mock::MockFetcher;
use regflow::{
    Config, HeadlessBrowser, MemoryStorage, RecordingPrompt, SnapshotStorage, WizardController,
};
use reqwest::Url;

pub const ORIGIN: &str = "http://shop.test";
pub const REGISTER: &str = "/customer_register/";
pub const STEP_2: &str = "/customer_register/?step=2";
pub const STEP_3: &str = "/customer_register/?step=3";
pub const DUPLICATE_CHECK: &str = "/api/customers/check-duplicate/";
pub const STORAGE_KEY: &str = "customerRegistrationData";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// A wizard page with the container, CSRF and step hidden fields around `body`.
pub fn wizard_page(step: u32, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html><head><title>Register customer</title></head><body>
<header><a href="/">Home</a></header>
<div id="registrationWizard">
    <h2>Step {step}</h2>
    <form method="post" novalidate>
        <input type="hidden" name="csrfmiddlewaretoken" value="tok-{step}">
        <input type="hidden" name="step" value="{step}">
        {body}
        <button type="submit" name="action" value="next">Next</button>
    </form>
</div>
</body></html>"#
    )
}

/// Identity step: name and phone required, a type select and a newsletter box.
pub fn step_one(full_name: &str, phone: &str) -> String {
    wizard_page(
        1,
        &format!(
            r#"<input type="text" name="full_name" value="{full_name}" required>
        <input type="tel" name="phone" value="{phone}" required>
        <select name="customer_type">
            <option value="personal" selected>Personal</option>
            <option value="company">Company</option>
        </select>
        <input type="text" name="organization_name" value="">
        <input type="checkbox" name="newsletter" value="yes">
        <a data-step-link href="{STEP_2}">Continue</a>"#
        ),
    )
}

/// Intent step: radio choices plus the service details region.
pub fn step_two() -> String {
    wizard_page(
        2,
        &format!(
            r#"<input type="radio" name="intent" value="buy" required>
        <input type="radio" name="intent" value="service" required>
        <input type="radio" name="service_type" value="5">
        <input type="radio" name="service_type" value="9">
        <div id="service-details"></div>
        <a data-step-link href="{REGISTER}">Back</a>
        <a data-step-link href="{STEP_3}">Continue</a>"#
        ),
    )
}

pub fn step_three() -> String {
    wizard_page(3, r#"<textarea name="notes"></textarea>"#)
}

/// Controller plus every test double it talks to
pub struct Harness {
    pub fetcher: MockFetcher,
    pub browser: Arc<HeadlessBrowser>,
    pub storage: Arc<MemoryStorage>,
    pub prompt: Arc<RecordingPrompt>,
    pub controller: WizardController,
}

impl Harness {
    pub fn new(start: &str, fetcher: MockFetcher) -> Self {
        Self::with_storage(start, fetcher, Arc::new(MemoryStorage::new()))
    }

    pub fn with_storage(start: &str, fetcher: MockFetcher, storage: Arc<MemoryStorage>) -> Self {
        let browser = Arc::new(HeadlessBrowser::new(url(start)));
        let prompt = Arc::new(RecordingPrompt::new());
        let controller =
            WizardController::new(Config::default(), Arc::new(fetcher.clone()), browser.clone())
                .with_storage(storage.clone())
                .with_prompt(prompt.clone());
        Self {
            fetcher,
            browser,
            storage,
            prompt,
            controller,
        }
    }

    /// Raw stored snapshot, bypassing the controller
    pub fn stored(&self) -> Option<String> {
        self.storage.get(STORAGE_KEY).unwrap()
    }

    pub fn step(&self) -> Option<u32> {
        self.controller.form().and_then(|form| form.step("step"))
    }
}
