//! Page-level controller tying navigation, persistence and submission together.
//!
//! One controller is constructed per page load and owns the live document,
//! the navigation state and the in-memory field snapshot. Every navigation
//! and submission takes an [`OperationToken`]; only the most recent token may
//! commit a region swap or touch history, so a slow response can never
//! overwrite a newer one.

use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Url;

use crate::config::Config;
use crate::error::WizardError;
use crate::markup::{Document, Form, Region};
use crate::nav::{
    apply_history, Browser, FetchRequest, FetchResponse, Fetcher, HistoryMode, NavOutcome,
    OperationToken, OperationTokens, ScrollTarget, SwapDecision,
};
use crate::persist::{FormSnapshot, MemoryStorage, PersistenceStore, SnapshotStorage};
use crate::rebind::{NoopRebind, RebindHook};
use crate::submit::{
    check_duplicate, validate_required, ConflictPrompt, DuplicateCheckQuery, LogPrompt,
    SubmissionAttempt, SubmissionState, SubmitOutcome, Submitter,
};

/// Where the page is and which container swaps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub current_url: Url,
    pub container_id: String,
}

/// Modifier keys held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub meta: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.meta || self.ctrl || self.shift || self.alt
    }
}

/// A click on a step link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkClick {
    pub href: String,
    pub target: Option<String>,
    pub modifiers: Modifiers,
}

impl LinkClick {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            target: None,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether the browser should handle this click itself
    fn is_default_action(&self) -> bool {
        self.target.as_deref() == Some("_blank") || self.modifiers.any()
    }
}

struct PageState {
    document: Option<Document>,
    nav: NavigationState,
    snapshot: FormSnapshot,
    submission: SubmissionState,
    /// Bumped on every committed swap or page load
    generation: u64,
}

pub struct WizardController {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    browser: Arc<dyn Browser>,
    store: PersistenceStore,
    rebind: Arc<dyn RebindHook>,
    prompt: Arc<dyn ConflictPrompt>,
    tokens: OperationTokens,
    /// The latest submission owns the submission state slot
    submissions: OperationTokens,
    page: Mutex<PageState>,
}

impl WizardController {
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>, browser: Arc<dyn Browser>) -> Self {
        let nav = NavigationState {
            current_url: browser.current_url(),
            container_id: config.container_id.clone(),
        };
        let store = PersistenceStore::new(Arc::new(MemoryStorage::new()), &config.storage_key);
        Self {
            config,
            fetcher,
            browser,
            store,
            rebind: Arc::new(NoopRebind),
            prompt: Arc::new(LogPrompt),
            tokens: OperationTokens::new(),
            submissions: OperationTokens::new(),
            page: Mutex::new(PageState {
                document: None,
                nav,
                snapshot: FormSnapshot::default(),
                submission: SubmissionState::Idle,
                generation: 0,
            }),
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn SnapshotStorage>) -> Self {
        self.store = PersistenceStore::new(storage, &self.config.storage_key);
        self
    }

    pub fn with_rebind(mut self, rebind: Arc<dyn RebindHook>) -> Self {
        self.rebind = rebind;
        self
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn ConflictPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &PersistenceStore {
        &self.store
    }

    pub fn navigation(&self) -> NavigationState {
        self.page.lock().nav.clone()
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.page.lock().submission
    }

    /// Copy of the live container, if one is attached
    pub fn region(&self) -> Option<Region> {
        self.page
            .lock()
            .document
            .as_ref()
            .and_then(|doc| doc.region.clone())
    }

    /// Copy of the live form, if one is attached
    pub fn form(&self) -> Option<Form> {
        self.region().and_then(|region| region.form().cloned())
    }

    /// In-memory snapshot as last captured or loaded
    pub fn snapshot(&self) -> FormSnapshot {
        self.page.lock().snapshot.clone()
    }

    /// Resolve `href` against the current location
    pub fn resolve(&self, href: &str) -> Result<Url, WizardError> {
        self.page
            .lock()
            .nav
            .current_url
            .join(href)
            .map_err(|err| WizardError::invalid_url(href, err))
    }

    /// Attach to markup already rendered for the current location.
    pub fn attach(&self, html: &str) {
        let url = self.browser.current_url();
        let mut document = Document::parse(
            html,
            url.clone(),
            &self.config.container_id,
            &self.config.service_details_id,
        );

        let mut page = self.page.lock();
        if let Some(region) = document.region.as_mut() {
            self.initialize_region(region, &mut page.snapshot);
        } else {
            tracing::debug!(url = %url, "Page has no registration container");
        }
        page.document = Some(document);
        page.nav.current_url = url;
        page.generation += 1;
    }

    /// Full load of the current location, as on first page view.
    ///
    /// Redirects are reflected by replacing the current history entry.
    pub async fn load(&self) -> Result<(), WizardError> {
        let requested = self.browser.current_url();
        let response = self.fetcher.send(FetchRequest::get(requested.clone())).await?;
        if response.url != requested {
            if let Err(err) = self.browser.replace_state(&response.url) {
                tracing::warn!(error = %err, "Could not record redirected location");
            }
        }
        self.attach(&response.body);
        Ok(())
    }

    /// Handle a click on a step link.
    pub async fn follow_link(&self, click: LinkClick) -> Result<NavOutcome, WizardError> {
        if click.is_default_action() {
            tracing::debug!(href = %click.href, "Leaving click to the browser");
            return Ok(NavOutcome::Ignored);
        }
        let url = self.resolve(&click.href)?;
        self.navigate(url, HistoryMode::Push).await
    }

    /// Plain click on a step link
    pub async fn follow_step(&self, href: &str) -> Result<NavOutcome, WizardError> {
        self.follow_link(LinkClick::new(href)).await
    }

    /// Back/forward: re-fetch the location the browser moved to.
    pub async fn pop_state(&self) -> Result<NavOutcome, WizardError> {
        let url = self.browser.current_url();
        self.navigate(url, HistoryMode::PassThrough).await
    }

    /// Re-fetch the current location without adding a history entry.
    pub async fn reload(&self) -> Result<NavOutcome, WizardError> {
        let url = self.navigation().current_url;
        self.navigate(url, HistoryMode::Replace).await
    }

    async fn navigate(&self, url: Url, mode: HistoryMode) -> Result<NavOutcome, WizardError> {
        let token = self.tokens.issue();
        tracing::debug!(token = %token, url = %url, ?mode, "Navigating");
        let response = self.fetcher.send(FetchRequest::get(url).ajax()).await?;
        Ok(self.finish(token, &response, mode))
    }

    fn finish(
        &self,
        token: OperationToken,
        response: &FetchResponse,
        mode: HistoryMode,
    ) -> NavOutcome {
        let decision = SwapDecision::from_response(&self.config, response);
        self.commit(token, decision, mode)
    }

    /// Apply a decision if `token` is still the latest operation.
    fn commit(
        &self,
        token: OperationToken,
        decision: SwapDecision,
        mode: HistoryMode,
    ) -> NavOutcome {
        let mut page = self.page.lock();
        if !self.tokens.is_current(token) {
            tracing::debug!(token = %token, "Discarding stale response");
            return NavOutcome::Superseded;
        }

        let (mut region, url) = match decision {
            SwapDecision::HardNavigate { url } => return self.hard_navigate(&mut page, url),
            SwapDecision::Swap { region, url } => (region, url),
        };

        let has_live_container = page
            .document
            .as_ref()
            .is_some_and(|doc| doc.region.is_some());
        if !has_live_container {
            tracing::debug!(url = %url, "No live container to swap into");
            return self.hard_navigate(&mut page, url);
        }

        if let Err(err) = apply_history(self.browser.as_ref(), mode, &url) {
            tracing::warn!(url = %url, error = %err, "History update failed, reloading page");
            return self.hard_navigate(&mut page, url);
        }

        self.initialize_region(&mut region, &mut page.snapshot);
        let region_id = region.id().to_string();
        if let Some(doc) = page.document.as_mut() {
            doc.region = Some(region);
            doc.url = url.clone();
        }
        page.nav.current_url = url.clone();
        page.generation += 1;
        self.browser.scroll_into_view(ScrollTarget::RegionStart(region_id));

        tracing::debug!(token = %token, url = %url, ?mode, "Region swapped");
        NavOutcome::Swapped { url, history: mode }
    }

    fn hard_navigate(&self, page: &mut PageState, url: Url) -> NavOutcome {
        self.browser.assign(&url);
        page.document = None;
        page.nav.current_url = url.clone();
        page.generation += 1;
        NavOutcome::HardNavigated { url }
    }

    /// Restore saved values into a fresh region, then re-arm its behaviors.
    fn initialize_region(&self, region: &mut Region, snapshot: &mut FormSnapshot) {
        *snapshot = self.store.load();
        if let Some(form) = region.form_mut() {
            let applied = snapshot.apply(form);
            if applied > 0 {
                tracing::debug!(applied, "Restored saved form data");
            }
        }
        self.rebind.rebind(region);
    }

    fn with_live_form<T>(
        &self,
        f: impl FnOnce(&mut Form, &mut FormSnapshot) -> Result<T, WizardError>,
    ) -> Result<T, WizardError> {
        let mut page = self.page.lock();
        let page = &mut *page;
        let region = page
            .document
            .as_mut()
            .and_then(|doc| doc.region.as_mut())
            .ok_or(WizardError::NoDocument)?;
        let region_id = region.id().to_string();
        let form = region.form_mut().ok_or(WizardError::NoForm(region_id))?;
        f(form, &mut page.snapshot)
    }

    /// Input event: update a field and persist the whole form.
    pub fn input(&self, name: &str, value: &str) -> Result<(), WizardError> {
        let value = if name == self.config.phone_field {
            normalize_phone(value, self.config.phone_max_digits)
        } else {
            value.to_string()
        };
        self.with_live_form(|form, snapshot| {
            if !form.set_value(name, &value) {
                return Err(WizardError::UnknownField(name.to_string()));
            }
            snapshot.capture(form);
            self.store.save(snapshot);
            Ok(())
        })
    }

    /// Change event on a checkbox or radio.
    pub fn set_checked(&self, name: &str, value: &str, checked: bool) -> Result<(), WizardError> {
        self.with_live_form(|form, snapshot| {
            if !form.set_checked(name, value, checked) {
                return Err(WizardError::UnknownField(format!("{name}={value}")));
            }
            snapshot.capture(form);
            self.store.save(snapshot);
            Ok(())
        })
    }

    /// Change event that may have side effects beyond the form.
    ///
    /// Checking a member of the service selector loads that option's
    /// sub-form; a failed load is logged and does not undo the change.
    pub async fn change(&self, name: &str, value: &str, checked: bool) -> Result<(), WizardError> {
        self.set_checked(name, value, checked)?;
        if checked && name == self.config.service_field {
            self.load_service_form(value).await?;
        }
        Ok(())
    }

    /// Fetch the sub-form for a service option into the details region.
    ///
    /// The fragment's controls join the live form and saved values are
    /// restored into them. Failures are logged and leave the region
    /// unchanged. Returns whether the fragment was inserted.
    pub async fn load_service_form(&self, option_id: &str) -> Result<bool, WizardError> {
        let url = self.resolve(&self.config.service_form_url_path(option_id))?;
        let generation = self.page.lock().generation;

        let response = match self.fetcher.send(FetchRequest::get(url.clone())).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::error!(url = %url, status = response.status, "Error loading service form");
                return Ok(false);
            }
            Err(err) => {
                tracing::error!(url = %url, error = %err, "Error loading service form");
                return Ok(false);
            }
        };

        let mut page = self.page.lock();
        if page.generation != generation {
            tracing::debug!(url = %url, "Region changed while loading service form");
            return Ok(false);
        }
        let page = &mut *page;
        let Some(region) = page.document.as_mut().and_then(|doc| doc.region.as_mut()) else {
            return Ok(false);
        };
        if !region.set_details(response.body) {
            return Ok(false);
        }
        if let Some(form) = region.form_mut() {
            let applied = page.snapshot.apply(form);
            if applied > 0 {
                tracing::debug!(applied, "Restored saved service details");
            }
        }
        Ok(true)
    }

    /// Record a submission phase unless a newer submission has started.
    fn set_submission(&self, ticket: OperationToken, state: SubmissionState) {
        let mut page = self.page.lock();
        if !self.submissions.is_current(ticket) {
            tracing::debug!(ticket = %ticket, ?state, "Ignoring state of an older submission");
            return;
        }
        if page.submission != state {
            tracing::debug!(from = ?page.submission, to = ?state, "Submission state");
            page.submission = state;
        }
    }

    /// Submit event.
    ///
    /// Validates required fields, runs the duplicate check on the first step,
    /// then posts the form to the current location and handles the response
    /// like a navigation (replacing the current history entry). The saved
    /// snapshot is cleared once the server has answered.
    pub async fn submit(&self, submitter: Option<Submitter>) -> Result<SubmitOutcome, WizardError> {
        let ticket = self.submissions.issue();
        self.set_submission(ticket, SubmissionState::Validating);
        let first_step = self.config.first_step;
        let step_field = self.config.step_field.clone();
        let validated = self.with_live_form(|form, _| {
            let invalid = validate_required(form);
            let query = if form.step(&step_field) == Some(first_step) {
                DuplicateCheckQuery::from_form(form)
            } else {
                None
            };
            Ok((invalid, query))
        });
        let (invalid, query) = match validated {
            Ok(validated) => validated,
            Err(err) => {
                self.set_submission(ticket, SubmissionState::Idle);
                return Err(err);
            }
        };

        if let Some(first) = invalid.first() {
            self.browser
                .scroll_into_view(ScrollTarget::FieldCenter(first.clone()));
            self.set_submission(ticket, SubmissionState::Idle);
            return Ok(SubmitOutcome::Invalid { fields: invalid });
        }

        let token = self.tokens.issue();
        let current_url = self.navigation().current_url;

        if let Some(query) = query {
            self.set_submission(ticket, SubmissionState::DuplicateChecking);
            let lookup = match query.to_url(&current_url, &self.config.duplicate_check_path) {
                Ok(url) => url,
                Err(err) => {
                    self.set_submission(ticket, SubmissionState::Idle);
                    return Err(err);
                }
            };
            if let Some(result) = check_duplicate(self.fetcher.as_ref(), lookup).await {
                if result.exists {
                    tracing::info!(token = %token, "Duplicate customer, submission dropped");
                    self.prompt.show(&result);
                    self.set_submission(ticket, SubmissionState::Idle);
                    return Ok(SubmitOutcome::DuplicateFound(result));
                }
            }
        }

        if !self.tokens.is_current(token) {
            tracing::debug!(token = %token, "Submission superseded before sending");
            self.set_submission(ticket, SubmissionState::Idle);
            return Ok(SubmitOutcome::Superseded);
        }

        self.set_submission(ticket, SubmissionState::Submitting);
        let csrf_field = self.config.csrf_field.clone();
        let attempt = self.with_live_form(|form, _| {
            Ok(SubmissionAttempt::capture(form, submitter, &csrf_field))
        });
        let attempt = match attempt {
            Ok(attempt) => attempt,
            Err(err) => {
                self.set_submission(ticket, SubmissionState::Idle);
                return Err(err);
            }
        };
        if attempt.csrf_token.is_none() {
            tracing::warn!("Submitting without a CSRF token");
        }

        let request = attempt.into_request(current_url, &self.config.csrf_header);
        let response = match self.fetcher.send(request).await {
            Ok(response) => response,
            Err(err) => {
                self.set_submission(ticket, SubmissionState::Idle);
                return Err(err.into());
            }
        };

        self.store.clear();
        self.page.lock().snapshot.clear();

        let outcome = self.finish(token, &response, HistoryMode::Replace);
        self.set_submission(ticket, SubmissionState::Idle);
        tracing::info!(token = %token, status = response.status, ?outcome, "Form submitted");
        Ok(SubmitOutcome::Submitted(outcome))
    }
}

/// Keep digits only, at most `max_digits` of them.
pub fn normalize_phone(value: &str, max_digits: usize) -> String {
    value
        .chars()
        .filter(char::is_ascii_digit)
        .take(max_digits)
        .collect()
}
