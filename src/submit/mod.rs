//! Submission pipeline: validation, duplicate check, and the request itself.

mod duplicate;
mod prompt;
mod validate;

pub use duplicate::{check_duplicate, CustomerSummary, DuplicateCheckQuery, DuplicateCheckResult};
pub use prompt::{ConflictPrompt, LogPrompt, RecordingPrompt};
pub use validate::validate_required;

use reqwest::Url;

use crate::markup::Form;
use crate::nav::{FetchRequest, NavOutcome};

/// Submission state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    DuplicateChecking,
    Submitting,
}

/// The control that triggered the submit, if it carries a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    pub name: String,
    pub value: String,
}

impl Submitter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// How a submit event ended
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Required fields were empty; nothing was sent
    Invalid { fields: Vec<String> },
    /// The duplicate check found an existing customer; the submission was dropped
    DuplicateFound(DuplicateCheckResult),
    /// The form was posted and the response handled
    Submitted(NavOutcome),
    /// A newer navigation started before the POST could be sent
    Superseded,
}

/// Everything one POST needs, valid for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAttempt {
    pub fields: Vec<(String, String)>,
    pub submitter: Option<Submitter>,
    pub csrf_token: Option<String>,
}

impl SubmissionAttempt {
    /// Capture a form for submission.
    ///
    /// The submitter's name/value is appended as a field, since an
    /// asynchronous submission does not carry it. The CSRF token comes from
    /// this form, not from the whole page.
    pub fn capture(form: &Form, submitter: Option<Submitter>, csrf_field: &str) -> Self {
        let mut form = form.clone();
        if let Some(submitter) = submitter.as_ref().filter(|s| !s.name.is_empty()) {
            form.append_hidden(submitter.name.clone(), submitter.value.clone());
        }
        Self {
            fields: form.serialize(),
            csrf_token: form.csrf_token(csrf_field).map(str::to_string),
            submitter,
        }
    }

    pub fn into_request(self, url: Url, csrf_header: &str) -> FetchRequest {
        let request = FetchRequest::post(url, self.fields).ajax();
        match self.csrf_token {
            Some(token) => request.with_header(csrf_header, token),
            None => request,
        }
    }
}
