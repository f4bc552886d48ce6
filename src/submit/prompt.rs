use parking_lot::Mutex;

use super::duplicate::DuplicateCheckResult;

/// Surfaces a found duplicate and its two follow-up actions
/// (create an order for the existing customer, or view it).
pub trait ConflictPrompt: Send + Sync {
    fn show(&self, result: &DuplicateCheckResult);
}

/// Writes the conflict to the log
#[derive(Debug, Default)]
pub struct LogPrompt;

impl ConflictPrompt for LogPrompt {
    fn show(&self, result: &DuplicateCheckResult) {
        let Some(customer) = &result.customer else {
            tracing::info!("Existing customer found (no details returned)");
            return;
        };
        let rows = customer
            .display_rows()
            .into_iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        tracing::info!(
            create_order_url = customer.create_order_url.as_deref().unwrap_or("-"),
            detail_url = customer.detail_url.as_deref().unwrap_or("-"),
            "Existing customer found: {}",
            rows
        );
    }
}

/// Keeps every prompted result, for tests and the CLI
#[derive(Debug, Default)]
pub struct RecordingPrompt {
    shown: Mutex<Vec<DuplicateCheckResult>>,
}

impl RecordingPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<DuplicateCheckResult> {
        self.shown.lock().clone()
    }
}

impl ConflictPrompt for RecordingPrompt {
    fn show(&self, result: &DuplicateCheckResult) {
        self.shown.lock().push(result.clone());
    }
}
