//! Pre-submission duplicate lookup.

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::error::WizardError;
use crate::markup::Form;
use crate::nav::{FetchRequest, Fetcher};

/// Identity fields sent to the lookup endpoint, all trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCheckQuery {
    pub full_name: String,
    pub phone: String,
    pub customer_type: String,
    pub organization_name: String,
    pub tax_number: String,
}

impl DuplicateCheckQuery {
    /// Build the query from a form; `None` unless both name and phone are
    /// filled in.
    pub fn from_form(form: &Form) -> Option<Self> {
        let read = |name: &str| form.value_of(name).unwrap_or_default().trim().to_string();
        let query = Self {
            full_name: read("full_name"),
            phone: read("phone"),
            customer_type: read("customer_type"),
            organization_name: read("organization_name"),
            tax_number: read("tax_number"),
        };
        if query.full_name.is_empty() || query.phone.is_empty() {
            return None;
        }
        Some(query)
    }

    /// Lookup URL: `path` resolved against `base`, fields as query string
    pub fn to_url(&self, base: &Url, path: &str) -> Result<Url, WizardError> {
        let mut url = base
            .join(path)
            .map_err(|err| WizardError::invalid_url(path, err))?;
        url.query_pairs_mut()
            .clear()
            .append_pair("full_name", &self.full_name)
            .append_pair("phone", &self.phone)
            .append_pair("customer_type", &self.customer_type)
            .append_pair("organization_name", &self.organization_name)
            .append_pair("tax_number", &self.tax_number);
        Ok(url)
    }
}

/// Existing customer as returned by the lookup
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomerSummary {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub customer_type: Option<String>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub tax_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub total_visits: Option<Value>,
    #[serde(default)]
    pub address: Option<String>,
    /// "Create order for existing customer" action
    #[serde(default)]
    pub create_order_url: Option<String>,
    /// "View existing customer" action
    #[serde(default)]
    pub detail_url: Option<String>,
}

fn or_dash(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

impl CustomerSummary {
    /// Labelled rows for the conflict prompt.
    ///
    /// Identity fields render empty when missing; optional details render `-`.
    pub fn display_rows(&self) -> Vec<(&'static str, String)> {
        let visits = match &self.total_visits {
            Some(Value::Null) | None => "-".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        vec![
            ("Name", self.full_name.clone().unwrap_or_default()),
            ("Code", self.code.clone().unwrap_or_default()),
            ("Phone", self.phone.clone().unwrap_or_default()),
            (
                "Type",
                self.customer_type
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "personal".to_string()),
            ),
            ("Organization", or_dash(&self.organization_name)),
            ("Tax number", or_dash(&self.tax_number)),
            ("Email", or_dash(&self.email)),
            ("Visits", visits),
            ("Address", or_dash(&self.address)),
        ]
    }
}

/// Lookup response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DuplicateCheckResult {
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub customer: Option<CustomerSummary>,
}

/// Run the lookup.
///
/// Returns `None` whenever no verdict could be obtained (transport failure,
/// non-2xx, unparseable body); callers treat that as "no duplicate".
pub async fn check_duplicate(fetcher: &dyn Fetcher, url: Url) -> Option<DuplicateCheckResult> {
    let request = FetchRequest::get(url).with_header("Accept", "application/json");
    let response = match fetcher.send(request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, "Duplicate check failed, continuing");
            return None;
        }
    };

    if !response.is_success() {
        tracing::warn!(status = response.status, "Duplicate check rejected, continuing");
        return None;
    }

    match serde_json::from_str::<DuplicateCheckResult>(&response.body) {
        Ok(result) => Some(result),
        Err(err) => {
            tracing::warn!(error = %err, "Unreadable duplicate check response, continuing");
            None
        }
    }
}
