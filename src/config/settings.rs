use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::WizardError;
use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Synchronizer configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin used to resolve relative paths given on the command line
    pub base_url: String,
    /// Id of the single swappable container rendered by the server
    pub container_id: String,
    /// Resolved URLs matching this pattern stay inside the registration flow
    pub flow_pattern: Regex,
    /// Storage namespace holding the JSON field snapshot
    pub storage_key: String,
    /// Hidden field carrying the CSRF token
    pub csrf_field: String,
    /// Request header the CSRF token is sent in
    pub csrf_header: String,
    /// Hidden field carrying the current wizard step number
    pub step_field: String,
    /// Step on which the duplicate check runs
    pub first_step: u32,
    /// Duplicate lookup endpoint
    pub duplicate_check_path: String,
    /// Per-option sub-form endpoint; `{id}` is replaced by the option id
    pub service_form_path: String,
    /// Radio group whose selection loads a service sub-form
    pub service_field: String,
    /// Id of the region receiving sub-form fragments
    pub service_details_id: String,
    /// Field normalized to digits on input
    pub phone_field: String,
    /// Maximum digits kept in the phone field
    pub phone_max_digits: usize,
    /// Per-request timeout for the HTTP fetcher
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            container_id: "registrationWizard".to_string(),
            flow_pattern: default_flow_pattern(),
            storage_key: "customerRegistrationData".to_string(),
            csrf_field: "csrfmiddlewaretoken".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
            step_field: "step".to_string(),
            first_step: 1,
            duplicate_check_path: "/api/customers/check-duplicate/".to_string(),
            service_form_path: "/service-form/{id}/".to_string(),
            service_field: "service_type".to_string(),
            service_details_id: "service-details".to_string(),
            phone_field: "phone".to_string(),
            phone_max_digits: 13,
            request_timeout: Duration::from_secs(30),
        }
    }
}

fn default_flow_pattern() -> Regex {
    Regex::new("customer_register").expect("valid flow pattern")
}

/// TOML representation of the `[endpoints]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlEndpoints {
    pub duplicate_check: Option<String>,
    pub service_form: Option<String>,
}

/// TOML representation of the `[page]` table (server template contract)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlPage {
    pub container_id: Option<String>,
    pub flow_pattern: Option<String>,
    pub csrf_field: Option<String>,
    pub csrf_header: Option<String>,
    pub step_field: Option<String>,
    pub first_step: Option<u32>,
    pub service_field: Option<String>,
    pub service_details_id: Option<String>,
    pub phone_field: Option<String>,
    pub phone_max_digits: Option<usize>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub base_url: Option<String>,
    pub storage_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub page: Option<TomlPage>,
    pub endpoints: Option<TomlEndpoints>,
}

impl Config {
    /// Load the user config file, falling back to defaults when it is missing
    /// or malformed.
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        match Self::load_from(&config_file) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    path = %config_file.display(),
                    error = %err,
                    "Ignoring unreadable config, using defaults"
                );
                Config::default()
            }
        }
    }

    /// Load a specific config file on top of the defaults.
    pub fn load_from(path: &Path) -> Result<Self, WizardError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|err| WizardError::Config(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Overlay a TOML document on the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, WizardError> {
        let toml_config: TomlConfig =
            toml::from_str(contents).map_err(|err| WizardError::Config(err.to_string()))?;
        let mut config = Config::default();
        config.apply(toml_config)?;
        Ok(config)
    }

    fn apply(&mut self, toml_config: TomlConfig) -> Result<(), WizardError> {
        if let Some(base_url) = toml_config.base_url {
            self.base_url = base_url;
        }
        if let Some(key) = toml_config.storage_key {
            self.storage_key = key;
        }
        if let Some(secs) = toml_config.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }

        if let Some(page) = toml_config.page {
            if let Some(id) = page.container_id {
                self.container_id = id;
            }
            if let Some(pattern) = page.flow_pattern {
                self.flow_pattern = Regex::new(&pattern)
                    .map_err(|err| WizardError::Config(format!("flow_pattern: {err}")))?;
            }
            if let Some(field) = page.csrf_field {
                self.csrf_field = field;
            }
            if let Some(header) = page.csrf_header {
                self.csrf_header = header;
            }
            if let Some(field) = page.step_field {
                self.step_field = field;
            }
            if let Some(step) = page.first_step {
                self.first_step = step;
            }
            if let Some(field) = page.service_field {
                self.service_field = field;
            }
            if let Some(id) = page.service_details_id {
                self.service_details_id = id;
            }
            if let Some(field) = page.phone_field {
                self.phone_field = field;
            }
            if let Some(max) = page.phone_max_digits {
                self.phone_max_digits = max;
            }
        }

        if let Some(endpoints) = toml_config.endpoints {
            if let Some(path) = endpoints.duplicate_check {
                self.duplicate_check_path = path;
            }
            if let Some(path) = endpoints.service_form {
                self.service_form_path = path;
            }
        }

        Ok(())
    }

    /// Write the example config file (best effort)
    fn create_default_config(path: &PathBuf) {
        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        if let Err(err) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::debug!(path = %path.display(), error = %err, "Failed to write example config");
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Whether a resolved response URL still belongs to the registration flow
    pub fn is_flow_url(&self, url: &str) -> bool {
        self.flow_pattern.is_match(url)
    }

    /// Sub-form endpoint for a given service option
    pub fn service_form_url_path(&self, option_id: &str) -> String {
        self.service_form_path.replace("{id}", option_id)
    }
}
