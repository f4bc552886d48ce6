use reqwest::Url;

use crate::config::Config;
use crate::markup::Region;
use crate::nav::fetch::FetchResponse;
use crate::nav::history::HistoryMode;

/// What to do with a fetched response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapDecision {
    /// Replace the live container with `region` and record `url`
    Swap { region: Region, url: Url },
    /// Abandon the partial update and load `url` as a full page
    HardNavigate { url: Url },
}

impl SwapDecision {
    /// Classify a response by its resolved URL and markup.
    ///
    /// A resolved URL outside the flow always wins over the markup: the
    /// server redirected away (e.g. to the created customer's page). Markup
    /// without the container falls back to a full load as well.
    pub fn from_response(config: &Config, response: &FetchResponse) -> Self {
        let url = response.url.clone();
        if !config.is_flow_url(url.as_str()) {
            tracing::debug!(url = %url, "Response left the registration flow");
            return SwapDecision::HardNavigate { url };
        }

        match Region::extract(
            &response.body,
            &config.container_id,
            &config.service_details_id,
        ) {
            Some(region) => SwapDecision::Swap { region, url },
            None => {
                tracing::debug!(
                    url = %url,
                    container_id = %config.container_id,
                    "Response has no container"
                );
                SwapDecision::HardNavigate { url }
            }
        }
    }
}

/// Result of a navigation, reload, back/forward or submission response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// The container was replaced in place
    Swapped { url: Url, history: HistoryMode },
    /// A full page load was performed instead
    HardNavigated { url: Url },
    /// A newer operation started first; this result was dropped
    Superseded,
    /// The browser's default handling applies (new tab, modifier click)
    Ignored,
}
