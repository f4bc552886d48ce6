use reqwest::Url;
use scraper::{ElementRef, Html};

use super::form::Form;
use super::selectors::{by_id, forms, step_links};

/// An in-page navigation anchor (`a[data-step-link]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLink {
    pub href: String,
    pub label: String,
    pub target: Option<String>,
}

/// The single swappable container of a wizard page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    id: String,
    html: String,
    form: Option<Form>,
    step_links: Vec<StepLink>,
    details_id: String,
    details: Option<String>,
}

impl Region {
    /// Locate the container `container_id` in a full document or fragment.
    ///
    /// Returns `None` when the markup has no such element. When a template
    /// renders the id more than once, the first occurrence wins.
    pub fn extract(html: &str, container_id: &str, details_id: &str) -> Option<Self> {
        Self::find(&Html::parse_document(html), container_id, details_id)
    }

    fn find(doc: &Html, container_id: &str, details_id: &str) -> Option<Self> {
        let selector = by_id(container_id)?;
        let mut matches = doc.select(&selector);
        let container = matches.next()?;
        if matches.next().is_some() {
            tracing::debug!(container_id, "Container id rendered more than once");
        }
        Some(Self::from_element(container, container_id, details_id))
    }

    fn from_element(container: ElementRef<'_>, container_id: &str, details_id: &str) -> Self {
        let form = container.select(forms()).next().map(|form| Form::from_element(form, Some(details_id)));
        let step_links = container
            .select(step_links())
            .filter_map(|a| {
                let element = a.value();
                Some(StepLink {
                    href: element.attr("href")?.to_string(),
                    label: a.text().collect::<String>().trim().to_string(),
                    target: element.attr("target").map(str::to_string),
                })
            })
            .collect();
        let details = by_id(details_id)
            .and_then(|selector| container.select(&selector).next())
            .map(|el| el.inner_html());

        Self {
            id: container_id.to_string(),
            html: container.html(),
            form,
            step_links,
            details_id: details_id.to_string(),
            details,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Outer markup as fetched
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut Form> {
        self.form.as_mut()
    }

    pub fn step_links(&self) -> &[StepLink] {
        &self.step_links
    }

    /// Contents of the service details region, if this step renders one.
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn details_id(&self) -> &str {
        &self.details_id
    }

    /// Replace the service details contents verbatim.
    ///
    /// Controls in the fragment take the place of the previous details
    /// controls in the live form. Returns false (and changes nothing) when
    /// this step has no details region.
    pub fn set_details(&mut self, html: impl Into<String>) -> bool {
        let Some(details) = self.details.as_mut() else {
            return false;
        };
        *details = html.into();
        if let Some(form) = self.form.as_mut() {
            form.replace_details(Form::fields_from_fragment(details));
        }
        true
    }
}

/// A loaded page: its location plus the container, if it rendered one
#[derive(Debug, Clone)]
pub struct Document {
    pub url: Url,
    pub region: Option<Region>,
}

impl Document {
    pub fn parse(html: &str, url: Url, container_id: &str, details_id: &str) -> Self {
        let doc = Html::parse_document(html);
        Self {
            url,
            region: Region::find(&doc, container_id, details_id),
        }
    }
}
