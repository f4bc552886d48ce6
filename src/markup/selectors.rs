//! Compiled CSS selectors shared by the markup parsers.

use std::sync::OnceLock;

use scraper::Selector;

macro_rules! static_selector {
    ($name:ident, $css:expr) => {
        pub(crate) fn $name() -> &'static Selector {
            static SELECTOR: OnceLock<Selector> = OnceLock::new();
            SELECTOR.get_or_init(|| Selector::parse($css).expect("static selector"))
        }
    };
}

static_selector!(field_controls, "input, select, textarea");
static_selector!(options, "option");
static_selector!(selected_option, "option[selected]");
static_selector!(forms, "form");
static_selector!(step_links, "a[data-step-link]");

/// Selector for the element carrying `id`, or `None` if `id` cannot be
/// expressed as a selector.
pub(crate) fn by_id(id: &str) -> Option<Selector> {
    if id.is_empty() || id.contains(['"', '\\']) {
        return None;
    }
    Selector::parse(&format!(r#"[id="{id}"]"#)).ok()
}
