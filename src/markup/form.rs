//! Form model parsed out of server-rendered markup.
//!
//! Mirrors what a browser exposes for a `<form>`: named controls with their
//! current value, checkedness and `required` flag, plus the serialization a
//! native submission would produce.

use std::ops::Range;

use scraper::{ElementRef, Html};

use super::selectors::{field_controls, options, selected_option};

/// Class the server template (and client validation) use to flag a field.
pub const INVALID_CLASS: &str = "is-invalid";

/// Kind of form control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Hidden,
    Checkbox,
    Radio,
    Select,
    TextArea,
}

impl FieldKind {
    /// Map an `<input type>` to a field kind.
    ///
    /// Buttons and file pickers never contribute a text value and are skipped.
    fn from_input_type(input_type: &str) -> Option<Self> {
        match input_type.to_ascii_lowercase().as_str() {
            "submit" | "button" | "reset" | "image" | "file" => None,
            "hidden" => Some(FieldKind::Hidden),
            "checkbox" => Some(FieldKind::Checkbox),
            "radio" => Some(FieldKind::Radio),
            _ => Some(FieldKind::Text),
        }
    }

    pub fn is_checkable(&self) -> bool {
        matches!(self, FieldKind::Checkbox | FieldKind::Radio)
    }
}

/// A single named control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub id: Option<String>,
    pub kind: FieldKind,
    /// Current value; for checkboxes and radios this is the `value` attribute
    pub value: String,
    pub checked: bool,
    pub required: bool,
    pub disabled: bool,
    /// Visual invalid marker
    pub invalid: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            kind,
            value: value.into(),
            checked: false,
            required: false,
            disabled: false,
            invalid: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    fn from_element(el: ElementRef<'_>) -> Option<Self> {
        let element = el.value();
        let name = element.attr("name")?.to_string();
        if name.is_empty() {
            return None;
        }

        let (kind, value, checked) = match element.name() {
            "input" => {
                let kind = FieldKind::from_input_type(element.attr("type").unwrap_or("text"))?;
                let value = match (kind.is_checkable(), element.attr("value")) {
                    (_, Some(value)) => value.to_string(),
                    (true, None) => "on".to_string(),
                    (false, None) => String::new(),
                };
                (kind, value, element.attr("checked").is_some())
            }
            "select" => (FieldKind::Select, select_value(el), false),
            "textarea" => (FieldKind::TextArea, el.text().collect::<String>(), false),
            _ => return None,
        };

        Some(Self {
            name,
            id: element.attr("id").map(str::to_string),
            kind,
            value,
            checked,
            required: element.attr("required").is_some(),
            disabled: element.attr("disabled").is_some(),
            invalid: element.classes().any(|class| class == INVALID_CLASS),
        })
    }
}

fn option_value(option: ElementRef<'_>) -> String {
    option
        .value()
        .attr("value")
        .map(str::to_string)
        .unwrap_or_else(|| option.text().collect::<String>().trim().to_string())
}

/// A `<select>` reports its selected option, or the first one if none is marked.
fn select_value(select: ElementRef<'_>) -> String {
    select
        .select(selected_option())
        .next()
        .or_else(|| select.select(options()).next())
        .map(option_value)
        .unwrap_or_default()
}

/// Named controls of one `<form>`, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: Vec<Field>,
    /// Fields rendered inside the details element nested in this form
    details: Option<Range<usize>>,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            details: None,
        }
    }

    /// Parse the controls of `form`, remembering which of them sit inside
    /// the element with id `details_id`.
    pub(crate) fn from_element(form: ElementRef<'_>, details_id: Option<&str>) -> Self {
        let mut fields = Vec::new();
        let mut details: Option<(ElementRef<'_>, Range<usize>)> = None;

        for el in form.descendants().filter_map(ElementRef::wrap) {
            if details.is_none() && details_id.is_some() && el.value().id() == details_id {
                details = Some((el, fields.len()..fields.len()));
                continue;
            }
            if !field_controls().matches(&el) {
                continue;
            }
            let Some(field) = Field::from_element(el) else {
                continue;
            };
            if let Some((root, span)) = details.as_mut() {
                if span.end == fields.len() && el.ancestors().any(|node| node.id() == root.id()) {
                    span.end += 1;
                }
            }
            fields.push(field);
        }

        Self {
            fields,
            details: details.map(|(_, span)| span),
        }
    }

    /// Controls found in an HTML fragment, in document order
    pub fn fields_from_fragment(html: &str) -> Vec<Field> {
        Html::parse_fragment(html)
            .root_element()
            .select(field_controls())
            .filter_map(Field::from_element)
            .collect()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Effective value of a named control.
    ///
    /// Checkable groups report the checked member's value, or `None` when
    /// nothing in the group is checked.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        let first = self.field(name)?;
        if first.kind.is_checkable() {
            self.fields
                .iter()
                .find(|f| f.name == name && f.checked)
                .map(|f| f.value.as_str())
        } else {
            Some(first.value.as_str())
        }
    }

    /// Set a value the way typing or picking would.
    ///
    /// For checkable groups the member whose value matches becomes checked;
    /// radios uncheck their siblings. Returns false when no control has `name`.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        let mut matched = false;
        for field in self.fields.iter_mut().filter(|f| f.name == name) {
            matched = true;
            match field.kind {
                FieldKind::Radio => field.checked = field.value == value,
                FieldKind::Checkbox => {
                    if field.value == value {
                        field.checked = true;
                    }
                }
                _ => field.value = value.to_string(),
            }
        }
        matched
    }

    /// Toggle one checkable member identified by its value.
    pub fn set_checked(&mut self, name: &str, value: &str, checked: bool) -> bool {
        let mut matched = false;
        for field in self.fields.iter_mut().filter(|f| f.name == name) {
            if field.value == value {
                matched = true;
                field.checked = checked;
            } else if checked && field.kind == FieldKind::Radio {
                field.checked = false;
            }
        }
        matched
    }

    /// Fields currently rendered inside the details element
    pub fn details_fields(&self) -> &[Field] {
        self.details
            .clone()
            .map_or(&[][..], |span| &self.fields[span])
    }

    /// Swap the details element's fields for `fields`, keeping their
    /// position in the form.
    ///
    /// Returns false (and changes nothing) when the details element is not
    /// part of this form.
    pub fn replace_details(&mut self, fields: Vec<Field>) -> bool {
        let Some(span) = self.details.clone() else {
            return false;
        };
        let start = span.start;
        let count = fields.len();
        self.fields.splice(span, fields);
        self.details = Some(start..start + count);
        true
    }

    /// Append a hidden control (e.g. the submitter's name/value).
    pub fn append_hidden(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field::new(name, FieldKind::Hidden, value));
    }

    /// Name/value pairs a native submission of this form would send.
    ///
    /// Disabled controls are skipped, unchecked checkboxes and radios
    /// contribute nothing.
    pub fn serialize(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter(|f| !f.disabled)
            .filter(|f| !f.kind.is_checkable() || f.checked)
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    /// Current wizard step, read from the hidden step field.
    pub fn step(&self, step_field: &str) -> Option<u32> {
        self.value_of(step_field)?.trim().parse().ok()
    }

    /// CSRF token carried by this form's hidden field.
    pub fn csrf_token(&self, csrf_field: &str) -> Option<&str> {
        self.value_of(csrf_field).filter(|token| !token.is_empty())
    }

    /// Names of fields currently carrying the invalid marker, in order.
    pub fn invalid_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.invalid)
            .map(|f| f.name.as_str())
            .collect()
    }
}
