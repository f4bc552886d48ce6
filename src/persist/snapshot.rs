use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::markup::{FieldKind, Form};

/// Persisted value of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Checkbox with nothing checked
    Bool(bool),
    Text(String),
}

impl FieldValue {
    /// Whether a checkable control with `control_value` should be checked
    fn checks(&self, control_value: &str) -> bool {
        match self {
            FieldValue::Bool(checked) => *checked,
            FieldValue::Text(text) => text == "true" || text == control_value,
        }
    }

    fn as_text(&self) -> String {
        match self {
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Text(text) => text.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Field name to value mapping persisted across reloads.
///
/// Capturing a form only overwrites the keys that form has; keys of fields
/// rendered on other steps survive until [`FormSnapshot::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSnapshot {
    values: BTreeMap<String, FieldValue>,
}

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse stored JSON. Anything but a flat object of strings and booleans
    /// is rejected as a whole.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Record every enabled, user-editable control of `form`.
    ///
    /// Hidden inputs (CSRF token, step number) belong to the server and are
    /// never recorded. Later controls with the same name overwrite earlier ones. A checkbox
    /// group records its checked value, or `false` when nothing is checked;
    /// a radio group with nothing checked is left as it was.
    pub fn capture(&mut self, form: &Form) {
        let mut checked_groups: HashSet<&str> = HashSet::new();
        let mut checkbox_groups: Vec<&str> = Vec::new();

        let editable = form
            .fields()
            .iter()
            .filter(|f| !f.disabled && f.kind != FieldKind::Hidden);
        for field in editable {
            match field.kind {
                FieldKind::Checkbox | FieldKind::Radio => {
                    if field.kind == FieldKind::Checkbox {
                        checkbox_groups.push(&field.name);
                    }
                    if field.checked {
                        checked_groups.insert(&field.name);
                        self.insert(field.name.as_str(), FieldValue::Text(field.value.clone()));
                    }
                }
                _ => self.insert(field.name.as_str(), FieldValue::Text(field.value.clone())),
            }
        }

        for name in checkbox_groups {
            if !checked_groups.contains(name) {
                self.insert(name, FieldValue::Bool(false));
            }
        }
    }

    /// Write stored values back into matching controls; returns how many
    /// controls were touched. Keys without a control are ignored, and hidden
    /// inputs keep the server's value.
    pub fn apply(&self, form: &mut Form) -> usize {
        let mut applied = 0;
        for field in form.fields_mut() {
            if field.kind == FieldKind::Hidden {
                continue;
            }
            let Some(value) = self.values.get(&field.name) else {
                continue;
            };
            if field.kind.is_checkable() {
                field.checked = value.checks(&field.value);
            } else {
                field.value = value.as_text();
            }
            applied += 1;
        }
        applied
    }
}
