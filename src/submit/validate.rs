use crate::markup::{Form, INVALID_CLASS};

/// Check every required control for non-empty trimmed content.
///
/// Failing controls get the invalid marker (`INVALID_CLASS`), passing ones
/// lose it. Returns the names of failing controls in document order, without
/// duplicates. For checkboxes and radios the content is the group's checked
/// value.
pub fn validate_required(form: &mut Form) -> Vec<String> {
    let verdicts: Vec<bool> = form
        .fields()
        .iter()
        .map(|field| {
            if !field.required {
                return true;
            }
            let content = if field.kind.is_checkable() {
                form.value_of(&field.name).unwrap_or_default()
            } else {
                field.value.as_str()
            };
            !content.trim().is_empty()
        })
        .collect();

    let mut invalid: Vec<String> = Vec::new();
    for (field, ok) in form.fields_mut().iter_mut().zip(verdicts) {
        if !field.required {
            continue;
        }
        field.invalid = !ok;
        if !ok && !invalid.contains(&field.name) {
            invalid.push(field.name.clone());
        }
    }

    if !invalid.is_empty() {
        tracing::debug!(fields = ?invalid, marker = INVALID_CLASS, "Required fields missing");
    }
    invalid
}
