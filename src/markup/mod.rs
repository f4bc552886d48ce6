//! Server-rendered markup model: the swappable region and its form.

mod form;
mod region;
mod selectors;

pub use form::{Field, FieldKind, Form, INVALID_CLASS};
pub use region::{Document, Region, StepLink};
