//! Multi-step form controller.
//!
//! A [`StepForm`] walks a fixed, ordered list of [`StepDescriptor`]s over a
//! single draft record. Steps never own form data: every field they show is
//! read from the shared draft and every edit is sent back as a patch, so a
//! step that is left and revisited renders exactly what was entered before.

mod controller;
mod draft;
mod submission;

pub use controller::{FormError, StepDescriptor, StepForm, StepProps, Transition};
pub use draft::{Draft, DraftError, DraftRecord, FieldChange, FieldPatch};
pub use submission::Submission;
