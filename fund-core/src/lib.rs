pub mod api;
pub mod backend_errors;
pub mod form;
pub mod models;
pub mod pagination;

pub use api::{ApiConfig, ApiError, ClientFactory, ClientRegistry, FundraisingApi};
pub use backend_errors::{BackendErrors, parse_backend_errors};
pub use form::{
    Draft, DraftRecord, FieldChange, FieldPatch, FormError, StepDescriptor, StepForm, StepProps,
    Submission, Transition,
};
pub use models::*;
pub use pagination::{PageQuery, Paginated};
