mod beneficiary;
mod campaign;
mod cause;
mod project;
mod project_draft;
mod user_profile;

pub use beneficiary::{GroupBeneficiary, ProjectBeneficiary, UserBeneficiary};
pub use campaign::Campaign;
pub use cause::{Cause, CauseRef, NewCause, normalize_causes};
pub use project::{NewProject, Project, ProjectFilter, ProjectStatus, ProjectUpdate};
pub use project_draft::{ProjectDraft, ProjectField};
pub use user_profile::UserProfile;
