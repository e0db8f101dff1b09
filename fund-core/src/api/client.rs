use async_trait::async_trait;
use thiserror::Error;

use crate::backend_errors::BackendErrors;
use crate::models::{
    Campaign, Cause, NewCause, NewProject, Project, ProjectBeneficiary, ProjectFilter,
    ProjectUpdate, UserProfile,
};
use crate::pagination::{PageQuery, Paginated};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Record not found")]
    NotFound,

    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Validation failed: {0}")]
    Validation(BackendErrors),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Field errors carried by a validation failure, if any.
    pub fn backend_errors(&self) -> Option<&BackendErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Everything the front end asks of the backend.
#[async_trait]
pub trait FundraisingApi: Send + Sync {
    // Projects
    async fn list_projects(
        &self,
        page: PageQuery,
        filter: &ProjectFilter,
    ) -> Result<Paginated<Project>, ApiError>;

    async fn get_project(&self, id: i64) -> Result<Project, ApiError>;

    async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError>;

    async fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<Project, ApiError>;

    async fn delete_project(&self, id: i64) -> Result<(), ApiError>;

    async fn list_project_beneficiaries(
        &self,
        project_id: i64,
    ) -> Result<Vec<ProjectBeneficiary>, ApiError>;

    async fn list_project_campaigns(&self, project_id: i64) -> Result<Vec<Campaign>, ApiError>;

    // Causes
    async fn list_causes(&self) -> Result<Vec<Cause>, ApiError>;

    async fn get_cause(&self, id: i64) -> Result<Cause, ApiError>;

    async fn create_cause(&self, cause: &NewCause) -> Result<Cause, ApiError>;

    async fn update_cause(&self, id: i64, cause: &NewCause) -> Result<Cause, ApiError>;

    async fn delete_cause(&self, id: i64) -> Result<(), ApiError>;

    // Account
    async fn current_user(&self) -> Result<UserProfile, ApiError>;
}
