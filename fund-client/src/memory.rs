//! In-process backend.
//!
//! Mirrors the server's observable rules closely enough for offline use and
//! tests: sequential ids, lowercase cause names resolved by name on project
//! create, field-level validation errors, token-gated `current_user`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use fund_core::{
    ApiError, BackendErrors, Campaign, Cause, CauseRef, FundraisingApi, NewCause, NewProject,
    PageQuery, Paginated, Project, ProjectBeneficiary, ProjectFilter, ProjectUpdate, UserProfile,
};

const BLANK: &str = "This field may not be blank.";
const MIN_TARGET: &str = "Ensure this value is greater than or equal to 0.01.";
const NO_CREDENTIALS: &str = "Authentication credentials were not provided.";

#[derive(Debug, Default)]
struct Store {
    next_project_id: i64,
    next_cause_id: i64,
    projects: BTreeMap<i64, Project>,
    causes: BTreeMap<i64, Cause>,
    campaigns: HashMap<i64, Vec<Campaign>>,
    beneficiaries: HashMap<i64, Vec<ProjectBeneficiary>>,
}

impl Store {
    fn cause_by_name(
        &self,
        name: &str,
    ) -> Option<&Cause> {
        self.causes.values().find(|c| c.name == name)
    }

    fn insert_cause(
        &mut self,
        cause: &NewCause,
    ) -> Cause {
        self.next_cause_id += 1;
        let created = Cause {
            id: self.next_cause_id,
            name: cause.name.trim().to_lowercase(),
            description: cause.description.clone(),
            icon: cause.icon.clone(),
        };
        self.causes.insert(created.id, created.clone());
        created
    }

    /// Looks each name up (case-insensitively), creating causes that do not
    /// exist yet.
    fn resolve_causes(
        &mut self,
        names: &[String],
    ) -> Vec<CauseRef> {
        names
            .iter()
            .map(|name| {
                let name = name.trim().to_lowercase();
                let cause = match self.cause_by_name(&name) {
                    Some(existing) => existing.clone(),
                    None => self.insert_cause(&NewCause {
                        name,
                        description: None,
                        icon: None,
                    }),
                };
                CauseRef::Full(cause)
            })
            .collect()
    }

    fn require_project(
        &self,
        id: i64,
    ) -> Result<(), ApiError> {
        if self.projects.contains_key(&id) {
            Ok(())
        } else {
            Err(ApiError::NotFound)
        }
    }
}

fn validate_project(
    name: Option<&str>,
    target: Option<Decimal>,
) -> Result<(), ApiError> {
    let mut fields = Vec::new();
    if name.is_some_and(|n| n.trim().is_empty()) {
        fields.push(("name", BLANK));
    }
    if target.is_some_and(|t| t < Decimal::new(1, 2)) {
        fields.push(("target", MIN_TARGET));
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(BackendErrors::from_fields(fields)))
    }
}

fn page_link(
    query: PageQuery,
    count: u32,
) -> Option<String> {
    (query.offset() < count).then(|| format!("memory://projects/?{}", query.to_query()))
}

/// [`FundraisingApi`] backed by an in-process store.
#[derive(Debug)]
pub struct MemoryClient {
    store: Mutex<Store>,
    token: Option<String>,
    user: UserProfile,
}

impl MemoryClient {
    pub fn new(token: Option<String>) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            token,
            user: UserProfile {
                pk: 1,
                email: "admin@example.org".to_string(),
                first_name: "Admin".to_string(),
                last_name: String::new(),
            },
        }
    }

    pub fn with_user(
        mut self,
        user: UserProfile,
    ) -> Self {
        self.user = user;
        self
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attaches a campaign to its project.
    pub fn add_campaign(
        &self,
        campaign: Campaign,
    ) -> Result<(), ApiError> {
        let mut store = self.store();
        store.require_project(campaign.project)?;
        store
            .campaigns
            .entry(campaign.project)
            .or_default()
            .push(campaign);
        Ok(())
    }

    /// Assigns a user or group to a project.
    pub fn assign_beneficiary(
        &self,
        project_id: i64,
        beneficiary: ProjectBeneficiary,
    ) -> Result<(), ApiError> {
        let mut store = self.store();
        store.require_project(project_id)?;
        let assigned = store.beneficiaries.entry(project_id).or_default();
        if !assigned
            .iter()
            .any(|b| b.kind() == beneficiary.kind() && b.assignable_id() == beneficiary.assignable_id())
        {
            assigned.push(beneficiary);
        }
        Ok(())
    }
}

#[async_trait]
impl FundraisingApi for MemoryClient {
    async fn list_projects(
        &self,
        page: PageQuery,
        filter: &ProjectFilter,
    ) -> Result<Paginated<Project>, ApiError> {
        let store = self.store();
        let matching: Vec<&Project> = store
            .projects
            .values()
            .filter(|p| filter.matches(p))
            .collect();
        let count = matching.len() as u32;

        let results = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();

        let next = page_link(
            PageQuery::new(page.limit(), page.offset().saturating_add(page.limit())),
            count,
        );
        let previous = (page.offset() > 0).then(|| {
            let prev = PageQuery::new(page.limit(), page.offset().saturating_sub(page.limit()));
            format!("memory://projects/?{}", prev.to_query())
        });

        debug!(count, offset = page.offset(), limit = page.limit(), "listed projects");
        Ok(Paginated {
            limit: page.limit(),
            offset: page.offset(),
            count,
            next,
            previous,
            results,
        })
    }

    async fn get_project(&self, id: i64) -> Result<Project, ApiError> {
        self.store()
            .projects
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        validate_project(Some(project.name.as_str()), Some(project.target))?;

        let mut store = self.store();
        let causes = store.resolve_causes(&project.causes_names);
        store.next_project_id += 1;
        let created = Project {
            id: store.next_project_id,
            name: project.name.clone(),
            img: project.img.clone(),
            causes,
            target: project.target,
            campaign_limit: project.campaign_limit,
            city: project.city.clone(),
            country: project.country.clone(),
            description: project.description.clone(),
            status: project.status,
            donation_percentage: 0,
        };
        store.projects.insert(created.id, created.clone());
        debug!(id = created.id, name = %created.name, "project created");
        Ok(created)
    }

    async fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<Project, ApiError> {
        validate_project(update.name.as_deref(), update.target)?;

        let mut store = self.store();
        store.require_project(id)?;
        let causes = match &update.causes_names {
            Some(names) if !names.is_empty() => Some(store.resolve_causes(names)),
            _ => None,
        };
        let project = store.projects.get_mut(&id).ok_or(ApiError::NotFound)?;

        if let Some(name) = &update.name {
            project.name = name.clone();
        }
        if let Some(img) = &update.img {
            project.img = Some(img.clone());
        }
        if let Some(causes) = causes {
            project.causes = causes;
        }
        if let Some(target) = update.target {
            project.target = target;
        }
        if let Some(limit) = update.campaign_limit {
            project.campaign_limit = Some(limit);
        }
        if let Some(city) = &update.city {
            project.city = Some(city.clone());
        }
        if let Some(country) = &update.country {
            project.country = Some(country.clone());
        }
        if let Some(description) = &update.description {
            project.description = Some(description.clone());
        }
        if let Some(status) = update.status {
            project.status = status;
        }
        Ok(project.clone())
    }

    async fn delete_project(&self, id: i64) -> Result<(), ApiError> {
        let mut store = self.store();
        store.projects.remove(&id).ok_or(ApiError::NotFound)?;
        store.campaigns.remove(&id);
        store.beneficiaries.remove(&id);
        Ok(())
    }

    async fn list_project_beneficiaries(
        &self,
        project_id: i64,
    ) -> Result<Vec<ProjectBeneficiary>, ApiError> {
        let store = self.store();
        store.require_project(project_id)?;
        Ok(store
            .beneficiaries
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_project_campaigns(&self, project_id: i64) -> Result<Vec<Campaign>, ApiError> {
        let store = self.store();
        store.require_project(project_id)?;
        Ok(store.campaigns.get(&project_id).cloned().unwrap_or_default())
    }

    async fn list_causes(&self) -> Result<Vec<Cause>, ApiError> {
        Ok(self.store().causes.values().cloned().collect())
    }

    async fn get_cause(&self, id: i64) -> Result<Cause, ApiError> {
        self.store()
            .causes
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn create_cause(&self, cause: &NewCause) -> Result<Cause, ApiError> {
        let name = cause.name.trim().to_lowercase();
        if name.is_empty() {
            return Err(ApiError::Validation(BackendErrors::from_fields([(
                "name", BLANK,
            )])));
        }

        let mut store = self.store();
        if store.cause_by_name(&name).is_some() {
            return Err(ApiError::Validation(BackendErrors::from_fields([(
                "name",
                "cause with this name already exists.",
            )])));
        }
        Ok(store.insert_cause(cause))
    }

    async fn update_cause(&self, id: i64, cause: &NewCause) -> Result<Cause, ApiError> {
        let name = cause.name.trim().to_lowercase();
        if name.is_empty() {
            return Err(ApiError::Validation(BackendErrors::from_fields([(
                "name", BLANK,
            )])));
        }

        let mut store = self.store();
        if store.cause_by_name(&name).is_some_and(|c| c.id != id) {
            return Err(ApiError::Validation(BackendErrors::from_fields([(
                "name",
                "cause with this name already exists.",
            )])));
        }
        let existing = store.causes.get_mut(&id).ok_or(ApiError::NotFound)?;
        existing.name = name;
        existing.description = cause.description.clone();
        if cause.icon.is_some() {
            existing.icon = cause.icon.clone();
        }
        let updated = existing.clone();

        for project in store.projects.values_mut() {
            for cause_ref in &mut project.causes {
                if matches!(cause_ref, CauseRef::Full(c) if c.id == id) {
                    *cause_ref = CauseRef::Full(updated.clone());
                }
            }
        }
        Ok(updated)
    }

    async fn delete_cause(&self, id: i64) -> Result<(), ApiError> {
        let mut store = self.store();
        store.causes.remove(&id).ok_or(ApiError::NotFound)?;
        for project in store.projects.values_mut() {
            project
                .causes
                .retain(|c| !matches!(c, CauseRef::Full(cause) if cause.id == id));
        }
        Ok(())
    }

    async fn current_user(&self) -> Result<UserProfile, ApiError> {
        match &self.token {
            Some(_) => Ok(self.user.clone()),
            None => Err(ApiError::Unauthorized(NO_CREDENTIALS.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn validate_project_reports_each_field() {
        let err = validate_project(Some(" "), Some(dec!(0))).unwrap_err();
        let errors = err.backend_errors().unwrap();
        assert_eq!(errors.field("name"), Some(BLANK));
        assert_eq!(errors.field("target"), Some(MIN_TARGET));
    }

    #[test]
    fn validate_project_skips_absent_fields() {
        assert_eq!(validate_project(None, None), Ok(()));
        assert_eq!(validate_project(None, Some(dec!(0.01))), Ok(()));
    }

    #[test]
    fn page_link_stops_past_the_end() {
        assert_eq!(
            page_link(PageQuery::new(5, 5), 8).as_deref(),
            Some("memory://projects/?limit=5&offset=5")
        );
        assert_eq!(page_link(PageQuery::new(5, 10), 8), None);
    }

    #[test]
    fn resolve_causes_reuses_existing_names() {
        let mut store = Store::default();
        let first = store.resolve_causes(&["Water".to_string()]);
        let again = store.resolve_causes(&["water ".to_string(), "Health".to_string()]);

        assert_eq!(first[0], again[0]);
        assert_eq!(again[1].name(), "health");
        assert_eq!(store.causes.len(), 2);
    }
}
