//! Command handlers. Each takes the API client and writes its result to
//! `out`, so the binary and the tests share them.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use fund_client::default_registry;
use fund_core::{ApiConfig, FundraisingApi, NewCause, PageQuery, ProjectFilter, ProjectUpdate};

use crate::output;
use crate::wizard::{WizardOutcome, run_project_wizard};

/// Builds the client for `config` from every backend this binary knows.
pub async fn connect(config: &ApiConfig) -> Result<Box<dyn FundraisingApi>> {
    let registry = default_registry();
    debug!(backend = %config.backend, available = ?registry.available_backends(), "connecting");
    registry
        .create(config)
        .await
        .with_context(|| format!("Failed to create '{}' client", config.backend))
}

/// Which slice of the project list to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// 1-based; wins over `offset`.
    pub page: Option<u32>,
}

impl PageRequest {
    pub fn to_query(self) -> PageQuery {
        let base = PageQuery::default();
        let query = match self.limit {
            Some(limit) => base.with_limit(limit),
            None => base,
        };
        match (self.page, self.offset) {
            (Some(page), _) => query.for_page(page),
            (None, Some(offset)) => PageQuery::new(query.limit(), offset),
            (None, None) => query,
        }
    }
}

pub async fn list_projects<W: Write>(
    api: &dyn FundraisingApi,
    request: PageRequest,
    filter: &ProjectFilter,
    out: &mut W,
) -> Result<()> {
    let page = api
        .list_projects(request.to_query(), filter)
        .await
        .context("Failed to list projects")?;
    output::write_project_page(out, &page)?;
    Ok(())
}

pub async fn show_project<W: Write>(
    api: &dyn FundraisingApi,
    id: i64,
    out: &mut W,
) -> Result<()> {
    let project = api
        .get_project(id)
        .await
        .with_context(|| format!("Failed to load project {id}"))?;
    let campaigns = api
        .list_project_campaigns(id)
        .await
        .with_context(|| format!("Failed to load campaigns of project {id}"))?;
    let beneficiaries = api
        .list_project_beneficiaries(id)
        .await
        .with_context(|| format!("Failed to load beneficiaries of project {id}"))?;
    output::write_project_detail(out, &project, &campaigns, &beneficiaries)?;
    Ok(())
}

/// Runs the create-project wizard. Returns whether a project was created.
pub async fn create_project<R: BufRead, W: Write>(
    api: &dyn FundraisingApi,
    input: R,
    out: &mut W,
) -> Result<bool> {
    match run_project_wizard(api, input, &mut *out).await? {
        WizardOutcome::Created(project) => {
            info!(id = project.id, "project created");
            Ok(true)
        }
        WizardOutcome::Cancelled => Ok(false),
    }
}

/// Patches the fields set in `update`. An empty update is refused rather
/// than sent.
pub async fn update_project<W: Write>(
    api: &dyn FundraisingApi,
    id: i64,
    update: &ProjectUpdate,
    out: &mut W,
) -> Result<()> {
    if *update == ProjectUpdate::default() {
        bail!("Nothing to update for project {id}; pass at least one field");
    }
    let updated = api
        .update_project(id, update)
        .await
        .with_context(|| format!("Failed to update project {id}"))?;
    info!(id, "project updated");
    writeln!(out, "Updated project #{}: {}", updated.id, updated.name)?;
    Ok(())
}

pub async fn delete_project<W: Write>(
    api: &dyn FundraisingApi,
    id: i64,
    out: &mut W,
) -> Result<()> {
    api.delete_project(id)
        .await
        .with_context(|| format!("Failed to delete project {id}"))?;
    writeln!(out, "Deleted project #{id}.")?;
    Ok(())
}

pub async fn list_causes<W: Write>(
    api: &dyn FundraisingApi,
    out: &mut W,
) -> Result<()> {
    let causes = api.list_causes().await.context("Failed to list causes")?;
    output::write_causes(out, &causes)?;
    Ok(())
}

pub async fn show_cause<W: Write>(
    api: &dyn FundraisingApi,
    id: i64,
    out: &mut W,
) -> Result<()> {
    let cause = api
        .get_cause(id)
        .await
        .with_context(|| format!("Failed to load cause {id}"))?;
    output::write_cause(out, &cause)?;
    Ok(())
}

pub async fn create_cause<W: Write>(
    api: &dyn FundraisingApi,
    cause: &NewCause,
    out: &mut W,
) -> Result<()> {
    let created = api
        .create_cause(cause)
        .await
        .with_context(|| format!("Failed to create cause '{}'", cause.name))?;
    writeln!(out, "Created cause #{}: {}", created.id, created.name)?;
    Ok(())
}

/// Renames a cause. A missing description keeps the current one.
pub async fn update_cause<W: Write>(
    api: &dyn FundraisingApi,
    id: i64,
    changes: NewCause,
    out: &mut W,
) -> Result<()> {
    let current = api
        .get_cause(id)
        .await
        .with_context(|| format!("Failed to load cause {id}"))?;
    let cause = NewCause {
        description: changes.description.or(current.description),
        ..changes
    };
    let updated = api
        .update_cause(id, &cause)
        .await
        .with_context(|| format!("Failed to update cause {id}"))?;
    writeln!(out, "Updated cause #{}: {}", updated.id, updated.name)?;
    Ok(())
}

pub async fn delete_cause<W: Write>(
    api: &dyn FundraisingApi,
    id: i64,
    out: &mut W,
) -> Result<()> {
    api.delete_cause(id)
        .await
        .with_context(|| format!("Failed to delete cause {id}"))?;
    writeln!(out, "Deleted cause #{id}.")?;
    Ok(())
}

pub async fn whoami<W: Write>(
    api: &dyn FundraisingApi,
    out: &mut W,
) -> Result<()> {
    let user = api
        .current_user()
        .await
        .context("Failed to load the signed-in user")?;
    output::write_user(out, &user)?;
    Ok(())
}
