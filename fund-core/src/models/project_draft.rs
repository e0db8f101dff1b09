use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cause::Cause;
use super::project::{NewProject, ProjectStatus};
use crate::form::{Draft, FieldPatch};

/// Collected values of the create-project wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    pub img: Option<String>,
    pub causes: Vec<Cause>,
    pub target: Decimal,
    pub campaign_limit: u32,
    pub city: String,
    pub country: String,
    pub description: String,
    pub status: ProjectStatus,
}

impl Default for ProjectDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            img: Some("default".to_string()),
            causes: Vec::new(),
            target: Decimal::ZERO,
            campaign_limit: 0,
            city: String::new(),
            country: String::new(),
            description: String::new(),
            status: ProjectStatus::Draft,
        }
    }
}

/// One typed field update for a [`ProjectDraft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectField {
    Name(String),
    Img(Option<String>),
    Causes(Vec<Cause>),
    Target(Decimal),
    CampaignLimit(u32),
    City(String),
    Country(String),
    Description(String),
    Status(ProjectStatus),
}

impl FieldPatch for ProjectField {
    fn field(&self) -> &str {
        match self {
            Self::Name(_) => "name",
            Self::Img(_) => "img",
            Self::Causes(_) => "causes",
            Self::Target(_) => "target",
            Self::CampaignLimit(_) => "campaign_limit",
            Self::City(_) => "city",
            Self::Country(_) => "country",
            Self::Description(_) => "description",
            Self::Status(_) => "status",
        }
    }
}

impl Draft for ProjectDraft {
    type Patch = ProjectField;

    fn apply(
        &mut self,
        patch: ProjectField,
    ) {
        match patch {
            ProjectField::Name(v) => self.name = v,
            ProjectField::Img(v) => self.img = v,
            ProjectField::Causes(v) => self.causes = v,
            ProjectField::Target(v) => self.target = v,
            ProjectField::CampaignLimit(v) => self.campaign_limit = v,
            ProjectField::City(v) => self.city = v,
            ProjectField::Country(v) => self.country = v,
            ProjectField::Description(v) => self.description = v,
            ProjectField::Status(v) => self.status = v,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ProjectDraft {
    /// Validates that the draft has all required values for submission.
    ///
    /// Rules:
    /// - name is required
    /// - target must be greater than zero
    pub fn validate_for_submit(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name is required.".to_string());
        }

        if self.target <= Decimal::ZERO {
            errors.push("Target must be greater than zero.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn cause_names(&self) -> Vec<String> {
        self.causes.iter().map(|c| c.name.clone()).collect()
    }

    pub fn to_new_project(&self) -> NewProject {
        NewProject {
            name: self.name.trim().to_string(),
            img: self.img.clone(),
            causes_names: self.cause_names(),
            target: self.target,
            campaign_limit: (self.campaign_limit > 0).then_some(self.campaign_limit),
            city: non_empty(&self.city),
            country: non_empty(&self.country),
            description: non_empty(&self.description),
            status: self.status,
        }
    }
}

impl fmt::Display for ProjectDraft {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let causes = self.cause_names().join(", ");
        writeln!(f, "Name:           {}", self.name)?;
        writeln!(f, "Description:    {}", self.description)?;
        writeln!(f, "Causes:         {}", if causes.is_empty() { "—" } else { causes.as_str() })?;
        writeln!(f, "Target:         {}", self.target)?;
        writeln!(f, "Campaign limit: {}", self.campaign_limit)?;
        writeln!(f, "City:           {}", self.city)?;
        writeln!(f, "Country:        {}", self.country)?;
        write!(f, "Status:         {}", self.status)
    }
}
