use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cause::CauseRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Active,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn all() -> &'static [ProjectStatus] {
        &[Self::Draft, Self::Active, Self::Completed]
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub causes: Vec<CauseRef>,
    pub target: Decimal,
    #[serde(default)]
    pub campaign_limit: Option<u32>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub donation_percentage: u32,
}

/// For creating new projects (no id, causes by name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub img: Option<String>,
    pub causes_names: Vec<String>,
    pub target: Decimal,
    pub campaign_limit: Option<u32>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub status: ProjectStatus,
}

/// Partial update; only fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causes_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
}

/// Equality filters for the project list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl ProjectFilter {
    /// Query pairs for the filters that are set, in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(city) = &self.city {
            pairs.push(("city", city.clone()));
        }
        if let Some(country) = &self.country {
            pairs.push(("country", country.clone()));
        }
        pairs
    }

    pub fn matches(
        &self,
        project: &Project,
    ) -> bool {
        fn eq(
            want: &Option<String>,
            have: Option<&str>,
        ) -> bool {
            want.as_deref().is_none_or(|w| Some(w) == have)
        }

        eq(&self.name, Some(project.name.as_str()))
            && self.status.is_none_or(|s| s == project.status)
            && eq(&self.city, project.city.as_deref())
            && eq(&self.country, project.country.as_deref())
    }
}
