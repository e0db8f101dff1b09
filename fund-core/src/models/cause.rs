use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// For creating or updating causes (no id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCause {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A cause as it appears on a project: either expanded or just its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CauseRef {
    Full(Cause),
    Name(String),
}

impl CauseRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Full(cause) => &cause.name,
            Self::Name(name) => name,
        }
    }
}

impl From<Cause> for CauseRef {
    fn from(cause: Cause) -> Self {
        Self::Full(cause)
    }
}

/// Cause names of a project, whichever shape the API returned them in.
pub fn normalize_causes(causes: &[CauseRef]) -> Vec<String> {
    causes.iter().map(|c| c.name().to_string()).collect()
}
