use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBeneficiary {
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub is_group_leader: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBeneficiary {
    pub name: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub interest: String,
}

/// A user or user group assigned to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "assignable_type")]
pub enum ProjectBeneficiary {
    User {
        assignable_id: i64,
        beneficiary: UserBeneficiary,
    },
    UserGroup {
        assignable_id: i64,
        beneficiary: GroupBeneficiary,
    },
}

impl ProjectBeneficiary {
    pub fn assignable_id(&self) -> i64 {
        match self {
            Self::User { assignable_id, .. } | Self::UserGroup { assignable_id, .. } => {
                *assignable_id
            }
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::User { beneficiary, .. } => &beneficiary.name,
            Self::UserGroup { beneficiary, .. } => &beneficiary.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::UserGroup { .. } => "group",
        }
    }
}
