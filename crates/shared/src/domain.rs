use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignupId(pub Uuid);

impl SignupId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SignupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who is joining the waitlist. The wire form is the capitalised variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Student,
    Business,
    University,
}

/// How the organization field is collected for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizationKind {
    /// Picked from the university directory.
    University,
    /// Typed in by hand.
    Company,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Business, Role::University];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Business => "Business",
            Role::University => "University",
        }
    }

    pub fn organization_kind(self) -> OrganizationKind {
        match self {
            Role::Business => OrganizationKind::Company,
            Role::Student | Role::University => OrganizationKind::University,
        }
    }

    pub fn organization_label(self) -> &'static str {
        match self {
            Role::Student => "University Name",
            Role::Business | Role::University => "Company / Institution Name",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupStatus {
    #[default]
    Pending,
}

impl SignupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SignupStatus::Pending => "pending",
        }
    }
}

impl FromStr for SignupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SignupStatus::Pending),
            other => Err(format!("unknown signup status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRecord {
    pub id: SignupId,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub organization: String,
    pub signup_position: i64,
    pub status: SignupStatus,
    pub created_at: DateTime<Utc>,
}
