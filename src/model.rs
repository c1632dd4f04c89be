//! Directory records: users and their roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of role labels attached to a user.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
    Guest,
    Owner,
    Inactive,
}

/// Display order of roles in the filter bar.
pub const ROLES: [Role; 6] = [
    Role::Admin,
    Role::Editor,
    Role::Viewer,
    Role::Guest,
    Role::Owner,
    Role::Inactive,
];

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Editor => "Editor",
            Role::Viewer => "Viewer",
            Role::Guest => "Guest",
            Role::Owner => "Owner",
            Role::Inactive => "Inactive",
        }
    }

    /// Wire/config name, e.g. `admin`.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
            Role::Guest => "guest",
            Role::Owner => "owner",
            Role::Inactive => "inactive",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ROLES
            .into_iter()
            .find(|r| r.as_str() == lower)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// Immutable directory record. Identity is `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub job_title: String,
    pub team: String,
    pub email: String,
    pub details: String,
}
