use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Access level of whoever is acting on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    #[serde(alias = "pengguna")]
    User,
    Admin,
    Superadmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Guest, Role::User, Role::Admin, Role::Superadmin];

    /// Admins and superadmins bypass the review queue.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown role '{0}' (expected guest, user, admin or superadmin)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Role::Guest),
            "user" | "pengguna" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::Superadmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated (or anonymous) party behind a request.
///
/// Actors are never persisted by the workflow; they are handed over by an
/// [`IdentityProvider`](crate::identity::IdentityProvider) for each action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role,
        }
    }

    /// Anonymous visitor with no session.
    pub fn guest() -> Self {
        Self::new("", "", "Guest", Role::Guest)
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }

    /// Name used when stamping audit fields.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown User"
        } else {
            &self.name
        }
    }

    /// Whether this actor submitted something identified by `submitter_id` / `submitter_email`.
    /// Blank identifiers never match.
    pub fn is_submitter(&self, submitter_id: &str, submitter_email: &str) -> bool {
        let id_match = !self.id.is_empty() && self.id == submitter_id;
        let email_match = !self.email.is_empty() && self.email == submitter_email;
        id_match || email_match
    }
}
