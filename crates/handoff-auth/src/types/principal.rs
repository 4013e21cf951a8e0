//! Principals as seen by the broker.
//!
//! The identity subsystem owns principals. The broker only reads them:
//! it needs the id to bind a token and the active flag to decide whether a
//! redemption may succeed.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Account status maintained by the identity/admin subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalStatus {
    Active,
    Inactive,
    Suspended,
}

impl PrincipalStatus {
    /// Returns the status as stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    /// Parses a stored status. Unknown values are treated as inactive.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            "suspended" => Self::Suspended,
            _ => Self::Inactive,
        }
    }
}

/// An authenticated user at the SSO boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,

    /// Reference into the external identity provider (e.g. a Firebase UID).
    pub external_id: String,

    /// Display name.
    pub name: String,

    pub email: String,

    /// Portal role, e.g. `admin` or `user`.
    pub role: String,

    pub status: PrincipalStatus,

    /// Soft-delete marker. Deleted principals are never usable.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Principal {
    /// Creates an active principal.
    pub fn new(
        external_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.into(),
            name: name.into(),
            email: email.into(),
            role: role.into(),
            status: PrincipalStatus::Active,
            deleted_at: None,
        }
    }

    /// Returns `true` if the principal may take part in a handoff.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PrincipalStatus::Active && self.deleted_at.is_none()
    }

    /// Returns the read-only projection handed to downstream apps.
    #[must_use]
    pub fn view(&self) -> PrincipalView {
        PrincipalView {
            id: self.id,
            external_id: self.external_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

/// Principal data returned to a downstream application on redemption.
///
/// Contains identity fields only; no session or credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalView {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}
