//! Employee profiles and the flag toggles HR/Admin can apply to them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use workify_auth::Role;
use workify_core::{DomainError, DomainResult, EpochMillis, RecordId};

use crate::document::{Fields, ID_KEY, require_email, strip_keys};

/// A stored account. `email` is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, deserialize_with = "fired_flag")]
    pub fired: bool,
    pub created: EpochMillis,
    #[serde(flatten)]
    pub profile: Fields,
}

/// Registration payload for `PUT /adduser`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub created: Option<EpochMillis>,
    #[serde(flatten)]
    pub profile: Fields,
}

impl NewUser {
    /// Build the profile stored on first registration.
    ///
    /// New accounts start unverified and not fired. Admin accounts are
    /// provisioned out of band and cannot be self-registered.
    pub fn into_profile(self, id: RecordId, now: EpochMillis) -> DomainResult<UserProfile> {
        let email = require_email(&self.email)?;
        let role = self.role.unwrap_or(Role::Employee);
        if role == Role::Admin {
            return Err(DomainError::validation("Admin accounts cannot self-register"));
        }

        Ok(UserProfile {
            id,
            email,
            role,
            verified: false,
            fired: false,
            created: self.created.unwrap_or(now),
            profile: strip_keys(self.profile, &[ID_KEY, "verified", "fired"]),
        })
    }
}

/// A flag flip applied atomically by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Toggle {
    /// `verified` → `!verified`.
    Verified,
    /// HR ↔ Employee. Admin is left untouched.
    Role,
    /// `fired` → `!fired`.
    Fired,
}

impl Toggle {
    /// Apply the flip in place; returns whether the document changed.
    pub fn apply(self, user: &mut UserProfile) -> bool {
        match self {
            Toggle::Verified => {
                user.verified = !user.verified;
                true
            }
            Toggle::Fired => {
                user.fired = !user.fired;
                true
            }
            Toggle::Role => {
                let next = next_role(user.role);
                let changed = next != user.role;
                user.role = next;
                changed
            }
        }
    }

    pub fn field(self) -> &'static str {
        match self {
            Toggle::Verified => "verified",
            Toggle::Role => "role",
            Toggle::Fired => "fired",
        }
    }
}

pub fn next_role(current: Role) -> Role {
    match current {
        Role::Hr => Role::Employee,
        Role::Employee => Role::Hr,
        Role::Admin => Role::Admin,
    }
}

/// `fired` was stored as `"True"`/`"False"` by older clients.
fn fired_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid fired flag: {other}"
        ))),
    }
}
