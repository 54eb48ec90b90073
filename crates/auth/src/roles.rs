use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a Workify account.
///
/// Closed set: anything else stored in the identity store is treated as
/// "no role" by the policy layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[serde(rename = "HR")]
    Hr,
    Employee,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Hr, Role::Employee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Hr => "HR",
            Role::Employee => "Employee",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Which roles an endpoint accepts.
///
/// Roles are not hierarchical: `Exactly(Role::Hr)` rejects an Admin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    Exactly(Role),
    AnyOf(&'static [Role]),
}

impl RoleRequirement {
    pub fn accepts(&self, role: Role) -> bool {
        match self {
            RoleRequirement::Exactly(required) => *required == role,
            RoleRequirement::AnyOf(roles) => roles.contains(&role),
        }
    }
}

impl From<Role> for RoleRequirement {
    fn from(value: Role) -> Self {
        RoleRequirement::Exactly(value)
    }
}

impl core::fmt::Display for RoleRequirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RoleRequirement::Exactly(role) => write!(f, "{role}"),
            RoleRequirement::AnyOf(roles) => {
                let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                write!(f, "any of [{}]", names.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_stored_strings() {
        assert_eq!(serde_json::to_value(Role::Hr).unwrap(), "HR");
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "Admin");
        let parsed: Role = serde_json::from_str("\"Employee\"").unwrap();
        assert_eq!(parsed, Role::Employee);
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert_eq!("HR".parse::<Role>().unwrap(), Role::Hr);
        assert!("hr".parse::<Role>().is_err());
        assert!("Manager".parse::<Role>().is_err());
    }

    #[test]
    fn admin_is_not_implicitly_hr() {
        let hr_only = RoleRequirement::from(Role::Hr);
        assert!(hr_only.accepts(Role::Hr));
        assert!(!hr_only.accepts(Role::Admin));

        let privileged = RoleRequirement::AnyOf(&[Role::Admin, Role::Hr]);
        assert!(privileged.accepts(Role::Admin));
        assert!(privileged.accepts(Role::Hr));
        assert!(!privileged.accepts(Role::Employee));
    }
}
