use thiserror::Error;

use crate::{Caller, Role, RoleRequirement};

/// Outcome of a failed authentication/authorization step.
///
/// The display strings are the client-facing messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token is missing")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Forbidden access")]
    Forbidden,

    #[error("identity lookup failed: {0}")]
    Directory(String),
}

/// Check a caller's *current* role against an endpoint requirement.
///
/// - No IO
/// - No panics
/// - An unknown or absent account is indistinguishable from a wrong role
pub fn authorize_role(current: Option<Role>, required: RoleRequirement) -> Result<Role, AuthError> {
    match current {
        Some(role) if required.accepts(role) => Ok(role),
        _ => Err(AuthError::Forbidden),
    }
}

/// Check that the caller is the owner recorded on a resource.
///
/// `owner_email` is `None` when the resource does not exist; that is reported
/// as `Forbidden` so callers cannot probe for existence.
pub fn authorize_owner(caller: &Caller, owner_email: Option<&str>) -> Result<(), AuthError> {
    if caller.owns(owner_email) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn missing_account_is_forbidden() {
        assert_eq!(
            authorize_role(None, Role::Admin.into()),
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn matching_role_passes_through() {
        assert_eq!(authorize_role(Some(Role::Hr), Role::Hr.into()), Ok(Role::Hr));
        assert_eq!(
            authorize_role(Some(Role::Employee), Role::Admin.into()),
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn absent_resource_is_forbidden_not_missing() {
        let caller = Caller::new("ann@workify.io");
        assert_eq!(authorize_owner(&caller, None), Err(AuthError::Forbidden));
    }

    #[test]
    fn messages_are_client_facing() {
        assert_eq!(AuthError::MissingToken.to_string(), "Token is missing");
        assert_eq!(AuthError::InvalidToken.to_string(), "Invalid token");
        assert_eq!(AuthError::Forbidden.to_string(), "Forbidden access");
    }

    proptest! {
        /// Ownership holds exactly when the emails are byte-equal.
        #[test]
        fn ownership_is_exact_email_equality(
            caller in "[a-z]{1,8}@[a-z]{1,5}\\.io",
            owner in "[a-z]{1,8}@[a-z]{1,5}\\.io",
        ) {
            let result = authorize_owner(&Caller::new(caller.clone()), Some(&owner));
            prop_assert_eq!(result.is_ok(), caller == owner);
        }

        #[test]
        fn exact_requirement_accepts_only_itself(
            stored in prop::sample::select(Role::ALL.to_vec()),
            required in prop::sample::select(Role::ALL.to_vec()),
        ) {
            let result = authorize_role(Some(stored), required.into());
            prop_assert_eq!(result.is_ok(), stored == required);
        }
    }
}
