//! Authorization policy engine: authenticate → role → ownership.
//!
//! Built once at startup with an explicit identity directory handle and shared
//! by every request. Roles are re-read from the directory on every decision;
//! the token only establishes *who* is asking.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{AuthError, Caller, Role, RoleRequirement, TokenService, authorize_owner, authorize_role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DirectoryError(pub String);

/// Read access to the current state of accounts.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Current stored role for `email`.
    ///
    /// `Ok(None)` when there is no such account or its role is unrecognised.
    async fn current_role(&self, email: &str) -> Result<Option<Role>, DirectoryError>;
}

#[derive(Clone)]
pub struct PolicyEngine {
    tokens: TokenService,
    directory: Arc<dyn IdentityDirectory>,
}

impl core::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl PolicyEngine {
    pub fn new(tokens: TokenService, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { tokens, directory }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Authentication step. Does not touch the directory.
    pub fn authenticate(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<Caller, AuthError> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthError::MissingToken),
        };

        let claims = self.tokens.verify(token, now).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            AuthError::InvalidToken
        })?;

        Ok(Caller::from(claims))
    }

    /// The caller's role as currently stored (one directory read).
    pub async fn current_role(&self, caller: &Caller) -> Result<Option<Role>, AuthError> {
        self.directory
            .current_role(caller.email())
            .await
            .map_err(|e| AuthError::Directory(e.0))
    }

    /// Role step: one fresh directory read, compared against `required`.
    pub async fn require_role(
        &self,
        caller: &Caller,
        required: impl Into<RoleRequirement>,
    ) -> Result<Role, AuthError> {
        let required = required.into();
        let current = self.current_role(caller).await?;

        authorize_role(current, required).inspect_err(|_| {
            tracing::warn!(
                email = caller.email(),
                required = %required,
                current = ?current,
                "role check denied"
            );
        })
    }

    /// Ownership step. `owner_email` is `None` when the resource is absent.
    pub fn require_owner(&self, caller: &Caller, owner_email: Option<&str>) -> Result<(), AuthError> {
        authorize_owner(caller, owner_email).inspect_err(|_| {
            tracing::warn!(email = caller.email(), owner = ?owner_email, "ownership check denied");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Duration;

    #[derive(Default)]
    struct FakeDirectory {
        roles: Mutex<HashMap<String, Role>>,
        fail: bool,
    }

    impl FakeDirectory {
        fn set(&self, email: &str, role: Role) {
            self.roles.lock().unwrap().insert(email.to_string(), role);
        }
    }

    #[async_trait]
    impl IdentityDirectory for FakeDirectory {
        async fn current_role(&self, email: &str) -> Result<Option<Role>, DirectoryError> {
            if self.fail {
                return Err(DirectoryError("connection reset".into()));
            }
            Ok(self.roles.lock().unwrap().get(email).copied())
        }
    }

    fn engine(directory: Arc<FakeDirectory>) -> PolicyEngine {
        PolicyEngine::new(TokenService::new(b"policy-test", Duration::hours(2)), directory)
    }

    #[test]
    fn missing_and_blank_tokens_are_missing() {
        let engine = engine(Arc::new(FakeDirectory::default()));
        assert_eq!(engine.authenticate(None, Utc::now()), Err(AuthError::MissingToken));
        assert_eq!(engine.authenticate(Some("  "), Utc::now()), Err(AuthError::MissingToken));
    }

    #[test]
    fn bad_tokens_are_invalid() {
        let engine = engine(Arc::new(FakeDirectory::default()));
        assert_eq!(
            engine.authenticate(Some("abc.def.ghi"), Utc::now()),
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn role_change_applies_to_the_same_token() {
        let directory = Arc::new(FakeDirectory::default());
        directory.set("hr@workify.io", Role::Hr);
        let engine = engine(directory.clone());

        let now = Utc::now();
        let token = engine.tokens().issue("hr@workify.io", now).unwrap().token;
        let caller = engine.authenticate(Some(&token), now).unwrap();
        assert_eq!(engine.require_role(&caller, Role::Hr).await, Ok(Role::Hr));

        directory.set("hr@workify.io", Role::Employee);
        let caller = engine.authenticate(Some(&token), now).unwrap();
        assert_eq!(engine.require_role(&caller, Role::Hr).await, Err(AuthError::Forbidden));
    }

    #[tokio::test]
    async fn unknown_account_is_forbidden() {
        let engine = engine(Arc::new(FakeDirectory::default()));
        let caller = Caller::new("ghost@workify.io");
        assert_eq!(engine.require_role(&caller, Role::Employee).await, Err(AuthError::Forbidden));
    }

    #[tokio::test]
    async fn directory_failure_is_not_a_denial() {
        let engine = engine(Arc::new(FakeDirectory {
            fail: true,
            ..Default::default()
        }));
        let caller = Caller::new("ann@workify.io");
        let err = engine.require_role(&caller, Role::Admin).await.unwrap_err();
        assert!(matches!(err, AuthError::Directory(_)));
    }

    #[test]
    fn ownership_uses_caller_email() {
        let engine = engine(Arc::new(FakeDirectory::default()));
        let caller = Caller::new("ann@workify.io");
        assert!(engine.require_owner(&caller, Some("ann@workify.io")).is_ok());
        assert_eq!(
            engine.require_owner(&caller, Some("bob@workify.io")),
            Err(AuthError::Forbidden)
        );
    }
}
