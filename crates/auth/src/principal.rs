use serde::{Deserialize, Serialize};

use crate::SessionClaims;

/// Authenticated identity attached to a request.
///
/// Carries no role: authorization always asks the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    email: String,
}

impl Caller {
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into() }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Whether this caller is the owner recorded on a resource.
    pub fn owns(&self, owner_email: Option<&str>) -> bool {
        owner_email.is_some_and(|owner| owner == self.email)
    }
}

impl From<SessionClaims> for Caller {
    fn from(claims: SessionClaims) -> Self {
        Self::new(claims.email)
    }
}
