//! `workify-auth` — authentication and authorization boundary.
//!
//! This crate is decoupled from HTTP. Storage is reached only through the
//! [`IdentityDirectory`] trait, which infra implements.

pub mod authorize;
pub mod claims;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{AuthError, authorize_owner, authorize_role};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use policy::{DirectoryError, IdentityDirectory, PolicyEngine};
pub use principal::Caller;
pub use roles::{Role, RoleRequirement, UnknownRole};
pub use token::{IssuedToken, TokenError, TokenService};
