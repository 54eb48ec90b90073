use std::sync::Arc;

use axum::Router;

use workify_auth::{PolicyEngine, RoleRequirement};
use workify_core::RecordId;

use crate::app::errors::ApiError;
use crate::middleware::{self, RoleGuard};

pub mod payroll;
pub mod reviews;
pub mod session;
pub mod system;
pub mod tasks;
pub mod users;

/// Endpoints reachable without a session credential.
pub fn public() -> Router {
    Router::new()
        .merge(system::router())
        .merge(session::public())
        .merge(users::public())
}

/// Endpoints that require a session. The caller must wrap this router in
/// the authentication layer.
pub fn protected(engine: &Arc<PolicyEngine>) -> Router {
    Router::new()
        .merge(session::protected())
        .merge(users::protected(engine))
        .merge(tasks::protected(engine))
        .merge(payroll::protected(engine))
        .merge(reviews::protected())
}

/// Attach a role guard to every route of `router`.
///
/// Routers guarded with different requirements may share a path as long as
/// they register different methods.
pub fn guarded(router: Router, engine: &Arc<PolicyEngine>, required: impl Into<RoleRequirement>) -> Router {
    let guard = RoleGuard {
        engine: engine.clone(),
        required: required.into(),
    };
    router.route_layer(axum::middleware::from_fn_with_state(guard, middleware::role_middleware))
}

pub(crate) fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    Ok(raw.parse::<RecordId>()?)
}

/// `?email=` for endpoints where the address selects a record rather than
/// proving ownership.
pub(crate) fn required_email(email: Option<String>) -> Result<String, ApiError> {
    email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("email query parameter is required"))
}
