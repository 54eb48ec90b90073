use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use workify_auth::{AuthError, PolicyEngine, RoleRequirement};

use crate::app::errors::ApiError;
use crate::context::CallerContext;
use crate::cookies::{SESSION_COOKIE, read_cookie};

#[derive(Clone)]
pub struct AuthState {
    pub engine: Arc<PolicyEngine>,
}

/// Authentication step: verify the session credential and attach the caller.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = state
        .engine
        .authenticate(extract_token(req.headers()), Utc::now())?;

    req.extensions_mut().insert(CallerContext::new(caller));

    Ok(next.run(req).await)
}

/// Per-route role guard state.
#[derive(Clone)]
pub struct RoleGuard {
    pub engine: Arc<PolicyEngine>,
    pub required: RoleRequirement,
}

/// Role step: one fresh read of the caller's stored role.
///
/// Runs after [`auth_middleware`]; a request without a caller is rejected
/// as unauthenticated.
pub async fn role_middleware(
    State(guard): State<RoleGuard>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = req
        .extensions()
        .get::<CallerContext>()
        .cloned()
        .ok_or(AuthError::MissingToken)?;

    guard.engine.require_role(ctx.caller(), guard.required).await?;

    Ok(next.run(req).await)
}

/// The `jwtToken` cookie, falling back to an `Authorization: Bearer` header.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    read_cookie(headers, SESSION_COOKIE)
        .filter(|t| !t.is_empty())
        .or_else(|| extract_bearer(headers))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("jwtToken=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers), Some("from-cookie"));
    }

    #[test]
    fn bearer_is_a_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_token(&headers), Some("abc"));
    }

    #[test]
    fn no_credential_yields_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_token(&headers), None);
    }
}
