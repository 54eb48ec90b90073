use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use workify_auth::Role;

use crate::app::dto::{LoginRequest, MessageResponse};
use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn public() -> Router {
    Router::new()
        .route("/jwt", post(issue_session))
        .route("/logout", post(end_session))
}

pub fn protected() -> Router {
    Router::new().route("/getrole", get(current_role))
}

/// Sign a credential for `email` and hand it back as an HTTP-only cookie.
pub async fn issue_session(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = body.email.trim();
    if email.is_empty() {
        return Err(ApiError::bad_request("email is required"));
    }

    let issued = services.engine.tokens().issue(email, Utc::now())?;
    tracing::info!(email, expires_at = %issued.expires_at, "session issued");

    Ok((
        [(header::SET_COOKIE, services.cookies.session(&issued.token))],
        Json(MessageResponse::new("Login successful")),
    )
        .into_response())
}

pub async fn end_session(Extension(services): Extension<Arc<AppServices>>) -> Response {
    (
        [(header::SET_COOKIE, services.cookies.cleared())],
        Json(MessageResponse::new("Logged out successfully")),
    )
        .into_response()
}

/// The caller's stored role, or `null` when they have no profile yet.
pub async fn current_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
) -> Result<Json<Option<Role>>, ApiError> {
    Ok(Json(services.engine.current_role(ctx.caller()).await?))
}
