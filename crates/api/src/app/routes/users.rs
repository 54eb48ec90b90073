use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    response::{IntoResponse, Response},
    routing::{get, patch, put},
};

use workify_auth::{PolicyEngine, Role};
use workify_core::{RecordId, now_millis};
use workify_hr::{NewUser, Toggle, UserProfile};
use workify_infra::{UpdateResult, UpsertOutcome};

use crate::app::dto::{EmailQuery, MessageResponse};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app::routes::{guarded, parse_id, required_email};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CallerContext;

pub fn public() -> Router {
    Router::new().route("/adduser", put(register_user))
}

pub fn protected(engine: &Arc<PolicyEngine>) -> Router {
    let hr = Router::new()
        .route("/userhr", get(profile_for_hr))
        .route("/users", get(list_employees))
        .route("/updateverified/:id", patch(toggle_verified));

    let admin = Router::new()
        .route("/allusers", get(list_all_users))
        .route("/updaterole/:id", patch(toggle_role))
        .route("/updatefired/:id", patch(toggle_fired));

    Router::new()
        .route("/user", get(own_profile))
        .merge(guarded(hr, engine, Role::Hr))
        .merge(guarded(admin, engine, Role::Admin))
}

/// Insert the profile unless the email is already registered.
pub async fn register_user(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<Response, ApiError> {
    let profile = body.into_profile(RecordId::new(), now_millis())?;
    let email = profile.email.clone();

    match services.users.insert_if_absent(profile).await? {
        UpsertOutcome::Inserted(result) => {
            tracing::info!(email = %email, "user registered");
            Ok(Json(result).into_response())
        }
        UpsertOutcome::AlreadyExists => {
            Ok(Json(MessageResponse::new("the user already in")).into_response())
        }
    }
}

pub async fn own_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<Option<UserProfile>>, ApiError> {
    authz::require_owner(&services.engine, &ctx, query.email.as_deref())?;
    Ok(Json(services.users.find_by_email(ctx.email()).await?))
}

pub async fn profile_for_hr(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<Option<UserProfile>>, ApiError> {
    let email = required_email(query.email)?;
    Ok(Json(services.users.find_by_email(&email).await?))
}

pub async fn list_employees(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    Ok(Json(services.users.list(Some(Role::Employee)).await?))
}

pub async fn list_all_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    Ok(Json(services.users.list(None).await?))
}

pub async fn toggle_verified(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<UpdateResult>, ApiError> {
    apply_toggle(&services, &ctx, &id, Toggle::Verified).await
}

pub async fn toggle_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<UpdateResult>, ApiError> {
    apply_toggle(&services, &ctx, &id, Toggle::Role).await
}

pub async fn toggle_fired(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<UpdateResult>, ApiError> {
    apply_toggle(&services, &ctx, &id, Toggle::Fired).await
}

async fn apply_toggle(
    services: &AppServices,
    ctx: &CallerContext,
    raw_id: &str,
    toggle: Toggle,
) -> Result<Json<UpdateResult>, ApiError> {
    let id = parse_id(raw_id)?;
    let result = services.users.toggle(id, toggle).await?;

    tracing::info!(
        by = ctx.email(),
        user_id = %id,
        field = toggle.field(),
        modified = result.modified_count,
        "user flag toggled"
    );

    Ok(Json(result))
}
