use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    routing::{get, post, put},
};

use workify_auth::{PolicyEngine, Role};
use workify_core::{RecordId, now_millis};
use workify_hr::{Fields, NewTask, Task, TaskPatch};
use workify_infra::{DeleteResult, InsertResult, UpdateResult};

use crate::app::dto::EmailQuery;
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app::routes::{guarded, parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CallerContext;

pub fn protected(engine: &Arc<PolicyEngine>) -> Router {
    let employee = Router::new()
        .route("/owntask", get(own_tasks))
        .route("/owntask/:id", put(update_task).delete(delete_task))
        .route("/addtask", post(add_task));

    let hr = Router::new().route("/alltask", get(all_tasks));

    Router::new()
        .merge(guarded(employee, engine, Role::Employee))
        .merge(guarded(hr, engine, Role::Hr))
}

pub async fn own_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    authz::require_owner(&services.engine, &ctx, query.email.as_deref())?;
    Ok(Json(services.tasks.list(Some(ctx.email())).await?))
}

pub async fn add_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiJson(body): ApiJson<NewTask>,
) -> Result<Json<InsertResult>, ApiError> {
    authz::require_owner(&services.engine, &ctx, body.email.as_deref())?;

    let task = body.into_task(RecordId::new(), now_millis())?;
    let result = services.tasks.insert(task).await?;
    tracing::info!(email = ctx.email(), task_id = %result.inserted_id, "task added");

    Ok(Json(result))
}

/// Merge the body into a task the caller owns.
pub async fn update_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<Fields>,
) -> Result<Json<UpdateResult>, ApiError> {
    let id = owned_task(&services, &ctx, &id).await?;
    let patch = TaskPatch::new(body);
    Ok(Json(services.tasks.update(id, &patch).await?))
}

pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let id = owned_task(&services, &ctx, &id).await?;
    let result = services.tasks.delete(id).await?;
    tracing::info!(email = ctx.email(), task_id = %id, "task deleted");
    Ok(Json(result))
}

pub async fn all_tasks(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(services.tasks.list(None).await?))
}

/// Resolve `raw_id` to a task owned by the caller. A missing task is
/// reported the same way as someone else's task.
async fn owned_task(services: &AppServices, ctx: &CallerContext, raw_id: &str) -> Result<RecordId, ApiError> {
    let id = parse_id(raw_id)?;
    let task = services.tasks.find_by_id(id).await?;
    authz::require_owner(&services.engine, ctx, task.as_ref().map(Task::owner))?;
    Ok(id)
}
