use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    routing::{get, patch, post},
};

use workify_auth::{PolicyEngine, Role};
use workify_core::{RecordId, now_millis};
use workify_hr::{NewPayment, Payment};
use workify_infra::{InsertResult, UpdateResult, payments::DEFAULT_CURRENCY};

use crate::app::dto::{EmailQuery, MarkPaidRequest, PaymentIntentRequest, PaymentIntentResponse};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app::routes::{guarded, parse_id, required_email};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CallerContext;

pub fn protected(engine: &Arc<PolicyEngine>) -> Router {
    let admin = Router::new()
        .route("/payrolls", get(list_payrolls))
        .route("/payrolls/:id", patch(mark_paid))
        .route("/stripe", post(create_payment_intent));

    let hr = Router::new()
        .route("/payrolls", post(create_payroll))
        .route("/details", get(payment_details));

    let employee = Router::new().route("/ownpayment", get(own_payments));

    Router::new()
        .merge(guarded(admin, engine, Role::Admin))
        .merge(guarded(hr, engine, Role::Hr))
        .merge(guarded(employee, engine, Role::Employee))
}

pub async fn list_payrolls(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(services.payments.list(None).await?))
}

pub async fn create_payroll(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiJson(body): ApiJson<NewPayment>,
) -> Result<Json<InsertResult>, ApiError> {
    let payment = body.into_payment(RecordId::new(), now_millis())?;
    let employee = payment.email.clone();
    let result = services.payments.insert(payment).await?;

    tracing::info!(by = ctx.email(), employee = %employee, payment_id = %result.inserted_id, "payroll created");
    Ok(Json(result))
}

/// Record the provider transaction on a payroll entry. Already paid entries
/// are left untouched.
pub async fn mark_paid(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<MarkPaidRequest>,
) -> Result<Json<UpdateResult>, ApiError> {
    let id = parse_id(&id)?;
    let transaction_id = body.transaction_id.trim();
    if transaction_id.is_empty() {
        return Err(ApiError::bad_request("tId is required"));
    }

    let result = services
        .payments
        .mark_paid(id, transaction_id, now_millis())
        .await?;

    tracing::info!(
        by = ctx.email(),
        payment_id = %id,
        modified = result.modified_count,
        "payroll marked paid"
    );
    Ok(Json(result))
}

pub async fn own_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    authz::require_owner(&services.engine, &ctx, query.email.as_deref())?;
    Ok(Json(services.payments.list(Some(ctx.email())).await?))
}

/// Paid history of one employee, oldest payout first.
pub async fn payment_details(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let email = required_email(query.email)?;
    Ok(Json(services.payments.list_paid(&email).await?))
}

pub async fn create_payment_intent(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CallerContext>,
    ApiJson(body): ApiJson<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let intent = services
        .gateway
        .create_intent(body.amount, DEFAULT_CURRENCY)
        .await?;

    tracing::info!(by = ctx.email(), intent_id = %intent.id, amount = body.amount, "payment intent created");

    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
        transaction_id: intent.id,
    }))
}
