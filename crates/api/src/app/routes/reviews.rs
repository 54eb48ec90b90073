use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    routing::{get, post},
};

use workify_core::{RecordId, now_millis};
use workify_hr::{NewReview, Review};
use workify_infra::InsertResult;

use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub fn protected() -> Router {
    Router::new()
        .route("/addreview", post(add_review))
        .route("/reviews", get(list_reviews))
}

pub async fn add_review(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewReview>,
) -> Result<Json<InsertResult>, ApiError> {
    let review = body.into_review(RecordId::new(), now_millis());
    Ok(Json(services.reviews.insert(review).await?))
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(services.reviews.list().await?))
}
