use axum::{Router, http::StatusCode, routing::get};

pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

pub async fn root() -> &'static str {
    "hello to the server of Workify"
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
