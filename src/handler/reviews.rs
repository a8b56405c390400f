use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};

use crate::{
    dtos::{jobdtos::ApiResponse, reviewdtos::CreateReviewDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn reviews_handler() -> Router {
    Router::new().route("/", post(create_review))
}

pub async fn create_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    let review = app_state
        .review_service
        .create_review(auth.user.id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Review submitted", review)),
    ))
}
