use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{
    dtos::jobdtos::ApiResponse,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn dashboard_handler() -> Router {
    Router::new()
        .route("/postings", get(get_postings))
        .route("/applications", get(get_applications))
}

pub async fn get_postings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.poster_jobs(auth.user.id).await?;

    Ok(Json(ApiResponse::success("Posted jobs retrieved", jobs)))
}

pub async fn get_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let applied = app_state.job_service.applied_jobs(auth.user.id).await?;

    Ok(Json(ApiResponse::success("Applied jobs retrieved", applied)))
}
