use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::put,
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::jobdtos::{ApiResponse, ApplicationStatusDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn applications_handler() -> Router {
    Router::new().route(
        "/:application_id",
        put(update_application_status).delete(withdraw_application),
    )
}

pub async fn update_application_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(application_id): Path<Uuid>,
    Json(body): Json<ApplicationStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    let status = body.status.unwrap_or_default();

    let application = app_state
        .job_service
        .set_application_status(application_id, auth.user.id, status.trim())
        .await?;

    Ok(Json(ApiResponse::success(
        "Application status updated",
        application,
    )))
}

pub async fn withdraw_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .job_service
        .withdraw_application(application_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::<()>::message("Application withdrawn")))
}
