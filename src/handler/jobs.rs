use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::jobdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

/// Browsing needs no account.
pub fn public_jobs_handler() -> Router {
    Router::new()
        .route("/", get(list_jobs))
        .route("/:job_id", get(get_job))
}

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/", post(create_job))
        .route("/:job_id", put(update_job).delete(delete_job))
        .route("/:job_id/apply", post(apply_to_job))
        .route("/:job_id/applicants", get(get_applicants))
        .route("/:job_id/select", put(select_applicant))
        .route("/:job_id/complete", put(complete_job))
        .route("/:job_id/cancel", put(cancel_job))
        .route("/:job_id/payment", post(initiate_payment))
        .route("/:job_id/messages", get(get_messages).post(send_message))
}

pub async fn list_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.list_open_jobs(query).await?;

    Ok(Json(ApiResponse::success("Open jobs retrieved", jobs)))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.get_job(job_id).await?;

    Ok(Json(ApiResponse::success(
        "Job details retrieved successfully",
        job,
    )))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.create_job(auth.user.id, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Job created successfully", job)),
    ))
}

pub async fn update_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<UpdateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .job_service
        .update_job(job_id, auth.user.id, body)
        .await?;

    Ok(Json(ApiResponse::success("Job updated successfully", job)))
}

pub async fn delete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.job_service.delete_job(job_id, auth.user.id).await?;

    Ok(Json(ApiResponse::<()>::message("Job deleted successfully")))
}

pub async fn apply_to_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state.job_service.apply(job_id, auth.user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Application submitted successfully",
            application,
        )),
    ))
}

pub async fn get_applicants(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let applicants = app_state
        .job_service
        .list_applicants(job_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Applicants retrieved", applicants)))
}

pub async fn select_applicant(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<SelectApplicantDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    let applicant_id = body
        .applicant_id
        .ok_or_else(|| HttpError::bad_request("applicant_id is required"))?;

    let job = app_state
        .job_service
        .select_applicant(job_id, auth.user.id, applicant_id)
        .await?;

    Ok(Json(ApiResponse::success("Applicant selected", job)))
}

pub async fn complete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .job_service
        .complete_job(job_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Job marked as completed", job)))
}

pub async fn cancel_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.cancel_job(job_id, auth.user.id).await?;

    Ok(Json(ApiResponse::success("Job canceled", job)))
}

pub async fn initiate_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let order = app_state
        .payment_service
        .initiate_payment(job_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Payment order created", order)))
}

pub async fn get_messages(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let page = app_state
        .chat_service
        .get_messages(job_id, auth.user.id, query)
        .await?;

    Ok(Json(ApiResponse::success("Messages retrieved", page)))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    let message = app_state
        .chat_service
        .send_message(job_id, auth.user.id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Message sent", message)),
    ))
}
