use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    db::StoreError,
    error::{ErrorMessage, HttpError},
    models::jobmodel::JobStatus,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Application {0} not found")]
    ApplicationNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Job {0} is in status {1:?}, which does not allow this action")]
    InvalidJobStatus(Uuid, JobStatus),

    #[error("Application {0} cannot be withdrawn: {1}")]
    InvalidApplicationState(Uuid, String),

    #[error("User {0} is not authorized to perform this action on job {1}")]
    UnauthorizedJobAccess(Uuid, Uuid),

    #[error("User {0} is not authorized to perform this action on application {1}")]
    UnauthorizedApplicationAccess(Uuid, Uuid),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation(constraint) => {
                ServiceError::Conflict(format!("Duplicate record ({constraint})"))
            }
            other => ServiceError::Storage(other),
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::ApplicationNotFound(_)
            | ServiceError::UserNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidJobStatus(_, _)
            | ServiceError::InvalidApplicationState(_, _)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::UnauthorizedJobAccess(_, _)
            | ServiceError::UnauthorizedApplicationAccess(_, _) => StatusCode::FORBIDDEN,

            ServiceError::Conflict(_) => StatusCode::CONFLICT,

            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let message = error.to_string();
        match error.status_code() {
            StatusCode::NOT_FOUND => HttpError::not_found(message),
            StatusCode::FORBIDDEN => HttpError::forbidden(message),
            StatusCode::CONFLICT => HttpError::unique_constraint_violation(message),
            StatusCode::BAD_REQUEST => HttpError::bad_request(message),
            status => {
                tracing::error!("{}", message);
                HttpError::new(ErrorMessage::ServerError.to_string(), status)
            }
        }
    }
}
