use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{
        jobdtos::ApiResponse,
        userdtos::{FilterUserDto, UpdateProfileDto, UserData, UserResponseDto},
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

/// Profiles and reviews are visible without an account.
pub fn public_users_handler() -> Router {
    Router::new()
        .route("/:user_id", get(get_public_profile))
        .route("/:user_id/reviews", get(get_user_reviews))
}

pub fn users_handler() -> Router {
    Router::new().route("/me", get(get_me).put(update_me).delete(delete_me))
}

pub async fn get_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.account_service.get_profile(auth.user.id).await?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    }))
}

pub async fn update_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .account_service
        .update_profile(auth.user.id, body)
        .await?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    }))
}

pub async fn delete_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.account_service.delete_account(auth.user.id).await?;

    Ok(Json(ApiResponse::<()>::message(
        "Account and associated data deleted",
    )))
}

pub async fn get_public_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state.account_service.public_profile(user_id).await?;

    Ok(Json(ApiResponse::success("User profile retrieved", profile)))
}

pub async fn get_user_reviews(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state.review_service.list_reviews(user_id).await?;

    Ok(Json(ApiResponse::success("Reviews retrieved", reviews)))
}
