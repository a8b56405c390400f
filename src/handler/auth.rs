use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    db::StoreError,
    dtos::userdtos::{
        normalize_skills, FilterUserDto, LoginUserDto, RegisterUserDto, UserData,
        UserLoginResponseDto, UserResponseDto,
    },
    error::{ErrorMessage, HttpError},
    models::usermodel::NewUser,
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .db_client
        .save_user(NewUser {
            name: body.name.trim().to_string(),
            email: body.email.trim().to_lowercase(),
            password_hash: hashed_password,
            phone: body.phone,
            location: body.location,
            skills: normalize_skills(body.skills),
        })
        .await;

    match result {
        Ok(user) => {
            tracing::info!("Registered user {}", user.id);
            Ok((
                StatusCode::CREATED,
                Json(UserResponseDto {
                    status: "success".to_string(),
                    data: UserData {
                        user: FilterUserDto::filter_user(&user),
                    },
                }),
            ))
        }
        Err(StoreError::UniqueViolation(_)) => Err(HttpError::unique_constraint_violation(
            ErrorMessage::EmailExist.to_string(),
        )),
        Err(e) => {
            tracing::error!("Failed to register user: {}", e);
            Err(HttpError::server_error(ErrorMessage::ServerError.to_string()))
        }
    }
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .db_client
        .get_user_by_email(body.email.trim())
        .await
        .map_err(|e| {
            tracing::error!("Login lookup failed: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let user = result.ok_or(HttpError::bad_request(
        ErrorMessage::WrongCredentials.to_string(),
    ))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::bad_request(
            ErrorMessage::WrongCredentials.to_string(),
        ));
    }

    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie_duration = time::Duration::minutes(app_state.env.jwt_maxage);
    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))?,
    );

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
    })
    .into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}
