use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    db::{Store, StoreError},
    error::{ErrorMessage, HttpError},
    models::usermodel::User,
    utils::token,
    AppState,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddeware {
    pub user: User,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no credential provided")]
    TokenNotProvided,

    #[error("credential is invalid or expired")]
    InvalidToken,

    #[error("user {0} no longer exists")]
    UserNoLongerExist(Uuid),

    #[error("identity lookup failed: {0}")]
    Storage(#[from] StoreError),
}

impl From<IdentityError> for HttpError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::TokenNotProvided => {
                HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string())
            }
            IdentityError::InvalidToken => {
                HttpError::unauthorized(ErrorMessage::InvalidToken.to_string())
            }
            IdentityError::UserNoLongerExist(_) => {
                HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string())
            }
            IdentityError::Storage(e) => {
                tracing::error!("Identity lookup failed: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }
}

/// Resolves a bearer credential to the user it was issued for.
pub async fn resolve_identity(
    token: Option<String>,
    secret: &[u8],
    store: &dyn Store,
) -> Result<User, IdentityError> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or(IdentityError::TokenNotProvided)?;

    let subject = token::decode_token(token, secret).map_err(|_| IdentityError::InvalidToken)?;
    let user_id = Uuid::parse_str(&subject).map_err(|_| IdentityError::InvalidToken)?;

    store
        .get_user(user_id)
        .await?
        .ok_or(IdentityError::UserNoLongerExist(user_id))
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_owned())
        });

    let user = resolve_identity(
        token,
        app_state.env.jwt_secret.as_bytes(),
        app_state.db_client.as_ref(),
    )
    .await
    .map_err(|e| {
        tracing::debug!("Rejected request to {}: {}", req.uri().path(), e);
        HttpError::from(e)
    })?;

    req.extensions_mut().insert(JWTAuthMiddeware { user });

    Ok(next.run(req).await)
}
