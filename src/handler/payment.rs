use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};

use crate::{
    dtos::paymentdtos::{WebhookAckDto, WebhookEvent},
    error::{ErrorMessage, HttpError},
    service::error::ServiceError,
    AppState,
};

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Gateway callbacks. Authenticated by signature, not by user token.
pub fn payment_handler() -> Router {
    Router::new().route("/webhook", post(payment_webhook))
}

pub async fn payment_webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| HttpError::unauthorized("Missing webhook signature"))?;

    if !app_state.payment_service.verify_signature(&body, signature) {
        tracing::warn!("Invalid payment webhook signature received");
        return Err(HttpError::unauthorized(
            ErrorMessage::InvalidWebhookSignature.to_string(),
        ));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| HttpError::bad_request(format!("Malformed webhook payload: {e}")))?;

    match app_state.payment_service.process_event(event).await {
        Ok(_) => {}
        // The gateway cannot act on these; acknowledge so it stops retrying.
        Err(e @ (ServiceError::JobNotFound(_) | ServiceError::InvalidJobStatus(_, _))) => {
            tracing::warn!("Payment webhook not applied: {}", e);
        }
        Err(e) => return Err(e.into()),
    }

    Ok((
        StatusCode::OK,
        Json(WebhookAckDto {
            status: "received".to_string(),
        }),
    ))
}
