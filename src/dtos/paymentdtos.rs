use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order handed to the client so it can open the gateway checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrderDto {
    pub order_id: String,
    pub job_id: Uuid,
    /// Minor currency units (paise for INR).
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    pub payment: Option<PaymentEntityWrapper>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntityWrapper {
    pub entity: PaymentEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub notes: PaymentNotes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentNotes {
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAckDto {
    pub status: String,
}
