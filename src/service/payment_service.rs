use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    dtos::paymentdtos::{PaymentOrderDto, WebhookEvent},
    models::jobmodel::{Job, JobStatus},
    service::{error::ServiceError, job_service::JobService},
};

pub const PAYMENT_CAPTURED: &str = "payment.captured";

/// Payment gateway boundary. Orders are minted locally; the only way a job
/// becomes `paid` is a signed `payment.captured` notification.
#[derive(Debug, Clone)]
pub struct PaymentService {
    job_service: Arc<JobService>,
    key_id: String,
    webhook_secret: String,
    currency: String,
}

impl PaymentService {
    pub fn new(
        job_service: Arc<JobService>,
        key_id: String,
        webhook_secret: String,
        currency: String,
    ) -> Self {
        Self {
            job_service,
            key_id,
            webhook_secret,
            currency,
        }
    }

    pub async fn initiate_payment(
        &self,
        job_id: Uuid,
        requester_id: Uuid,
    ) -> Result<PaymentOrderDto, ServiceError> {
        let job = self.job_service.get_job(job_id).await?;

        if !job.is_poster(requester_id) {
            return Err(ServiceError::UnauthorizedJobAccess(requester_id, job_id));
        }
        if job.status != JobStatus::Completed {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let order = PaymentOrderDto {
            order_id: format!("order_{}", Uuid::new_v4().simple()),
            job_id,
            amount: to_minor_units(job.payment),
            currency: self.currency.clone(),
            key_id: self.key_id.clone(),
        };

        tracing::info!(
            "Payment order {} created for job {} ({} {})",
            order.order_id,
            job_id,
            order.amount,
            order.currency
        );
        Ok(order)
    }

    /// HMAC-SHA256 of the raw body, hex encoded, compared in constant time.
    /// Always fails when no webhook secret is configured.
    pub fn verify_signature(&self, payload: &[u8], signature: &str) -> bool {
        if self.webhook_secret.is_empty() {
            return false;
        }

        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes()) else {
            return false;
        };
        mac.update(payload);

        let expected_signature_hex = hex::encode(mac.finalize().into_bytes());

        ConstantTimeEq::ct_eq(
            signature.trim().as_bytes(),
            expected_signature_hex.as_bytes(),
        )
        .into()
    }

    /// Applies a verified gateway event. Returns the paid job for a captured
    /// payment and `None` for events that are only acknowledged.
    pub async fn process_event(&self, event: WebhookEvent) -> Result<Option<Job>, ServiceError> {
        if event.event != PAYMENT_CAPTURED {
            tracing::debug!("Ignoring payment webhook event {}", event.event);
            return Ok(None);
        }

        let payment = event
            .payload
            .payment
            .map(|p| p.entity)
            .ok_or_else(|| ServiceError::Validation("Missing payment entity".to_string()))?;

        let job_id = payment
            .notes
            .job_id
            .ok_or_else(|| ServiceError::Validation("Payment carries no job_id note".to_string()))?;

        let job = self.job_service.get_job(job_id).await?;

        let expected = to_minor_units(job.payment);
        if payment.amount != expected || !payment.currency.eq_ignore_ascii_case(&self.currency) {
            tracing::warn!(
                "Payment {} for job {} does not match: got {} {}, expected {} {}",
                payment.id,
                job_id,
                payment.amount,
                payment.currency,
                expected,
                self.currency
            );
            return Err(ServiceError::Validation(
                "Payment amount does not match the job".to_string(),
            ));
        }

        // Gateways redeliver; a repeat of an applied capture is a no-op.
        if job.status == JobStatus::Paid {
            return Ok(Some(job));
        }

        let job = self.job_service.confirm_payment(job_id).await?;
        tracing::info!("Payment {} captured for job {}", payment.id, job_id);
        Ok(Some(job))
    }
}

pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
