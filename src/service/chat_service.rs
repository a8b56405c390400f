use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{Store, StoreError},
    dtos::jobdtos::{MessagePageDto, PaginationQuery, SendMessageDto, DEFAULT_MESSAGES_PER_PAGE},
    models::{chatmodel::ChatMessage, jobmodel::Job},
    service::error::ServiceError,
};

/// Gatekeeper for the per-job conversation between poster and selected worker.
#[derive(Debug, Clone)]
pub struct ChatService {
    db_client: Arc<dyn Store>,
}

impl ChatService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn get_messages(
        &self,
        job_id: Uuid,
        requester_id: Uuid,
        query: PaginationQuery,
    ) -> Result<MessagePageDto, ServiceError> {
        self.party_job(job_id, requester_id).await?;

        let (limit, offset) = query.limit_offset(DEFAULT_MESSAGES_PER_PAGE);
        let messages = self.db_client.get_job_messages(job_id, limit, offset).await?;

        Ok(MessagePageDto {
            page: query.page.unwrap_or(1).max(1),
            limit: limit as u32,
            messages,
        })
    }

    pub async fn send_message(
        &self,
        job_id: Uuid,
        sender_id: Uuid,
        body: SendMessageDto,
    ) -> Result<ChatMessage, ServiceError> {
        body.validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let message = body
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ServiceError::Validation("Message is required".to_string()))?;

        self.party_job(job_id, sender_id).await?;

        let message = self
            .db_client
            .create_message(job_id, sender_id, message)
            .await
            .map_err(|e| match e {
                StoreError::MissingReference(_) => ServiceError::JobNotFound(job_id),
                other => other.into(),
            })?;

        tracing::debug!("Message {} sent on job {}", message.id, job_id);
        Ok(message)
    }

    async fn party_job(&self, job_id: Uuid, requester_id: Uuid) -> Result<Job, ServiceError> {
        let job = self
            .db_client
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if !job.is_party(requester_id) {
            return Err(ServiceError::UnauthorizedJobAccess(requester_id, job_id));
        }
        Ok(job)
    }
}
