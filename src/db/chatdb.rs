use async_trait::async_trait;
use uuid::Uuid;

use super::{DBClient, StoreError};
use crate::models::chatmodel::ChatMessage;

#[async_trait]
pub trait ChatExt: Send + Sync {
    async fn create_message(
        &self,
        job_id: Uuid,
        sender_id: Uuid,
        message: String,
    ) -> Result<ChatMessage, StoreError>;

    /// Messages of a job, oldest first.
    async fn get_job_messages(
        &self,
        job_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatMessage>, StoreError>;
}

#[async_trait]
impl ChatExt for DBClient {
    async fn create_message(
        &self,
        job_id: Uuid,
        sender_id: Uuid,
        message: String,
    ) -> Result<ChatMessage, StoreError> {
        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (job_id, sender_id, message)
            VALUES ($1, $2, $3)
            RETURNING id, job_id, sender_id, message, created_at
            "#,
        )
        .bind(job_id)
        .bind(sender_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn get_job_messages(
        &self,
        job_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, job_id, sender_id, message, created_at
            FROM chat_messages
            WHERE job_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(job_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
