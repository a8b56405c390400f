use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    db::Store,
    dtos::userdtos::{PublicProfileDto, UpdateProfileDto},
    models::usermodel::{ProfileUpdate, User},
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct AccountService {
    db_client: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.db_client
            .get_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    pub async fn public_profile(&self, user_id: Uuid) -> Result<PublicProfileDto, ServiceError> {
        let user = self.get_profile(user_id).await?;
        Ok(PublicProfileDto::from_user(&user))
    }

    /// Profile fields only; the rating is owned by the review flow.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: UpdateProfileDto,
    ) -> Result<User, ServiceError> {
        update
            .validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let update = ProfileUpdate::from(update);
        if matches!(update.name.as_deref(), Some("")) {
            return Err(ServiceError::Validation("Name cannot be blank".to_string()));
        }

        self.db_client
            .update_user_profile(user_id, update)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    /// Deletes the account and everything hanging off it as one unit.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), ServiceError> {
        if !self.db_client.delete_user_cascade(user_id).await? {
            return Err(ServiceError::UserNotFound(user_id));
        }
        Ok(())
    }
}
