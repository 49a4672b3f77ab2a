use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Role, User};
use crate::db::queries;
use crate::error::AppError;
use crate::validation::{validate_user_status, ChangeUserStatus};

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Customer accounts only; admins are not listed.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(queries::list_users_with_role(&self.pool, Role::User.as_str()).await?)
    }

    pub async fn get_one(&self, id: Uuid) -> Result<User, AppError> {
        queries::get_user(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user found with id: {}", id)))
    }

    pub async fn get_me(&self, caller_id: Uuid) -> Result<User, AppError> {
        queries::get_user(&self.pool, caller_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    pub async fn change_status(
        &self,
        id: Uuid,
        payload: ChangeUserStatus,
    ) -> Result<User, AppError> {
        validate_user_status(&payload)?;

        queries::update_user_status(&self.pool, id, &payload.status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user found with id: {}", id)))
    }
}
