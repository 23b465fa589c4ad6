use crate::application_port::{AuthError, RelationError};
use crate::domain_model::*;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user not found")]
    UserNotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<AuthError> for UserError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::UserNotFound => UserError::UserNotFound,
            AuthError::InvalidInput(e) => UserError::InvalidInput(e),
            other => UserError::Store(other.to_string()),
        }
    }
}

impl From<RelationError> for UserError {
    fn from(error: RelationError) -> Self {
        match error {
            RelationError::UserNotFound => UserError::UserNotFound,
            other => UserError::Store(other.to_string()),
        }
    }
}

/// Public lookup used by the forgotten-password flow.
#[derive(Debug, Clone, Serialize)]
pub struct FoundUser {
    pub email: String,
    pub picture: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user_id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: String,
    pub cover: Option<String>,
    pub gender: String,
    pub birth_date: NaiveDate,
    pub verified: bool,
    pub details: ProfileDetails,
    pub friend_count: usize,
    pub follower_count: usize,
    pub following_count: usize,
    pub relationship: RelationshipStatus,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn resolve_username(&self, username: &str) -> Result<UserId, UserError>;
    async fn find_user(&self, email: &str) -> Result<FoundUser, UserError>;
    async fn get_profile(&self, viewer: UserId, username: &str) -> Result<ProfileView, UserError>;
    async fn update_details(
        &self,
        me: UserId,
        details: ProfileDetails,
    ) -> Result<ProfileDetails, UserError>;
}
