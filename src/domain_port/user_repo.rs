use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: String,
    pub gender: String,
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: String,
    pub cover: Option<String>,
    pub gender: String,
    pub birth_date: NaiveDate,
    pub verified: bool,
    pub details: ProfileDetails,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            user_id: self.user_id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            picture: self.picture.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Creates the user row together with its (empty) relationship sets.
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user: &NewUser,
    ) -> Result<(), AuthError>;

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError>;

    async fn set_verified(&self, user_id: UserId) -> Result<(), AuthError>;

    async fn update_details(
        &self,
        user_id: UserId,
        details: &ProfileDetails,
    ) -> Result<(), AuthError>;

    /// Unknown ids are skipped.
    async fn get_summaries(&self, user_ids: &[UserId]) -> Result<Vec<UserSummary>, AuthError>;
}
