use crate::domain_port::ResetCodeStoreError;

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("user not found")]
    UserNotFound,
    #[error("incorrect code, {remaining_attempts} attempt(s) left")]
    Incorrect { remaining_attempts: u32 },
    #[error("reset code not found or expired")]
    NotFoundOrExpired,
    #[error("{0}")]
    InvalidInput(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<ResetCodeStoreError> for ResetError {
    fn from(err: ResetCodeStoreError) -> Self {
        match err {
            ResetCodeStoreError::Incorrect { remaining_attempts } => {
                ResetError::Incorrect { remaining_attempts }
            }
            ResetCodeStoreError::NotFoundOrExpired => ResetError::NotFoundOrExpired,
            ResetCodeStoreError::Store(e) => ResetError::Store(e),
            ResetCodeStoreError::InternalError(e) => ResetError::InternalError(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangePasswordInput {
    pub email: String,
    pub code: String,
    pub password: String,
}

#[async_trait::async_trait]
pub trait PasswordResetService: Send + Sync {
    /// Mails a fresh code to `email`, replacing any previous one.
    async fn send_code(&self, email: &str) -> Result<(), ResetError>;
    /// Checks a code without consuming it.
    async fn validate_code(&self, email: &str, code: &str) -> Result<(), ResetError>;
    async fn change_password(&self, input: ChangePasswordInput) -> Result<(), ResetError>;
}
