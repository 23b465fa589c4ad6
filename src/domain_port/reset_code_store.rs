use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait ResetCodeStore: Send + Sync {
    /// Replaces any code already stored for `email`.
    async fn save(
        &self,
        email: &str,
        code_hash_hex: &str,
        expire_at: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<(), ResetCodeStoreError>;

    /// A wrong code burns one attempt; the entry is dropped once none are left.
    async fn verify(
        &self,
        email: &str,
        provided_hash_hex: &str,
        consume: bool,
    ) -> Result<(), ResetCodeStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ResetCodeStoreError {
    #[error("incorrect code, {remaining_attempts} attempt(s) left")]
    Incorrect { remaining_attempts: u32 },
    #[error("code not found or expired")]
    NotFoundOrExpired,
    #[error("infra error: {0}")]
    Store(String),
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
