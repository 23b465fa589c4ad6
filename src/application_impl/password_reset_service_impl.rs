use crate::application_impl::validate_password;
use crate::application_port::*;
use crate::domain_port::{AuthRepo, Mail, Mailer, ResetCodeStore, UserRepo};
use crate::logger::*;
use chrono::{Duration, Utc};
use hmac::{Hmac, KeyInit, Mac};
use nanoid::nanoid;
use sha2::Sha256;
use std::sync::Arc;

const CODE_ALPHABET: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
const CODE_LEN: usize = 5;

#[derive(Debug, Clone)]
pub struct ResetConfig {
    pub hmac_key: Vec<u8>,
    pub code_ttl: Duration,
    pub max_attempts: u32,
}

pub struct RealPasswordResetService {
    user_repo: Arc<dyn UserRepo>,
    auth_repo: Arc<dyn AuthRepo>,
    store: Arc<dyn ResetCodeStore>,
    credential_hasher: Arc<dyn CredentialHasher>,
    mailer: Arc<dyn Mailer>,
    cfg: ResetConfig,
}

impl RealPasswordResetService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        auth_repo: Arc<dyn AuthRepo>,
        store: Arc<dyn ResetCodeStore>,
        credential_hasher: Arc<dyn CredentialHasher>,
        mailer: Arc<dyn Mailer>,
        cfg: ResetConfig,
    ) -> Self {
        Self {
            user_repo,
            auth_repo,
            store,
            credential_hasher,
            mailer,
            cfg,
        }
    }

    fn hmac_hex(&self, code: &str) -> anyhow::Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.cfg.hmac_key)?;
        mac.update(code.as_bytes());
        let out = mac.finalize().into_bytes();
        Ok(hex::encode(out))
    }

    async fn check(&self, email: &str, code: &str, consume: bool) -> Result<(), ResetError> {
        let provided_hmac = self.hmac_hex(code.trim())?;
        self.store
            .verify(&email.to_lowercase(), &provided_hmac, consume)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PasswordResetService for RealPasswordResetService {
    async fn send_code(&self, email: &str) -> Result<(), ResetError> {
        let email = email.to_lowercase();
        let user = self
            .user_repo
            .get_by_email(&email)
            .await
            .map_err(|e| ResetError::Store(e.to_string()))?
            .ok_or(ResetError::UserNotFound)?;

        let code = nanoid!(CODE_LEN, &CODE_ALPHABET);
        let code_hmac = self.hmac_hex(&code)?;
        let expire_at = Utc::now() + self.cfg.code_ttl;
        self.store
            .save(&email, &code_hmac, expire_at, self.cfg.max_attempts)
            .await?;

        self.mailer
            .send(Mail {
                to: user.email.clone(),
                subject: "Reset your password".to_string(),
                body: format!(
                    "Hello {}, use the code {} to reset your password. It expires at {}.",
                    user.first_name, code, expire_at
                ),
            })
            .await?;

        info!(user = %user.user_id, "password reset code sent");
        Ok(())
    }

    async fn validate_code(&self, email: &str, code: &str) -> Result<(), ResetError> {
        self.check(email, code, false).await
    }

    async fn change_password(&self, input: ChangePasswordInput) -> Result<(), ResetError> {
        let ChangePasswordInput {
            email,
            code,
            password,
        } = input;

        validate_password(&password).map_err(|e| ResetError::InvalidInput(e.to_string()))?;
        self.check(&email, &code, true).await?;

        let credentials = self
            .auth_repo
            .get_by_email(&email.to_lowercase())
            .await
            .map_err(|e| ResetError::Store(e.to_string()))?
            .ok_or(ResetError::UserNotFound)?;
        let password_hash = self
            .credential_hasher
            .hash_password(&password)
            .await
            .map_err(|e| ResetError::Store(e.to_string()))?;
        self.auth_repo
            .update_password_hash(credentials.user_id, &password_hash)
            .await
            .map_err(|e| ResetError::Store(e.to_string()))?;

        info!(user = %credentials.user_id, "password changed");
        Ok(())
    }
}
