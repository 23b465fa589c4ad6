use crate::application_impl::validation::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use nanoid::nanoid;
use std::sync::Arc;
use uuid::Uuid;

const DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
/// Base username when neither name has an alphanumeric character.
const FALLBACK_USERNAME: &str = "user";

pub struct RealAuthService {
    auth_repo: Arc<dyn AuthRepo>,
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    session_store: Arc<dyn AuthSessionStore>,
    tx_manager: Arc<dyn TxManager>,
    mailer: Arc<dyn Mailer>,
    base_url: String,
}

impl RealAuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        auth_repo: Arc<dyn AuthRepo>,
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        session_store: Arc<dyn AuthSessionStore>,
        tx_manager: Arc<dyn TxManager>,
        mailer: Arc<dyn Mailer>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            auth_repo,
            user_repo,
            credential_hasher,
            token_codec,
            session_store,
            tx_manager,
            mailer,
            base_url: base_url.into(),
        }
    }

    /// Stops at the first failing field.
    fn validate_signup(input: &SignupInput, email: &str) -> Result<(), AuthError> {
        validate_email(email)?;
        validate_name("first name", &input.first_name)?;
        validate_name("last name", &input.last_name)?;
        validate_password(&input.password)?;
        if input.gender.trim().is_empty() {
            return Err(AuthError::InvalidInput("gender is required".to_string()));
        }
        Ok(())
    }

    /// `first_name + last_name`, with random digits appended until unused.
    async fn unique_username(&self, first_name: &str, last_name: &str) -> Result<String, AuthError> {
        let mut username: String = format!("{first_name}{last_name}")
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        if username.is_empty() {
            username.push_str(FALLBACK_USERNAME);
        }
        while self.user_repo.username_exists(&username).await? {
            username.push_str(&nanoid!(1, &DIGITS));
        }
        Ok(username)
    }

    async fn send_verification_mail(&self, user: UserId, email: &str, first_name: &str) -> Result<(), AuthError> {
        let token = self.token_codec.issue_verification_token(user).await?;
        let url = format!("{}/activate/{}", self.base_url.trim_end_matches('/'), token.0);
        self.mailer
            .send(Mail {
                to: email.to_string(),
                subject: "Verify your account".to_string(),
                body: format!("Hello {first_name}, confirm your account by visiting {url}"),
            })
            .await
            .map_err(|e| AuthError::InternalError(format!("send verification mail: {e}")))
    }

    async fn open_session(&self, user_id: UserId) -> Result<AuthTokens, AuthError> {
        let jti = Self::new_jti();

        let (access_token, access_exp) = self
            .token_codec
            .issue_access_token(user_id, Some(jti.clone()))
            .await?;
        let (refresh_token, refresh_exp) = self
            .token_codec
            .issue_refresh_token(user_id, jti.clone())
            .await?;

        self.session_store
            .save_refresh_jti(user_id, &jti, Self::ttl_secs(refresh_exp))
            .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    fn session_info(user: &UserRecord, tokens: AuthTokens) -> SessionInfo {
        SessionInfo {
            user_id: user.user_id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            picture: user.picture.clone(),
            verified: user.verified,
            tokens,
        }
    }

    #[inline]
    fn new_jti() -> String {
        Uuid::new_v4().to_string()
    }

    fn ttl_secs(until: DateTime<Utc>) -> u64 {
        let secs = (until - Utc::now()).num_seconds();
        if secs <= 0 { 1 } else { secs as u64 }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<SessionInfo, AuthError> {
        let email = request.email.trim().to_lowercase();
        Self::validate_signup(&request, &email)?;
        let birth_date = birth_date(request.birth_year, request.birth_month, request.birth_day)?;

        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let username = self
            .unique_username(&request.first_name, &request.last_name)
            .await?;
        let password_hash = self.credential_hasher.hash_password(&request.password).await?;
        let new_user = NewUser {
            user_id: UserId::new_v4(),
            username,
            email: email.clone(),
            first_name: request.first_name,
            last_name: request.last_name,
            picture: DEFAULT_PICTURE.to_string(),
            gender: request.gender,
            birth_date,
        };

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        self.user_repo.create_in_tx(tx.as_mut(), &new_user).await?;
        self.auth_repo
            .create_credentials_in_tx(tx.as_mut(), new_user.user_id, &email, &password_hash)
            .await?;
        tx.commit()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        info!(user = %new_user.user_id, username = %new_user.username, "user registered");

        // the account exists now; a lost mail is recovered via resend_verification
        if let Err(e) = self
            .send_verification_mail(new_user.user_id, &email, &new_user.first_name)
            .await
        {
            warn!(user = %new_user.user_id, "verification mail not sent: {e}");
        }

        let user = self
            .user_repo
            .get_by_id(new_user.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let tokens = self.open_session(user.user_id).await?;
        Ok(Self::session_info(&user, tokens))
    }

    async fn login(&self, request: LoginInput) -> Result<SessionInfo, AuthError> {
        let email = request.email.trim().to_lowercase();

        let rec = self
            .auth_repo
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !rec.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(&request.password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .user_repo
            .get_by_id(rec.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let tokens = self.open_session(rec.user_id).await?;
        Ok(Self::session_info(&user, tokens))
    }

    async fn activate(&self, me: UserId, token: &str) -> Result<(), AuthError> {
        let owner = self
            .token_codec
            .verify_verification_token(&VerificationToken(token.to_string()))
            .await?;
        if owner != me {
            return Err(AuthError::WrongAccount);
        }

        let user = self
            .user_repo
            .get_by_id(me)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.verified {
            return Err(AuthError::AlreadyVerified);
        }

        self.user_repo.set_verified(me).await?;
        info!(user = %me, "account activated");
        Ok(())
    }

    async fn resend_verification(&self, me: UserId) -> Result<(), AuthError> {
        let user = self
            .user_repo
            .get_by_id(me)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.verified {
            return Err(AuthError::AlreadyVerified);
        }
        self.send_verification_mail(me, &user.email, &user.first_name)
            .await
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let verify_result = self
            .token_codec
            .verify_access_token(&AccessToken(token.to_string()))
            .await?;

        // a token that outlived its account is just an invalid token
        if !self.user_repo.id_exists(verify_result.user_id).await? {
            return Err(AuthError::TokenInvalid);
        }

        Ok(verify_result.user_id)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let verify_result = self
            .token_codec
            .verify_refresh_token(&RefreshToken(refresh_token.to_string()))
            .await?;

        if !self.user_repo.id_exists(verify_result.user_id).await? {
            return Err(AuthError::UserNotFound);
        }

        let user_id = verify_result.user_id;
        let jti = verify_result.jti.ok_or(AuthError::TokenInvalid)?;

        // Rotation: check-and-consume
        match self.session_store.check_refresh_jti(&jti, true).await? {
            Some(owner) if owner == user_id => {}
            _ => return Err(AuthError::TokenInvalid),
        }

        self.open_session(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{Argon2PasswordHasher, JwtConfig, JwtHs256Codec};
    use crate::infra_memory::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Mail>>,
    }

    impl RecordingMailer {
        fn last_activation_token(&self) -> String {
            let sent = self.sent.lock().unwrap();
            let body = &sent.last().expect("a mail was sent").body;
            body.rsplit("/activate/").next().unwrap().to_string()
        }
    }

    #[async_trait::async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: Mail) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }

    struct DownMailer;

    #[async_trait::async_trait]
    impl Mailer for DownMailer {
        async fn send(&self, _mail: Mail) -> anyhow::Result<()> {
            anyhow::bail!("smtp down")
        }
    }

    fn service() -> (RealAuthService, Arc<RecordingMailer>) {
        let mailer = Arc::new(RecordingMailer::default());
        (service_with(mailer.clone()), mailer)
    }

    fn service_with(mailer: Arc<dyn Mailer>) -> RealAuthService {
        let store = Arc::new(MemoryStore::new());
        let codec = JwtHs256Codec::new(JwtConfig {
            issuer: "acquaint.test".to_string(),
            audience: "acquaint-client".to_string(),
            access_ttl: Duration::from_secs(60),
            refresh_ttl: Duration::from_secs(600),
            verification_ttl: Duration::from_secs(1800),
            signing_key: b"test-key".to_vec(),
        });
        RealAuthService::new(
            store.clone(),
            store,
            Arc::new(Argon2PasswordHasher),
            Arc::new(codec),
            Arc::new(MemoryAuthSessionStore::new()),
            Arc::new(MemoryTxManager::new()),
            mailer,
            "http://localhost:3000/",
        )
    }

    fn signup_input(email: &str) -> SignupInput {
        SignupInput {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            birth_year: 1995,
            birth_month: 6,
            birth_day: 15,
            gender: "female".to_string(),
        }
    }

    #[tokio::test]
    async fn signup_creates_unverified_user_and_mails_link() {
        let (service, mailer) = service();

        let session = service.signup(signup_input("Jane@Example.com")).await.unwrap();

        assert_eq!(session.username, "janedoe");
        assert!(!session.verified);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
        assert!(sent[0].body.contains("http://localhost:3000/activate/"));
        drop(sent);

        let me = service
            .verify_token(&session.tokens.access_token.0)
            .await
            .unwrap();
        assert_eq!(me, session.user_id);
    }

    #[tokio::test]
    async fn signup_stops_at_first_invalid_field() {
        let (service, mailer) = service();
        let mut input = signup_input("not-an-email");
        input.first_name = "J".to_string();
        input.password = "x".to_string();

        match service.signup(input).await {
            Err(AuthError::InvalidInput(msg)) => assert_eq!(msg, "Invalid email address"),
            other => panic!("unexpected: {other:?}"),
        }

        let mut input = signup_input("jane@example.com");
        input.last_name = "D".to_string();
        input.password = "x".to_string();
        match service.signup(input).await {
            Err(AuthError::InvalidInput(msg)) => assert!(msg.starts_with("last name")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_and_username_collision() {
        let (service, _) = service();

        let first = service.signup(signup_input("jane@example.com")).await.unwrap();
        assert!(matches!(
            service.signup(signup_input("JANE@example.com")).await,
            Err(AuthError::EmailTaken)
        ));

        let second = service.signup(signup_input("jane2@example.com")).await.unwrap();
        assert_ne!(first.username, second.username);
        assert!(second.username.starts_with("janedoe"));
        assert_eq!(second.username.len(), "janedoe".len() + 1);
    }

    #[tokio::test]
    async fn signup_survives_mail_outage() {
        let service = service_with(Arc::new(DownMailer));

        let session = service.signup(signup_input("jane@example.com")).await.unwrap();
        assert!(!session.verified);
        let me = service
            .verify_token(&session.tokens.access_token.0)
            .await
            .unwrap();
        assert_eq!(me, session.user_id);

        assert!(matches!(
            service.signup(signup_input("jane@example.com")).await,
            Err(AuthError::EmailTaken)
        ));
        service
            .login(LoginInput {
                email: "jane@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn punctuation_only_names_get_fallback_username() {
        let (service, _) = service();
        let input = |email: &str| SignupInput {
            first_name: "...".to_string(),
            last_name: "---".to_string(),
            ..signup_input(email)
        };

        let first = service.signup(input("dots@example.com")).await.unwrap();
        assert_eq!(first.username, "user");

        let second = service.signup(input("dashes@example.com")).await.unwrap();
        assert!(second.username.starts_with("user"));
        assert_eq!(second.username.len(), "user".len() + 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_signups_with_one_email_create_one_account() {
        let service = Arc::new(service().0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.signup(signup_input("jane@example.com")).await })
            })
            .collect();
        let results: Vec<_> = futures_util::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for res in results.iter().filter(|r| r.is_err()) {
            assert!(matches!(res, Err(AuthError::EmailTaken)), "unexpected: {res:?}");
        }
    }

    #[tokio::test]
    async fn login_checks_password() {
        let (service, _) = service();
        service.signup(signup_input("jane@example.com")).await.unwrap();

        let ok = service
            .login(LoginInput {
                email: "jane@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ok.first_name, "Jane");

        for (email, password) in [("jane@example.com", "wrong-pw"), ("nobody@example.com", "secret1")] {
            let res = service
                .login(LoginInput {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await;
            assert!(matches!(res, Err(AuthError::InvalidCredentials)));
        }
    }

    #[tokio::test]
    async fn activation_requires_owner_and_happens_once() {
        let (service, mailer) = service();
        let jane = service.signup(signup_input("jane@example.com")).await.unwrap();
        let jane_token = mailer.last_activation_token();
        let john = service.signup(signup_input("john@example.com")).await.unwrap();

        assert!(matches!(
            service.activate(john.user_id, &jane_token).await,
            Err(AuthError::WrongAccount)
        ));

        service.activate(jane.user_id, &jane_token).await.unwrap();
        assert!(matches!(
            service.activate(jane.user_id, &jane_token).await,
            Err(AuthError::AlreadyVerified)
        ));
        assert!(matches!(
            service.resend_verification(jane.user_id).await,
            Err(AuthError::AlreadyVerified)
        ));

        service.resend_verification(john.user_id).await.unwrap();
        let john_token = mailer.last_activation_token();
        service.activate(john.user_id, &john_token).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_rotates_and_consumes_jti() {
        let (service, _) = service();
        let session = service.signup(signup_input("jane@example.com")).await.unwrap();
        let old = session.tokens.refresh_token.0;

        let rotated = service.refresh_token(&old).await.unwrap();
        assert!(matches!(
            service.refresh_token(&old).await,
            Err(AuthError::TokenInvalid)
        ));
        service
            .refresh_token(&rotated.refresh_token.0)
            .await
            .unwrap();
    }
}
