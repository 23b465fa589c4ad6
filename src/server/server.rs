use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use nanoid::nanoid;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Store ports for one backend. `pool` is kept so shutdown can close it.
struct Stores {
    user_repo: Arc<dyn UserRepo>,
    auth_repo: Arc<dyn AuthRepo>,
    account_repo: Arc<dyn AccountRepo>,
    tx_manager: Arc<dyn TxManager>,
    session_store: Arc<dyn AuthSessionStore>,
    reset_store: Arc<dyn ResetCodeStore>,
    pool: Option<Pool<MySql>>,
}

impl Stores {
    fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Stores {
            user_repo: store.clone(),
            auth_repo: store.clone(),
            account_repo: store,
            tx_manager: Arc::new(MemoryTxManager::new()),
            session_store: Arc::new(MemoryAuthSessionStore::new()),
            reset_store: Arc::new(MemoryResetCodeStore::new()),
            pool: None,
        }
    }

    async fn mysql(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        let redis_dsn = settings
            .store
            .redis_dsn
            .as_deref()
            .ok_or_else(|| anyhow!("store.redis_dsn is required for the mysql backend"))?;
        let redis_client = redis::Client::open(redis_dsn)?;
        let redis_manager = redis_client.get_connection_manager().await?;

        let mysql_dsn = settings
            .store
            .mysql_dsn
            .as_deref()
            .ok_or_else(|| anyhow!("store.mysql_dsn is required for the mysql backend"))?;
        let pool = Pool::<MySql>::connect(mysql_dsn).await?;

        info!(run_id = %run_id, "connected to mysql and redis");

        Ok(Stores {
            user_repo: Arc::new(MySqlUserRepo::new(pool.clone())),
            auth_repo: Arc::new(MySqlAuthRepo::new(pool.clone())),
            account_repo: Arc::new(MySqlAccountRepo::new(pool.clone())),
            tx_manager: Arc::new(MySqlTxManager::new(pool.clone())),
            session_store: Arc::new(RedisAuthSessionStore::new(
                redis_manager.clone(),
                format!("auth:{run_id}"),
            )),
            // Codes must survive a restart, so no run id here.
            reset_store: Arc::new(RedisResetCodeStore::new(redis_manager, "reset")),
            pool: Some(pool),
        })
    }
}

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub relationship_service: Arc<dyn RelationshipService>,
    pub password_reset_service: Arc<dyn PasswordResetService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let stores = match settings.store.backend.as_str() {
            "memory" => Stores::memory(),
            "mysql" => Stores::mysql(settings).await?,
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
            verification_ttl: Duration::from_secs(settings.auth.verification_ttl_secs),
            signing_key: settings.auth.signing_key()?,
        }));
        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(settings.mail.from.clone()));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            stores.auth_repo.clone(),
            stores.user_repo.clone(),
            credential_hasher.clone(),
            token_codec,
            stores.session_store,
            stores.tx_manager.clone(),
            mailer.clone(),
            settings.mail.base_url.clone(),
        ));

        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(
            stores.user_repo.clone(),
            stores.account_repo.clone(),
        ));

        let relationship_service: Arc<dyn RelationshipService> =
            Arc::new(RealRelationshipService::new(
                stores.account_repo,
                stores.user_repo.clone(),
                stores.tx_manager,
            ));

        let password_reset_service: Arc<dyn PasswordResetService> =
            Arc::new(RealPasswordResetService::new(
                stores.user_repo,
                stores.auth_repo,
                stores.reset_store,
                credential_hasher,
                mailer,
                ResetConfig {
                    hmac_key: settings.reset.hmac_key.as_bytes().to_vec(),
                    code_ttl: chrono::Duration::seconds(settings.reset.code_ttl_secs),
                    max_attempts: settings.reset.max_attempts,
                },
            ));

        info!(backend = %settings.store.backend, "server started");

        Ok(Self {
            auth_service,
            user_service,
            relationship_service,
            password_reset_service,
            pool: stores.pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("mysql pool closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::parse_settings;

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let mut settings = parse_settings(Some("settings/dev.toml")).unwrap();
        settings.store.backend = "cassandra".to_string();
        let err = Server::try_new(&settings).await.err().unwrap();
        assert!(err.to_string().contains("cassandra"));
    }

    #[tokio::test]
    async fn memory_backend_needs_no_network() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();
        let server = Server::try_new(&settings).await.unwrap();
        server.shutdown().await;
    }
}
