use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryAuthSessionStore {
    jtis: DashMap<String, (UserId, DateTime<Utc>)>,
}

impl MemoryAuthSessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AuthSessionStore for MemoryAuthSessionStore {
    async fn save_refresh_jti(
        &self,
        user_id: UserId,
        jti: &str,
        ttl_secs: u64,
    ) -> Result<(), AuthError> {
        let expire_at = Utc::now() + Duration::seconds(ttl_secs as i64);
        self.jtis.insert(jti.to_string(), (user_id, expire_at));
        Ok(())
    }

    async fn check_refresh_jti(
        &self,
        jti: &str,
        consume: bool,
    ) -> Result<Option<UserId>, AuthError> {
        let found = if consume {
            self.jtis.remove(jti).map(|(_, v)| v)
        } else {
            self.jtis.get(jti).map(|v| *v.value())
        };
        Ok(found
            .filter(|(_, expire_at)| *expire_at > Utc::now())
            .map(|(user_id, _)| user_id))
    }
}
