use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, FromRedisValue, RedisError, RedisResult, RedisWrite, ToRedisArgs, Value};

/// Live refresh-token jtis. Each jti is its own key holding the owner id and
/// expiring with the refresh token.
pub struct RedisAuthSessionStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisAuthSessionStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisAuthSessionStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, jti: &str) -> String {
        format!("{}:refresh:{}", self.prefix, jti)
    }
}

impl ToRedisArgs for UserId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg_fmt(self)
    }
}

impl FromRedisValue for UserId {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        s.parse::<UserId>().map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid UserId string",
                format!("{s:?}: {e}"),
            ))
        })
    }
}

#[async_trait::async_trait]
impl AuthSessionStore for RedisAuthSessionStore {
    async fn save_refresh_jti(
        &self,
        user_id: UserId,
        jti: &str,
        ttl_secs: u64,
    ) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.key(jti), user_id, ttl_secs)
            .await
            .map_err(|e| AuthError::Store(format!("save refresh jti: {e}")))?;
        Ok(())
    }

    async fn check_refresh_jti(
        &self,
        jti: &str,
        consume: bool,
    ) -> Result<Option<UserId>, AuthError> {
        let key = self.key(jti);
        let mut conn = self.conn.clone();
        // GETDEL: of two concurrent refreshes only one sees the jti.
        let owner: RedisResult<Option<UserId>> = if consume {
            conn.get_del(&key).await
        } else {
            conn.get(&key).await
        };
        owner.map_err(|e| AuthError::Store(format!("check refresh jti: {e}")))
    }
}
