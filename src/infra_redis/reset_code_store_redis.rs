use crate::domain_port::*;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

const RESET_CODE_VALIDATE: &str = include_str!("reset_code_validate.lua");

/// One hash per email: `h` holds the code hmac, `tries` the attempts left.
pub struct RedisResetCodeStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisResetCodeStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisResetCodeStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, email: &str) -> String {
        format!("{}:{}", self.prefix, email)
    }
}

#[async_trait::async_trait]
impl ResetCodeStore for RedisResetCodeStore {
    async fn save(
        &self,
        email: &str,
        code_hash_hex: &str,
        expire_at: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<(), ResetCodeStoreError> {
        let key = self.key(email);
        let mut conn = self.conn.clone();

        let _: () = redis::pipe()
            .atomic()
            .del(&key)
            .hset(&key, "h", code_hash_hex)
            .hset(&key, "tries", max_attempts as i64)
            .expire_at(&key, expire_at.timestamp())
            .query_async(&mut conn)
            .await
            .map_err(|e| ResetCodeStoreError::Store(e.to_string()))?;

        Ok(())
    }

    async fn verify(
        &self,
        email: &str,
        provided_hash_hex: &str,
        consume: bool,
    ) -> Result<(), ResetCodeStoreError> {
        let key = self.key(email);
        let mut conn = self.conn.clone();
        let script = Script::new(RESET_CODE_VALIDATE);
        let (status, left): (i64, i64) = script
            .key(&key)
            .arg(provided_hash_hex)
            .arg(if consume { "1" } else { "0" })
            .invoke_async(&mut conn)
            .await
            .map_err(|e| ResetCodeStoreError::Store(e.to_string()))?;

        match status {
            1 => Ok(()),
            -1 => Err(ResetCodeStoreError::NotFoundOrExpired),
            0 => Err(ResetCodeStoreError::Incorrect {
                remaining_attempts: left.max(0) as u32,
            }),
            _ => Err(ResetCodeStoreError::InternalError(anyhow!(
                "unknown reset script status {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_declares_every_status() {
        for status in ["{-1, 0}", "{1, 0}", "{0, left}"] {
            assert!(RESET_CODE_VALIDATE.contains(status), "{status}");
        }
    }
}
