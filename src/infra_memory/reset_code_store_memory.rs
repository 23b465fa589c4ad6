use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

struct ResetEntry {
    code_hash_hex: String,
    expire_at: DateTime<Utc>,
    tries: u32,
}

#[derive(Default)]
pub struct MemoryResetCodeStore {
    entries: DashMap<String, ResetEntry>,
}

impl MemoryResetCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ResetCodeStore for MemoryResetCodeStore {
    async fn save(
        &self,
        email: &str,
        code_hash_hex: &str,
        expire_at: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<(), ResetCodeStoreError> {
        self.entries.insert(
            email.to_string(),
            ResetEntry {
                code_hash_hex: code_hash_hex.to_string(),
                expire_at,
                tries: max_attempts,
            },
        );
        Ok(())
    }

    async fn verify(
        &self,
        email: &str,
        provided_hash_hex: &str,
        consume: bool,
    ) -> Result<(), ResetCodeStoreError> {
        let Entry::Occupied(mut entry) = self.entries.entry(email.to_string()) else {
            return Err(ResetCodeStoreError::NotFoundOrExpired);
        };
        if entry.get().expire_at <= Utc::now() {
            entry.remove();
            return Err(ResetCodeStoreError::NotFoundOrExpired);
        }
        if entry.get().code_hash_hex == provided_hash_hex {
            if consume {
                entry.remove();
            }
            return Ok(());
        }

        let left = entry.get().tries.saturating_sub(1);
        if left == 0 {
            entry.remove();
        } else {
            entry.get_mut().tries = left;
        }
        Err(ResetCodeStoreError::Incorrect {
            remaining_attempts: left,
        })
    }
}
