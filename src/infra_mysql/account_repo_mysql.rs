use super::util::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::{MySqlConnection, MySqlPool, Row};

/// Relationship sets live in `account_relation`, one row per (owner, set, peer).
pub struct MySqlAccountRepo {
    pool: MySqlPool,
}

impl MySqlAccountRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAccountRepo { pool }
    }

    async fn load_sets(
        conn: &mut MySqlConnection,
        user_id: UserId,
    ) -> Result<Account, RelationError> {
        let rows = sqlx::query(
            r#"
SELECT set_kind, peer_id
FROM account_relation
WHERE owner_id = ?
"#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| RelationError::Store(format!("load relation sets: {e}")))?;

        let mut account = Account::new(user_id);
        let mut update = SetUpdate::new();
        for row in rows {
            let kind: String = row
                .try_get("set_kind")
                .map_err(|e| RelationError::Store(e.to_string()))?;
            let kind: RelationSet = kind.parse().map_err(RelationError::Store)?;
            let peer: UserId = row
                .try_get("peer_id")
                .map_err(|e| RelationError::Store(e.to_string()))?;
            update = update.push(kind, peer);
        }
        account.apply(&update);
        Ok(account)
    }

    async fn lock_user(conn: &mut MySqlConnection, user_id: UserId) -> Result<(), RelationError> {
        let found: Option<UserId> =
            sqlx::query_scalar("SELECT user_id FROM user WHERE user_id = ? FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| RelationError::Store(format!("lock user: {e}")))?;

        found.map(|_| ()).ok_or(RelationError::UserNotFound)
    }
}

#[async_trait::async_trait]
impl AccountRepo for MySqlAccountRepo {
    async fn find_by_id(&self, user_id: UserId) -> Result<Account, RelationError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RelationError::Store(format!("acquire connection: {e}")))?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM user WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;
        if count == 0 {
            return Err(RelationError::UserNotFound);
        }

        Self::load_sets(&mut conn, user_id).await
    }

    async fn find_by_id_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Account, RelationError> {
        let tx = downcast(tx);
        Self::lock_user(tx.conn(), user_id).await?;
        Self::load_sets(tx.conn(), user_id).await
    }

    async fn update_sets_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        update: &SetUpdate,
    ) -> Result<Account, RelationError> {
        let tx = downcast(tx);

        for (kind, peer) in &update.pull {
            sqlx::query(
                "DELETE FROM account_relation WHERE owner_id = ? AND set_kind = ? AND peer_id = ?",
            )
            .bind(user_id)
            .bind(kind.as_str())
            .bind(*peer)
            .execute(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("pull {kind}: {e}")))?;
        }

        for (kind, peer) in &update.push {
            sqlx::query(
                r#"
INSERT IGNORE INTO account_relation (owner_id, set_kind, peer_id)
VALUES (?, ?, ?)
"#,
            )
            .bind(user_id)
            .bind(kind.as_str())
            .bind(*peer)
            .execute(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("push {kind}: {e}")))?;
        }

        Self::load_sets(tx.conn(), user_id).await
    }
}
